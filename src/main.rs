use anyhow::Context;
use clap::Parser;
use event_tickets::core::normalizer::normalize_input;
use event_tickets::utils::{logger, validation::Validate};
use event_tickets::{
    CanonicalTicket, CliConfig, Command, ExportRequest, GenerateRequest, GeneratedArtifact,
    LocalStorage, TicketEngine, TicketError, TicketFile, TicketInput, TicketsConfig,
};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    // 設定檔不存在時使用預設值
    let mut config = if cli.config.exists() {
        TicketsConfig::from_file(&cli.config)
            .with_context(|| format!("Failed to load config file '{}'", cli.config.display()))?
    } else {
        tracing::debug!("No config file at {}, using defaults", cli.config.display());
        TicketsConfig::default()
    };

    if let Some(output_path) = &cli.output_path {
        config.tickets.output_path = output_path.clone();
    }
    if let Some(locale) = cli.locale {
        config.tickets.locale = locale;
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message(config.tickets.locale));
        std::process::exit(1);
    }

    let locale = config.tickets.locale;
    match run(cli.command, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Command failed: {} (code {}, kind {})", e, e.code(), e.kind());
            eprintln!("❌ {}", e.user_friendly_message(locale));
            std::process::exit(i32::from(e.code()));
        }
    }
}

fn build_engine(config: &TicketsConfig) -> event_tickets::Result<TicketEngine> {
    let storage = LocalStorage::new(config.output_path());
    let mut engine = TicketEngine::with_builtin_capabilities(storage)?
        .with_event(config.event_context()?)
        .with_locale(config.tickets.locale)
        .with_delimiter(config.delimiter()?)
        .with_default_template(config.tickets.template.clone())
        .with_qr_links(config.tickets.use_qr_links)
        .discard_artifacts_after_delivery(!config.tickets.keep_artifacts);
    engine.set_codes(config.tickets.whitelist.iter().cloned());
    Ok(engine)
}

async fn run(command: Command, config: &TicketsConfig) -> event_tickets::Result<()> {
    let engine = build_engine(config)?;

    match command {
        Command::Import { files } => {
            let tickets = engine.import(files.as_slice()).await?;
            println!("{}", serde_json::to_string_pretty(&tickets)?);
        }
        Command::Export {
            input,
            header,
            check_codes,
            stdout,
            save,
        } => {
            let tickets: Vec<CanonicalTicket> = load_inputs(&engine, &input)
                .await?
                .into_iter()
                .map(normalize_input)
                .collect();
            let output = engine
                .export(
                    &tickets,
                    &ExportRequest {
                        header_style: header.into(),
                        enforce_whitelist: check_codes,
                        download: stdout,
                        persist: save,
                    },
                )
                .await?;

            if let Some(content) = output.content {
                print!("{}", content);
            }
            if let Some(path) = output.saved_to {
                tracing::info!("📁 Export saved to: {}", path.display());
            }
        }
        Command::Generate {
            input,
            template,
            per_ticket,
            qr_links,
            deliver_to,
        } => {
            let tickets = load_inputs(&engine, &input).await?;
            let request =
                GenerateRequest::new(template.unwrap_or_else(|| engine.default_template().into()))
                    .per_ticket_files(per_ticket)
                    .use_link_as_qr_content(qr_links);
            let outcome = engine.generate(tickets, &request).await?;

            for path in outcome.artifact.paths() {
                println!("{}", path.display());
            }

            if let Some(destination) = deliver_to {
                let deliverable = engine.package(&outcome.artifact).await?;
                write_deliverable(&engine, &deliverable, &destination).await?;
            }
        }
        Command::Package { files, deliver_to } => {
            let artifact = GeneratedArtifact::PerTicket {
                files: files
                    .into_iter()
                    .map(|path| TicketFile {
                        code: file_code(&path),
                        path,
                    })
                    .collect(),
            };
            let deliverable = engine.package(&artifact).await?;
            write_deliverable(&engine, &deliverable, &deliver_to).await?;
        }
    }

    Ok(())
}

/// JSON 輸入為單筆物件或陣列；CSV 則交給匯入器處理
async fn load_inputs(engine: &TicketEngine, input: &Path) -> event_tickets::Result<Vec<TicketInput>> {
    let is_json = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let bytes = tokio::fs::read(input).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => TicketError::FileNotFoundError {
                path: input.to_path_buf(),
            },
            _ => TicketError::IoError(e),
        })?;
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        TicketInput::from_json(value)
    } else {
        let tickets = engine.import(&[input]).await?;
        Ok(tickets.into_iter().map(TicketInput::from).collect())
    }
}

async fn write_deliverable(
    engine: &TicketEngine,
    deliverable: &event_tickets::Deliverable,
    destination: &Path,
) -> event_tickets::Result<()> {
    let mut file = tokio::fs::File::create(destination).await?;
    let sent = engine.deliver(deliverable, &mut file).await?;
    println!(
        "✅ {} ({}, {} bytes) written to {}",
        deliverable.filename,
        deliverable.content_type,
        sent,
        destination.display()
    );
    Ok(())
}

fn file_code(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
