pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};

#[cfg(feature = "cli")]
mod cli {
    use crate::core::export::HeaderStyle;
    use crate::utils::locale::Locale;
    use clap::{Parser, Subcommand, ValueEnum};
    use std::path::PathBuf;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "event-tickets")]
    #[command(about = "Import, export, generate and package event tickets")]
    pub struct CliConfig {
        /// Path to TOML configuration file
        #[arg(short, long, default_value = "tickets.toml")]
        pub config: PathBuf,

        /// Override the output directory from config
        #[arg(long)]
        pub output_path: Option<String>,

        /// Override the locale from config (fr-FR, en-US)
        #[arg(long)]
        pub locale: Option<Locale>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log as JSON lines")]
        pub json_logs: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Copy, ValueEnum)]
    pub enum HeaderArg {
        Machine,
        Display,
    }

    impl From<HeaderArg> for HeaderStyle {
        fn from(arg: HeaderArg) -> Self {
            match arg {
                HeaderArg::Machine => HeaderStyle::Machine,
                HeaderArg::Display => HeaderStyle::Display,
            }
        }
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Read CSV files and print canonical tickets as JSON
        Import {
            #[arg(required = true)]
            files: Vec<PathBuf>,
        },
        /// Convert tickets (JSON or CSV) to CSV
        Export {
            input: PathBuf,
            #[arg(long, value_enum, default_value = "machine")]
            header: HeaderArg,
            /// Check every code against the configured whitelist
            #[arg(long)]
            check_codes: bool,
            /// Print the CSV to stdout
            #[arg(long)]
            stdout: bool,
            /// Save the CSV in the output directory (always on without --stdout)
            #[arg(long)]
            save: bool,
        },
        /// Generate ticket documents from JSON or CSV input
        Generate {
            input: PathBuf,
            /// Template name, defaults to the configured one
            #[arg(short, long)]
            template: Option<String>,
            /// One document per ticket instead of a single combined document
            #[arg(long)]
            per_ticket: bool,
            /// Encode the validation link in the QR code when valid
            #[arg(long)]
            qr_links: bool,
            /// Also package the result and write the deliverable here
            #[arg(long)]
            deliver_to: Option<PathBuf>,
        },
        /// Package existing ticket documents and write the deliverable
        Package {
            #[arg(required = true)]
            files: Vec<PathBuf>,
            #[arg(long)]
            deliver_to: PathBuf,
        },
    }
}
