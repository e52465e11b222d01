use crate::adapters::storage::{LocalStorage, ScratchArea};
use crate::core::normalizer::normalize_input;
use crate::core::registry::TemplateRegistry;
use crate::core::validator::validate;
use crate::domain::model::{
    CanonicalTicket, CodeWhitelist, EventContext, GeneratedArtifact, GenerationOutcome,
    TicketFile, TicketInput,
};
use crate::domain::ports::{ImageGenerator, RenderedPage, TicketPage, TicketTemplate};
use crate::utils::error::{Result, TicketError};
use crate::utils::validation::is_valid_link;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// 輸出目錄下存放產出票券的子目錄
pub const TICKETS_DIR: &str = "tickets";

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub template: String,
    pub per_ticket_files: bool,
    pub use_link_as_qr_content: bool,
}

impl GenerateRequest {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            per_ticket_files: false,
            use_link_as_qr_content: false,
        }
    }

    pub fn per_ticket_files(mut self, enabled: bool) -> Self {
        self.per_ticket_files = enabled;
        self
    }

    pub fn use_link_as_qr_content(mut self, enabled: bool) -> Self {
        self.use_link_as_qr_content = enabled;
        self
    }
}

/// 執行一個批次：正規化、驗證、產生圖片、渲染、寫出
pub struct TicketGenerator {
    registry: TemplateRegistry,
    qr: Arc<dyn ImageGenerator>,
    barcode: Arc<dyn ImageGenerator>,
    storage: LocalStorage,
    use_qr_links: bool,
}

impl TicketGenerator {
    pub fn new(
        registry: TemplateRegistry,
        qr: Arc<dyn ImageGenerator>,
        barcode: Arc<dyn ImageGenerator>,
        storage: LocalStorage,
    ) -> Self {
        Self {
            registry,
            qr,
            barcode,
            storage,
            use_qr_links: false,
        }
    }

    /// 工作階段層級的連結模式，與單次呼叫的設定取聯集
    pub fn with_qr_links(mut self, enabled: bool) -> Self {
        self.use_qr_links = enabled;
        self
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    /// 整批產生，或完全不產生
    ///
    /// 文件先寫到批次暫存區，全部渲染完成後才搬到輸出目錄；
    /// 搬移中途失敗時撤回已搬入的檔案。暫存區與所有 QR、條碼圖片
    /// 在任何結束路徑都會刪除
    pub async fn generate(
        &self,
        tickets: Vec<TicketInput>,
        event: &EventContext,
        whitelist: &CodeWhitelist,
        request: &GenerateRequest,
    ) -> Result<GenerationOutcome> {
        let template = self.registry.resolve(&request.template)?;

        if tickets.is_empty() {
            return Err(TicketError::EmptyBatchError);
        }

        let link_mode = self.use_qr_links || request.use_link_as_qr_content;
        tracing::info!(
            "Generating {} ticket(s) with template '{}' (per-ticket files: {}, QR links: {})",
            tickets.len(),
            template.name(),
            request.per_ticket_files,
            link_mode
        );

        let scratch = self.storage.scratch_area().await?;
        let mut batch = Batch::new(template.as_ref(), &scratch);

        for input in tickets {
            let ticket = normalize_input(input);
            validate(&ticket, whitelist)?;
            self.render_ticket(&mut batch, event, &ticket, link_mode)
                .await?;

            if request.per_ticket_files {
                batch.flush_ticket().await?;
            }
        }

        let outcome = if request.per_ticket_files {
            self.commit_per_ticket(batch).await?
        } else {
            self.commit_combined(batch).await?
        };

        tracing::info!("Generated {} ticket(s)", outcome.codes.len());
        Ok(outcome)
    }

    async fn render_ticket(
        &self,
        batch: &mut Batch<'_>,
        event: &EventContext,
        ticket: &CanonicalTicket,
        link_mode: bool,
    ) -> Result<()> {
        let code = ticket.code().ok_or(TicketError::MissingCodeError)?;
        let qr_content = qr_content(ticket, link_mode);

        let qr_image = batch.scratch.unique_file("qr", self.qr.extension());
        self.qr.generate(qr_content, &qr_image).await?;

        let barcode_image = batch
            .scratch
            .unique_file("barcode", self.barcode.extension());
        self.barcode.generate(code, &barcode_image).await?;

        let page = batch
            .template
            .render_page(TicketPage {
                event,
                ticket,
                qr_image: &qr_image,
                barcode_image: &barcode_image,
            })
            .await?;

        tracing::debug!("Rendered ticket {}", code);
        batch.pages.push(page);
        batch.codes.push(code.to_string());
        Ok(())
    }

    async fn commit_per_ticket(&self, batch: Batch<'_>) -> Result<GenerationOutcome> {
        let template = batch.template;
        let extension = template.extension();
        let mut files = Vec::with_capacity(batch.drafts.len());

        for draft in &batch.drafts {
            let target = format!("{}/{}.{}", TICKETS_DIR, draft.file_stem, extension);
            match self.storage.commit(&draft.path, &target).await {
                Ok(path) => files.push(TicketFile {
                    code: draft.code.clone(),
                    path,
                }),
                Err(e) => {
                    // 撤回本批次已搬入的檔案
                    for file in &files {
                        if let Err(remove_err) = tokio::fs::remove_file(&file.path).await {
                            tracing::warn!(
                                "Failed to roll back {}: {}",
                                file.path.display(),
                                remove_err
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }

        Ok(GenerationOutcome {
            artifact: GeneratedArtifact::PerTicket { files },
            codes: batch.codes,
        })
    }

    async fn commit_combined(&self, batch: Batch<'_>) -> Result<GenerationOutcome> {
        let template = batch.template;
        let document = template.assemble(&batch.pages)?;
        let target = format!(
            "{}/tickets-{}.{}",
            TICKETS_DIR,
            uuid::Uuid::new_v4().simple(),
            template.extension()
        );
        let path = self.storage.write_file(&target, &document).await?;

        Ok(GenerationOutcome {
            artifact: GeneratedArtifact::Combined { path },
            codes: batch.codes,
        })
    }
}

/// QR Code 內容：預設為票號；連結模式且連結有效時改用驗證連結
pub fn qr_content(ticket: &CanonicalTicket, link_mode: bool) -> &str {
    let code = ticket.code.as_str().unwrap_or_default();
    if !link_mode {
        return code;
    }

    match ticket.validation_link.as_str() {
        Some(link) if is_valid_link(link) => link,
        _ => code,
    }
}

/// 以票號作為檔名，移除檔案系統不接受的字元
pub fn file_stem_for(code: &str) -> String {
    let stem: String = code
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "ticket".to_string()
    } else {
        stem
    }
}

struct DraftFile {
    code: String,
    file_stem: String,
    path: PathBuf,
}

/// 批次進行中的狀態
struct Batch<'a> {
    template: &'a dyn TicketTemplate,
    scratch: &'a ScratchArea,
    pages: Vec<RenderedPage>,
    codes: Vec<String>,
    drafts: Vec<DraftFile>,
    stems: HashSet<String>,
}

impl<'a> Batch<'a> {
    fn new(template: &'a dyn TicketTemplate, scratch: &'a ScratchArea) -> Self {
        Self {
            template,
            scratch,
            pages: Vec::new(),
            codes: Vec::new(),
            drafts: Vec::new(),
            stems: HashSet::new(),
        }
    }

    /// 將目前文件寫成獨立草稿檔，並開始新文件
    async fn flush_ticket(&mut self) -> Result<()> {
        let code = self.codes.last().cloned().unwrap_or_default();
        let document = self.template.assemble(&self.pages)?;
        self.pages.clear();

        let file_stem = self.claim_stem(&code);
        let path = self
            .scratch
            .unique_file(&file_stem, self.template.extension());
        tokio::fs::write(&path, document).await?;

        self.drafts.push(DraftFile {
            code,
            file_stem,
            path,
        });
        Ok(())
    }

    /// 取得本批次尚未使用的檔名，重複時依序加上 -2、-3 ...
    fn claim_stem(&mut self, code: &str) -> String {
        let base = file_stem_for(code);
        let mut stem = base.clone();
        let mut n = 1;
        while self.stems.contains(&stem) {
            n += 1;
            stem = format!("{}-{}", base, n);
        }
        self.stems.insert(stem.clone());
        stem
    }
}
