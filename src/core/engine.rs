use crate::adapters::archive::ZipArchiveWriter;
use crate::adapters::render::{DescriptorImageGenerator, PlainTextTemplate};
use crate::adapters::storage::LocalStorage;
use crate::core::export::{
    export_filename, export_tickets, ExportOptions, HeaderStyle, EXPORT_CONTENT_TYPE,
};
use crate::core::generator::{GenerateRequest, TicketGenerator};
use crate::core::import::import_tickets;
use crate::core::packaging::{deliver, Packager};
use crate::core::registry::TemplateRegistry;
use crate::domain::model::{
    CanonicalTicket, CodeWhitelist, Deliverable, EventContext, GeneratedArtifact,
    GenerationOutcome, TicketInput,
};
use crate::domain::ports::{ArchiveWriter, ImageGenerator};
use crate::utils::error::{Result, TicketError};
use crate::utils::locale::Locale;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWrite;

pub const DEFAULT_TEMPLATE: &str = "basic";

#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub header_style: HeaderStyle,
    /// 匯出時對每張票套用授權票號清單
    pub enforce_whitelist: bool,
    /// 回傳內容供呼叫端下載
    pub download: bool,
    /// 存到輸出目錄；未設定 `download` 時一律儲存
    pub persist: bool,
}

#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub filename: String,
    pub content_type: &'static str,
    pub content: Option<String>,
    pub saved_to: Option<PathBuf>,
}

/// 一個票務工作階段：活動資訊、授權票號與各項能力
pub struct TicketEngine {
    event: EventContext,
    whitelist: CodeWhitelist,
    locale: Locale,
    delimiter: u8,
    default_template: String,
    storage: LocalStorage,
    generator: TicketGenerator,
    packager: Packager,
}

impl TicketEngine {
    pub fn new(
        storage: LocalStorage,
        registry: TemplateRegistry,
        qr: Arc<dyn ImageGenerator>,
        barcode: Arc<dyn ImageGenerator>,
        archive: Arc<dyn ArchiveWriter>,
    ) -> Self {
        let packager = Packager::new(archive, storage.clone())
            .with_allowed_extensions(registry.extensions());
        let generator = TicketGenerator::new(registry, qr, barcode, storage.clone());

        Self {
            event: EventContext::default(),
            whitelist: CodeWhitelist::default(),
            locale: Locale::default(),
            delimiter: b';',
            default_template: DEFAULT_TEMPLATE.to_string(),
            storage,
            generator,
            packager,
        }
    }

    /// 使用內建純文字範本、描述檔圖片與 zip 的引擎
    pub fn with_builtin_capabilities(storage: LocalStorage) -> Result<Self> {
        let registry =
            TemplateRegistry::new().with(Arc::new(PlainTextTemplate::new(DEFAULT_TEMPLATE)))?;
        Ok(Self::new(
            storage,
            registry,
            Arc::new(DescriptorImageGenerator::qr()),
            Arc::new(DescriptorImageGenerator::code128()),
            Arc::new(ZipArchiveWriter),
        ))
    }

    pub fn with_event(mut self, event: EventContext) -> Self {
        self.event = event;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_default_template(mut self, template: impl Into<String>) -> Self {
        self.default_template = template.into();
        self
    }

    pub fn with_qr_links(mut self, enabled: bool) -> Self {
        self.generator = self.generator.with_qr_links(enabled);
        self
    }

    /// 個別票券檔隨壓縮檔送出後即刪除
    pub fn discard_artifacts_after_delivery(mut self, enabled: bool) -> Self {
        self.packager = self.packager.discard_sources(enabled);
        self
    }

    pub fn event(&self) -> &EventContext {
        &self.event
    }

    pub fn event_mut(&mut self) -> &mut EventContext {
        &mut self.event
    }

    pub fn set_codes<I, S>(&mut self, codes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = CodeWhitelist::new(codes);
        tracing::debug!("Authorized code list replaced");
    }

    pub fn codes(&self) -> &CodeWhitelist {
        &self.whitelist
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn default_template(&self) -> &str {
        &self.default_template
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub async fn import<P: AsRef<Path>>(&self, sources: &[P]) -> Result<Vec<CanonicalTicket>> {
        import_tickets(sources, self.delimiter).await
    }

    pub async fn export(
        &self,
        tickets: &[CanonicalTicket],
        request: &ExportRequest,
    ) -> Result<ExportOutput> {
        let options = ExportOptions {
            header_style: request.header_style,
            delimiter: self.delimiter,
            locale: self.locale,
            whitelist: request.enforce_whitelist.then_some(&self.whitelist),
        };
        let content = export_tickets(tickets, &options)?;
        let filename = export_filename();

        let saved_to = if request.persist || !request.download {
            let path = self.storage.write_file(&filename, content.as_bytes()).await?;
            tracing::info!("Exported {} ticket(s) to {}", tickets.len(), path.display());
            Some(path)
        } else {
            None
        };

        Ok(ExportOutput {
            filename,
            content_type: EXPORT_CONTENT_TYPE,
            content: request.download.then_some(content),
            saved_to,
        })
    }

    pub async fn generate(
        &self,
        tickets: Vec<TicketInput>,
        request: &GenerateRequest,
    ) -> Result<GenerationOutcome> {
        self.generator
            .generate(tickets, &self.event, &self.whitelist, request)
            .await
    }

    pub async fn package(&self, artifact: &GeneratedArtifact) -> Result<Deliverable> {
        self.packager.package(artifact).await
    }

    /// 準備下載：使用既有檔案，或以預設範本即時產生單一合併文件
    pub async fn download(
        &self,
        file: Option<&Path>,
        tickets: Option<Vec<TicketInput>>,
    ) -> Result<Deliverable> {
        if let Some(file) = file {
            return self.packager.package_file(file).await;
        }

        match tickets {
            Some(tickets) => {
                let request = GenerateRequest::new(self.default_template.clone());
                let outcome = self.generate(tickets, &request).await?;
                self.package(&outcome.artifact).await
            }
            None => Err(TicketError::NothingToDeliverError),
        }
    }

    pub async fn deliver<W>(&self, deliverable: &Deliverable, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        deliver(deliverable, sink).await
    }
}
