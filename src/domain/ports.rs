use crate::domain::model::{CanonicalTicket, EventContext};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// 範本排版單張票券所需的全部資料
#[derive(Debug, Clone, Copy)]
pub struct TicketPage<'a> {
    pub event: &'a EventContext,
    pub ticket: &'a CanonicalTicket,
    pub qr_image: &'a Path,
    pub barcode_image: &'a Path,
}

/// 已渲染的一頁，內容由範本自行決定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage(pub Vec<u8>);

/// 以範本名稱註冊的渲染能力
#[async_trait]
pub trait TicketTemplate: Send + Sync {
    fn name(&self) -> &str;

    /// 組合後文件的副檔名 (不含點)
    fn extension(&self) -> &str {
        "pdf"
    }

    async fn render_page(&self, page: TicketPage<'_>) -> Result<RenderedPage>;

    /// 將同一份文件的所有頁面組成最終內容
    fn assemble(&self, pages: &[RenderedPage]) -> Result<Vec<u8>>;
}

/// QR Code 或條碼圖片產生器
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn extension(&self) -> &str {
        "png"
    }

    async fn generate(&self, content: &str, destination: &Path) -> Result<()>;
}

/// 將多個檔案寫入單一壓縮檔
pub trait ArchiveWriter: Send + Sync {
    fn extension(&self) -> &str;

    /// `entries` 為 (壓縮檔內名稱, 磁碟上的檔案)
    fn write_archive(&self, entries: &[(String, &Path)], destination: &Path) -> Result<()>;
}
