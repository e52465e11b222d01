//! 內建的渲染與圖片能力，讓 CLI 不需外部文件或圖片引擎即可產生票券

use crate::domain::ports::{ImageGenerator, RenderedPage, TicketPage, TicketTemplate};
use crate::utils::error::{Result, TicketError};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const PAGE_BREAK: &[u8] = b"\x0c\n";

/// 純文字票券，每張一頁，以換頁字元分隔
#[derive(Debug, Clone)]
pub struct PlainTextTemplate {
    name: String,
}

impl PlainTextTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for PlainTextTemplate {
    fn default() -> Self {
        Self::new("basic")
    }
}

#[async_trait]
impl TicketTemplate for PlainTextTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn extension(&self) -> &str {
        "txt"
    }

    async fn render_page(&self, page: TicketPage<'_>) -> Result<RenderedPage> {
        let event = page.event;
        let ticket = page.ticket;
        let mut out = String::new();

        let render = |out: &mut String| -> std::fmt::Result {
            writeln!(out, "{}", event.name.as_deref().unwrap_or("Event"))?;
            if let Some(organizer) = &event.organizer {
                writeln!(out, "Organizer: {}", organizer)?;
            }
            if let Some(location) = &event.location {
                writeln!(out, "Location:  {}", location)?;
            }
            if let Some(date) = event.display_date() {
                writeln!(out, "Date:      {}", date)?;
            }
            if let Some(logo) = &event.logo {
                writeln!(out, "Logo:      {}", logo.display())?;
            }
            writeln!(out, "----------------------------------------")?;
            writeln!(out, "Ticket:    {}", ticket.code)?;
            writeln!(out, "Type:      {}", ticket.ticket_type)?;
            writeln!(out, "Price:     {}", ticket.ticket_price)?;
            writeln!(
                out,
                "Holder:    {} {}",
                ticket.user_first_name, ticket.user_last_name
            )?;
            writeln!(out, "Bought:    {}", ticket.buy_date)?;
            writeln!(out, "QR:        {}", page.qr_image.display())?;
            writeln!(out, "Barcode:   {}", page.barcode_image.display())
        };

        render(&mut out).map_err(|e| TicketError::RenderError {
            message: e.to_string(),
        })?;

        Ok(RenderedPage(out.into_bytes()))
    }

    fn assemble(&self, pages: &[RenderedPage]) -> Result<Vec<u8>> {
        let mut document = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            if index > 0 {
                document.extend_from_slice(PAGE_BREAK);
            }
            document.extend_from_slice(&page.0);
        }
        Ok(document)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Qr,
    Code128,
}

/// 寫出描述條碼內容的 JSON，而非實際圖片
#[derive(Debug, Clone)]
pub struct DescriptorImageGenerator {
    symbology: Symbology,
}

#[derive(Serialize)]
struct SymbolDescriptor<'a> {
    symbology: Symbology,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    padding: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_correction: Option<&'static str>,
}

impl DescriptorImageGenerator {
    pub fn qr() -> Self {
        Self {
            symbology: Symbology::Qr,
        }
    }

    pub fn code128() -> Self {
        Self {
            symbology: Symbology::Code128,
        }
    }
}

#[async_trait]
impl ImageGenerator for DescriptorImageGenerator {
    fn extension(&self) -> &str {
        "json"
    }

    async fn generate(&self, content: &str, destination: &Path) -> Result<()> {
        let descriptor = match self.symbology {
            Symbology::Qr => SymbolDescriptor {
                symbology: self.symbology,
                content,
                size: Some(200),
                padding: Some(20),
                error_correction: Some("high"),
            },
            Symbology::Code128 => SymbolDescriptor {
                symbology: self.symbology,
                content,
                size: None,
                padding: None,
                error_correction: None,
            },
        };

        let json = serde_json::to_vec_pretty(&descriptor)?;
        tokio::fs::write(destination, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CanonicalTicket, EventContext};
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_plain_text_page_shows_ticket_fields() {
        let event = EventContext {
            name: Some("Rust Meetup".to_string()),
            ..Default::default()
        };
        let ticket = CanonicalTicket {
            code: "A1".into(),
            ticket_type: "VIP".into(),
            ..Default::default()
        };
        let qr = PathBuf::from("qr.json");
        let barcode = PathBuf::from("barcode.json");

        let template = PlainTextTemplate::default();
        let page = template
            .render_page(TicketPage {
                event: &event,
                ticket: &ticket,
                qr_image: &qr,
                barcode_image: &barcode,
            })
            .await
            .unwrap();
        let text = String::from_utf8(page.0).unwrap();

        assert!(text.starts_with("Rust Meetup"));
        assert!(text.contains("Ticket:    A1"));
        assert!(text.contains("Type:      VIP"));
        assert!(text.contains("Price:     N/A"));
    }

    #[test]
    fn test_assemble_separates_pages() {
        let template = PlainTextTemplate::default();
        let document = template
            .assemble(&[RenderedPage(b"one".to_vec()), RenderedPage(b"two".to_vec())])
            .unwrap();
        assert_eq!(document, b"one\x0c\ntwo");
    }

    #[tokio::test]
    async fn test_qr_descriptor_carries_rendering_parameters() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("qr.json");
        DescriptorImageGenerator::qr()
            .generate("https://example.com/v/A1", &destination)
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&destination).unwrap()).unwrap();
        assert_eq!(value["symbology"], "qr");
        assert_eq!(value["content"], "https://example.com/v/A1");
        assert_eq!(value["size"], 200);
        assert_eq!(value["error_correction"], "high");
    }
}
