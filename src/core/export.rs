use crate::core::validator::check_authorized;
use crate::domain::model::{CanonicalTicket, CodeWhitelist, FieldValue, MISSING_FIELD_MARKER};
use crate::utils::dates::to_display_date;
use crate::utils::error::{Result, TicketError};
use crate::utils::locale::Locale;
use csv::{Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

/// 機器用欄位名稱，可直接重新匯入
pub const MACHINE_HEADERS: [&str; 8] = [
    "id",
    "ticket_code",
    "event_id",
    "user_first_name",
    "user_last_name",
    "ticket_type",
    "ticket_price",
    "ticket_buy_date",
];

pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    #[default]
    Machine,
    Display,
}

#[derive(Debug, Clone)]
pub struct ExportOptions<'a> {
    pub header_style: HeaderStyle,
    pub delimiter: u8,
    pub locale: Locale,
    /// 設定時每張票都須在授權清單內，否則整批匯出失敗
    pub whitelist: Option<&'a CodeWhitelist>,
}

impl Default for ExportOptions<'_> {
    fn default() -> Self {
        Self {
            header_style: HeaderStyle::Machine,
            delimiter: b';',
            locale: Locale::default(),
            whitelist: None,
        }
    }
}

/// 將票券輸出為分隔文字，列尾為 CRLF
pub fn export_tickets(tickets: &[CanonicalTicket], options: &ExportOptions<'_>) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    match options.header_style {
        HeaderStyle::Machine => writer.write_record(MACHINE_HEADERS)?,
        HeaderStyle::Display => writer.write_record(options.locale.export_labels())?,
    }

    for (index, ticket) in tickets.iter().enumerate() {
        if let Some(whitelist) = options.whitelist {
            check_authorized(ticket, whitelist)?;
        }
        writer.write_record(row(index, ticket))?;
    }

    let bytes = writer.into_inner().map_err(|e| TicketError::IoError(e.into_error()))?;
    // csv 只會寫出輸入的 UTF-8 內容
    String::from_utf8(bytes).map_err(|e| TicketError::NormalizationError {
        message: e.to_string(),
    })
}

fn row(index: usize, ticket: &CanonicalTicket) -> [String; 8] {
    [
        index.to_string(),
        ticket.code.to_string(),
        ticket.event_id.to_string(),
        ticket.user_first_name.to_string(),
        ticket.user_last_name.to_string(),
        ticket.ticket_type.to_string(),
        ticket.ticket_price.to_string(),
        display_buy_date(&ticket.buy_date),
    ]
}

fn display_buy_date(value: &FieldValue) -> String {
    match value {
        FieldValue::Missing => MISSING_FIELD_MARKER.to_string(),
        FieldValue::Value(raw) if raw.trim().is_empty() => raw.clone(),
        FieldValue::Value(raw) => to_display_date(raw).unwrap_or_else(|| {
            tracing::warn!("Unrecognized buy date '{}', exported unchanged", raw);
            raw.clone()
        }),
    }
}

/// 匯出檔的建議檔名
pub fn export_filename() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("tickets-{}.csv", &id[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(code: &str, buy_date: &str) -> CanonicalTicket {
        CanonicalTicket {
            code: code.into(),
            event_id: "7".into(),
            user_first_name: "Ada".into(),
            user_last_name: "Lovelace".into(),
            ticket_type: "VIP".into(),
            ticket_price: "25".into(),
            buy_date: buy_date.into(),
            validation_link: FieldValue::Missing,
            user_id: FieldValue::Missing,
        }
    }

    #[test]
    fn test_machine_export_layout() {
        let csv = export_tickets(
            &[ticket("A1", "2026-10-01 10:00:00"), ticket("A2", "2026-10-02")],
            &ExportOptions::default(),
        )
        .unwrap();

        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(
            lines[0],
            "id;ticket_code;event_id;user_first_name;user_last_name;ticket_type;ticket_price;ticket_buy_date"
        );
        assert_eq!(lines[1], "0;A1;7;Ada;Lovelace;VIP;25;01/10/2026");
        assert_eq!(lines[2], "1;A2;7;Ada;Lovelace;VIP;25;02/10/2026");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_display_headers_are_localized() {
        let options = ExportOptions {
            header_style: HeaderStyle::Display,
            delimiter: b',',
            locale: Locale::EnUs,
            whitelist: None,
        };
        let csv = export_tickets(&[ticket("A1", "2026-10-01")], &options).unwrap();
        assert!(csv.starts_with("#,Code,Event,First name,Last name,Type,Price,Purchase date\r\n"));

        let options = ExportOptions {
            header_style: HeaderStyle::Display,
            ..Default::default()
        };
        let csv = export_tickets(&[], &options).unwrap();
        assert!(csv.starts_with("#;Code;Événement;Prénom"));
    }

    #[test]
    fn test_missing_fields_and_bad_dates() {
        let mut odd = ticket("A1", "someday");
        odd.ticket_price = FieldValue::Missing;
        odd.buy_date = FieldValue::Missing;
        let csv = export_tickets(&[odd, ticket("A2", "someday")], &ExportOptions::default())
            .unwrap();

        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert!(lines[1].ends_with(";N/A;N/A"));
        assert!(lines[2].ends_with(";25;someday"));
    }

    #[test]
    fn test_whitelist_violation_fails_whole_export() {
        let whitelist = CodeWhitelist::new(["A1"]);
        let options = ExportOptions {
            whitelist: Some(&whitelist),
            ..Default::default()
        };

        assert!(export_tickets(&[ticket("A1", "2026-10-01")], &options).is_ok());
        assert!(matches!(
            export_tickets(
                &[ticket("A1", "2026-10-01"), ticket("B9", "2026-10-01")],
                &options
            ),
            Err(TicketError::UnauthorizedCodeError { .. })
        ));
    }

    #[test]
    fn test_codeless_ticket_exports_under_empty_whitelist() {
        let empty = CodeWhitelist::default();
        let options = ExportOptions {
            whitelist: Some(&empty),
            ..Default::default()
        };

        let csv = export_tickets(&[CanonicalTicket::default()], &options).unwrap();
        assert!(csv.contains("\r\n0;N/A;N/A;"));
    }

    #[test]
    fn test_codeless_ticket_is_unauthorized_under_whitelist() {
        let whitelist = CodeWhitelist::new(["A1"]);
        let options = ExportOptions {
            whitelist: Some(&whitelist),
            ..Default::default()
        };

        assert!(matches!(
            export_tickets(&[CanonicalTicket::default()], &options),
            Err(TicketError::UnauthorizedCodeError { ref code }) if code.is_empty()
        ));
    }

    #[test]
    fn test_values_with_delimiter_are_quoted() {
        let mut t = ticket("A1", "2026-10-01");
        t.user_last_name = "de la Tour; Jr".into();
        let csv = export_tickets(&[t], &ExportOptions::default()).unwrap();
        assert!(csv.contains("\"de la Tour; Jr\""));
    }

    #[test]
    fn test_export_filename() {
        let name = export_filename();
        assert!(name.starts_with("tickets-"));
        assert!(name.ends_with(".csv"));
    }
}
