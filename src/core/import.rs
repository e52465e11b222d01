use crate::core::normalizer::normalize;
use crate::domain::model::{CanonicalTicket, RawRecord, MISSING_FIELD_MARKER};
use crate::utils::error::Result;
use crate::utils::validation::check_file;
use csv::ReaderBuilder;
use std::borrow::Cow;
use std::path::Path;

pub const IMPORT_EXTENSIONS: &[&str] = &["csv"];
pub const DEFAULT_DELIMITER: char = ';';

/// 匯入一或多個分隔文字檔，依檔案順序再依列順序串接
pub async fn import_tickets<P: AsRef<Path>>(
    sources: &[P],
    delimiter: u8,
) -> Result<Vec<CanonicalTicket>> {
    let mut tickets = Vec::new();
    for source in sources {
        tickets.extend(import_ticket_file(source, delimiter).await?);
    }
    Ok(tickets)
}

pub async fn import_ticket_file<P: AsRef<Path>>(
    source: P,
    delimiter: u8,
) -> Result<Vec<CanonicalTicket>> {
    let source = source.as_ref();
    check_file(source, IMPORT_EXTENSIONS)?;

    let bytes = tokio::fs::read(source).await?;
    let tickets = parse_tickets(&bytes, delimiter)?;

    tracing::info!("Imported {} ticket(s) from {}", tickets.len(), source.display());
    Ok(tickets)
}

/// 解析分隔文字：第一列為標題，其餘每列為一筆紀錄
pub fn parse_tickets(bytes: &[u8], delimiter: u8) -> Result<Vec<CanonicalTicket>> {
    Ok(parse_records(bytes, delimiter)?
        .iter()
        .map(normalize)
        .collect())
}

pub fn parse_records(bytes: &[u8], delimiter: u8) -> Result<Vec<RawRecord>> {
    let text = decode(bytes);
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        // 匯出時的 N/A 代表欄位缺失，讀回時不放入紀錄
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, value)| *value != MISSING_FIELD_MARKER)
            .map(|(header, value)| (header.clone(), value.to_string()))
            .collect();
        records.push(record);
    }

    Ok(records)
}

/// UTF-8 直接使用 (去除 BOM)，其他編碼視為 Latin-1
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            tracing::debug!("Input is not UTF-8, decoding as Latin-1");
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}
