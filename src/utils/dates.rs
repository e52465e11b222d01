use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 匯出時的日期格式 (`ticket_buy_date`)
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";
/// 票券上的活動日期時間格式
pub const DISPLAY_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// 解析常見的日期時間寫法，僅有日期時視為當天 00:00
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// 轉成 [`DISPLAY_DATE_FORMAT`]，無法解析時回傳 `None`
pub fn to_display_date(input: &str) -> Option<String> {
    parse_datetime(input).map(|dt| dt.format(DISPLAY_DATE_FORMAT).to_string())
}
