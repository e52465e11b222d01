use crate::utils::dates::{parse_datetime, DISPLAY_DATETIME_FORMAT};
use crate::utils::error::{Result, TicketError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::PathBuf;

/// 缺失欄位在渲染與匯出時顯示的文字
pub const MISSING_FIELD_MARKER: &str = "N/A";

/// 壓縮檔交付物的內容類型
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// 鍵名不固定的原始紀錄，來自 CSV 列或呼叫端
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub data: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// 由 JSON 物件建立紀錄；純量轉為字串，null 視為空值，巢狀結構則拒絕
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let object = match value {
            serde_json::Value::Object(object) => object,
            other => {
                return Err(TicketError::NormalizationError {
                    message: format!("expected a record, got {}", json_kind(&other)),
                })
            }
        };

        let mut data = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(b) => b.to_string(),
                serde_json::Value::Number(n) => n.to_string(),
                nested => {
                    return Err(TicketError::NormalizationError {
                        message: format!("field '{}' holds {}", key, json_kind(&nested)),
                    })
                }
            };
            data.insert(key, text);
        }

        Ok(Self { data })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// 標準欄位：實際值或缺失標記
///
/// `Missing` 與 `Value(String::new())` 不同，空白儲存格仍算有值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    Value(String),
    #[default]
    Missing,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Value(v) => Some(v.as_str()),
            FieldValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => f.write_str(v),
            FieldValue::Missing => f.write_str(MISSING_FIELD_MARKER),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Value(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Value(value)
    }
}

/// 正規化後的固定欄位票券
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalTicket {
    #[serde(rename = "ticket_code")]
    pub code: FieldValue,
    pub event_id: FieldValue,
    pub user_first_name: FieldValue,
    pub user_last_name: FieldValue,
    pub ticket_type: FieldValue,
    pub ticket_price: FieldValue,
    #[serde(rename = "ticket_buy_date")]
    pub buy_date: FieldValue,
    #[serde(rename = "link_validation")]
    pub validation_link: FieldValue,
    /// 來源有持票人 id 時保留，不列入匯出欄位
    #[serde(skip_serializing_if = "FieldValue::is_missing")]
    pub user_id: FieldValue,
}

impl CanonicalTicket {
    /// 票號存在且非空時回傳
    pub fn code(&self) -> Option<&str> {
        self.code.as_str().filter(|code| !code.is_empty())
    }
}

/// 產生票券的輸入：待正規化的原始紀錄或已是標準票券
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketInput {
    Raw(RawRecord),
    Canonical(CanonicalTicket),
}

impl From<RawRecord> for TicketInput {
    fn from(record: RawRecord) -> Self {
        TicketInput::Raw(record)
    }
}

impl From<CanonicalTicket> for TicketInput {
    fn from(ticket: CanonicalTicket) -> Self {
        TicketInput::Canonical(ticket)
    }
}

impl TicketInput {
    /// 單一物件視為一張票，陣列則逐筆轉換；其他型別一律拒絕
    pub fn from_json(value: serde_json::Value) -> Result<Vec<Self>> {
        match value {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| RawRecord::from_json(item).map(TicketInput::Raw))
                .collect(),
            other => Ok(vec![TicketInput::Raw(RawRecord::from_json(other)?)]),
        }
    }
}

/// 同一批次所有票券共用的活動資訊
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    pub logo: Option<PathBuf>,
    pub name: Option<String>,
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDateTime>,
}

impl EventContext {
    pub fn set_date(&mut self, value: &str) -> Result<()> {
        let parsed = parse_datetime(value).ok_or_else(|| TicketError::InvalidConfigValueError {
            field: "event.date".to_string(),
            value: value.to_string(),
            reason: "Unrecognized date format".to_string(),
        })?;
        self.date = Some(parsed);
        Ok(())
    }

    pub fn display_date(&self) -> Option<String> {
        self.date
            .map(|date| date.format(DISPLAY_DATETIME_FORMAT).to_string())
    }
}

/// 授權票號清單，為空時接受任何非空票號
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeWhitelist {
    codes: BTreeSet<String>,
}

impl CodeWhitelist {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactMode {
    Combined,
    PerTicket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketFile {
    pub code: String,
    pub path: PathBuf,
}

/// 一個批次的產出：單一合併文件，或每張票一個檔案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GeneratedArtifact {
    Combined { path: PathBuf },
    PerTicket { files: Vec<TicketFile> },
}

impl GeneratedArtifact {
    pub fn mode(&self) -> ArtifactMode {
        match self {
            GeneratedArtifact::Combined { .. } => ArtifactMode::Combined,
            GeneratedArtifact::PerTicket { .. } => ArtifactMode::PerTicket,
        }
    }

    pub fn paths(&self) -> Vec<&PathBuf> {
        match self {
            GeneratedArtifact::Combined { path } => vec![path],
            GeneratedArtifact::PerTicket { files } => files.iter().map(|f| &f.path).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub artifact: GeneratedArtifact,
    /// 依處理順序排列的票號
    pub codes: Vec<String>,
}

/// 交給傳輸層的檔案及其描述資訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deliverable {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub filename: String,
    pub len: u64,
    /// 完整送出後可刪除的檔案
    pub transient: Vec<PathBuf>,
}

impl Deliverable {
    pub fn is_archive(&self) -> bool {
        self.content_type == ARCHIVE_CONTENT_TYPE
    }
}
