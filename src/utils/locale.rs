use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 使用者面向的語系，明確傳遞給匯出與錯誤訊息，不修改行程全域設定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Locale {
    #[default]
    FrFr,
    EnUs,
}

impl Locale {
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::FrFr => "fr-FR",
            Locale::EnUs => "en-US",
        }
    }

    /// 匯出顯示用標題，依欄位順序
    pub fn export_labels(&self) -> [&'static str; 8] {
        match self {
            Locale::FrFr => [
                "#",
                "Code",
                "Événement",
                "Prénom",
                "Nom",
                "Type",
                "Prix",
                "Date d'achat",
            ],
            Locale::EnUs => [
                "#",
                "Code",
                "Event",
                "First name",
                "Last name",
                "Type",
                "Price",
                "Purchase date",
            ],
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-").to_ascii_lowercase();
        match normalized.as_str() {
            "fr" | "fr-fr" => Ok(Locale::FrFr),
            "en" | "en-us" | "en-gb" => Ok(Locale::EnUs),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Locale> for String {
    fn from(locale: Locale) -> Self {
        locale.tag().to_string()
    }
}
