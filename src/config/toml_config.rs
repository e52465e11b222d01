use crate::core::engine::DEFAULT_TEMPLATE;
use crate::domain::model::EventContext;
use crate::utils::dates::parse_datetime;
use crate::utils::error::{Result, TicketError};
use crate::utils::locale::Locale;
use crate::utils::validation::{
    validate_delimiter, validate_non_empty_string, validate_path, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketsConfig {
    #[serde(default)]
    pub event: EventSection,
    #[serde(default)]
    pub tickets: TicketsSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSection {
    pub logo: Option<PathBuf>,
    pub name: Option<String>,
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketsSection {
    pub output_path: String,
    pub template: String,
    pub use_qr_links: bool,
    pub delimiter: char,
    pub locale: Locale,
    pub whitelist: Vec<String>,
    pub keep_artifacts: bool,
}

impl Default for TicketsSection {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            use_qr_links: false,
            delimiter: ';',
            locale: Locale::default(),
            whitelist: Vec::new(),
            keep_artifacts: true,
        }
    }
}

impl TicketsConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TicketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TicketError::InvalidConfigValueError {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${EVENT_NAME})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TicketError::InvalidConfigValueError {
            field: "environment".to_string(),
            value: String::new(),
            reason: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn event_context(&self) -> Result<EventContext> {
        let mut event = EventContext {
            logo: self.event.logo.clone(),
            name: self.event.name.clone(),
            organizer: self.event.organizer.clone(),
            location: self.event.location.clone(),
            date: None,
        };
        if let Some(date) = &self.event.date {
            event.set_date(date)?;
        }
        Ok(event)
    }

    pub fn delimiter(&self) -> Result<u8> {
        validate_delimiter("tickets.delimiter", self.tickets.delimiter)
    }

    pub fn output_path(&self) -> &str {
        &self.tickets.output_path
    }
}

impl Validate for TicketsConfig {
    fn validate(&self) -> Result<()> {
        validate_path("tickets.output_path", &self.tickets.output_path)?;
        validate_non_empty_string("tickets.template", &self.tickets.template)?;
        validate_delimiter("tickets.delimiter", self.tickets.delimiter)?;

        if let Some(date) = &self.event.date {
            if parse_datetime(date).is_none() {
                return Err(TicketError::InvalidConfigValueError {
                    field: "event.date".to_string(),
                    value: date.clone(),
                    reason: "Unrecognized date format".to_string(),
                });
            }
        }

        if self.tickets.whitelist.iter().any(|code| code.is_empty()) {
            return Err(TicketError::InvalidConfigValueError {
                field: "tickets.whitelist".to_string(),
                value: String::new(),
                reason: "Authorized codes cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}
