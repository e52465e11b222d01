use crate::utils::locale::Locale;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("Template '{template}' is not registered")]
    ConfigurationError { template: String },

    #[error("No ticket to generate")]
    EmptyBatchError,

    #[error("Ticket has no code")]
    MissingCodeError,

    #[error("Ticket code '{code}' is not in the authorized code list")]
    UnauthorizedCodeError { code: String },

    #[error("Nothing to deliver: neither a file nor tickets were supplied")]
    NothingToDeliverError,

    #[error("File not found: {}", path.display())]
    FileNotFoundError { path: PathBuf },

    #[error("Invalid file type for {}: expected {}", path.display(), allowed.join(", "))]
    InvalidFileTypeError { path: PathBuf, allowed: Vec<String> },

    #[error("Malformed ticket record: {message}")]
    NormalizationError { message: String },

    #[error("Delivery of {} aborted by receiver: {source}", path.display())]
    DeliveryAbortedError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Rendering failed: {message}")]
    RenderError { message: String },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TicketError>;

impl TicketError {
    /// 對外穩定的數字錯誤碼
    pub fn code(&self) -> u16 {
        match self {
            TicketError::ConfigurationError { .. } => 1,
            TicketError::EmptyBatchError => 2,
            TicketError::MissingCodeError => 3,
            TicketError::UnauthorizedCodeError { .. } => 4,
            TicketError::NothingToDeliverError => 5,
            TicketError::FileNotFoundError { .. } => 6,
            TicketError::InvalidFileTypeError { .. } => 7,
            TicketError::NormalizationError { .. } => 8,
            TicketError::DeliveryAbortedError { .. } => 9,
            TicketError::InvalidConfigValueError { .. } => 10,
            TicketError::RenderError { .. } => 11,
            TicketError::IoError(_) => 20,
            TicketError::CsvError(_) => 21,
            TicketError::ZipError(_) => 22,
            TicketError::SerializationError(_) => 23,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TicketError::ConfigurationError { .. } => "configuration",
            TicketError::EmptyBatchError => "empty_batch",
            TicketError::MissingCodeError => "missing_code",
            TicketError::UnauthorizedCodeError { .. } => "unauthorized_code",
            TicketError::NothingToDeliverError => "nothing_to_deliver",
            TicketError::FileNotFoundError { .. } => "file_not_found",
            TicketError::InvalidFileTypeError { .. } => "invalid_file_type",
            TicketError::NormalizationError { .. } => "normalization",
            TicketError::DeliveryAbortedError { .. } => "delivery_aborted",
            TicketError::InvalidConfigValueError { .. } => "invalid_config_value",
            TicketError::RenderError { .. } => "render",
            TicketError::IoError(_) => "io",
            TicketError::CsvError(_) => "csv",
            TicketError::ZipError(_) => "zip",
            TicketError::SerializationError(_) => "serialization",
        }
    }

    pub fn user_friendly_message(&self, locale: Locale) -> String {
        match locale {
            Locale::EnUs => self.to_string(),
            Locale::FrFr => self.french_message(),
        }
    }

    fn french_message(&self) -> String {
        match self {
            TicketError::ConfigurationError { template } => {
                format!("Le modèle de ticket « {} » n'existe pas.", template)
            }
            TicketError::EmptyBatchError => "Aucun ticket à générer.".to_string(),
            TicketError::MissingCodeError => "Le ticket n'a pas de code.".to_string(),
            TicketError::UnauthorizedCodeError { code } => format!(
                "Des codes de tickets sont définis mais le code « {} » n'en fait pas partie.",
                code
            ),
            TicketError::NothingToDeliverError => {
                "Aucun fichier ni ticket à télécharger.".to_string()
            }
            TicketError::FileNotFoundError { path } => {
                format!("Le fichier {} n'existe pas.", path.display())
            }
            TicketError::InvalidFileTypeError { path, allowed } => format!(
                "Le fichier {} n'est pas au format {}.",
                path.display(),
                allowed.join(", ")
            ),
            TicketError::NormalizationError { message } => {
                format!("Le ticket n'est pas un tableau valide : {}", message)
            }
            TicketError::DeliveryAbortedError { path, .. } => format!(
                "Le téléchargement de {} a été interrompu.",
                path.display()
            ),
            TicketError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Valeur invalide pour {} (« {} ») : {}", field, value, reason),
            TicketError::RenderError { message } => {
                format!("La génération du document a échoué : {}", message)
            }
            other => format!("Erreur interne : {}", other),
        }
    }
}
