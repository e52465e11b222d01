pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::storage::LocalStorage;
pub use config::toml_config::TicketsConfig;
pub use core::{
    engine::{ExportRequest, ExportOutput, TicketEngine},
    generator::GenerateRequest,
};
pub use domain::model::{
    CanonicalTicket, CodeWhitelist, Deliverable, EventContext, FieldValue, GeneratedArtifact,
    GenerationOutcome, RawRecord, TicketFile, TicketInput,
};
pub use utils::error::{Result, TicketError};
pub use utils::locale::Locale;
