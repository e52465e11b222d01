pub mod engine;
pub mod export;
pub mod generator;
pub mod import;
pub mod normalizer;
pub mod packaging;
pub mod registry;
pub mod validator;

pub use crate::domain::model::{
    CanonicalTicket, CodeWhitelist, Deliverable, EventContext, FieldValue, GeneratedArtifact,
    GenerationOutcome, RawRecord, TicketFile, TicketInput,
};
pub use crate::domain::ports::{ArchiveWriter, ImageGenerator, TicketTemplate};
pub use crate::utils::error::Result;
