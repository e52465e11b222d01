pub mod dates;
pub mod error;
pub mod locale;
pub mod logger;
pub mod validation;
