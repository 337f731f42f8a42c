//! Bilingual (Arabic/English) navigator that routes free-text questions about
//! government services to entries of a static service catalog, using a locally
//! hosted language model as the classifier.

pub mod catalog;
pub mod chat;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod language;
pub mod messages;
pub mod model;
pub mod navigator;
pub mod outcome;
pub mod parser;
pub mod prompt;
pub mod render;
pub mod session;
pub mod web_server;

pub use catalog::{Catalog, ServiceRecord};
pub use error::{CatalogError, InvocationError};
pub use formatter::{format_for, DisplayRecord, RenderedOutcome};
pub use language::{detect_language, Language};
pub use model::{ModelBackend, OllamaHttpBackend, ProcessBackend};
pub use navigator::Navigator;
pub use outcome::ClassificationOutcome;
pub use parser::{match_key, parse_reply, KeyMatcher, ResponseParser};
