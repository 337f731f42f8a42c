//! Error types for the navigator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while loading or querying the service catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalog root must be a JSON object keyed by service key")]
    NotAnObject,

    #[error("Service '{key}' does not match the catalog schema: {source}")]
    Schema {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Catalog contains a service with an empty key")]
    EmptyKey,

    #[error("Catalog contains no services")]
    Empty,

    #[error("Unknown service key: {0}")]
    UnknownKey(String),
}

/// Failures while calling the external model.
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("Model did not answer within {0:?}")]
    TimedOut(Duration),

    #[error("Failed to spawn model process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error talking to model process: {0}")]
    Io(#[source] std::io::Error),

    #[error("Model process exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Model HTTP request failed: {0}")]
    Http(String),
}

impl InvocationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InvocationError::TimedOut(_))
    }
}

/// Prompt template could not be rendered.
#[derive(Error, Debug)]
#[error("Prompt template error: {0}")]
pub struct TemplateError(#[from] pub minijinja::Error);
