//! Runtime settings: environment defaults plus command-line overrides.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::constants;
use crate::model::{ModelBackend, OllamaHttpBackend, ProcessBackend};
use crate::navigator::Navigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Spawn the model CLI once per query.
    Cli,
    /// POST to a running Ollama server.
    Http,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" | "process" => Ok(BackendKind::Cli),
            "http" | "ollama" => Ok(BackendKind::Http),
            other => Err(format!("unknown backend '{}', expected 'cli' or 'http'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Cli => f.write_str("cli"),
            BackendKind::Http => f.write_str("http"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub backend: BackendKind,
    pub model: String,
    pub command: String,
    pub command_args: Vec<String>,
    pub timeout: Duration,
    pub ollama_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let backend = constants::BACKEND.parse().unwrap_or_else(|e| {
            tracing::warn!("{}; falling back to cli", e);
            BackendKind::Cli
        });
        Self {
            catalog_path: PathBuf::from(constants::CATALOG_PATH.as_str()),
            backend,
            model: constants::MODEL.clone(),
            command: constants::MODEL_COMMAND.clone(),
            command_args: constants::MODEL_COMMAND_ARGS.clone(),
            timeout: Duration::from_secs(*constants::TIMEOUT_SECS),
            ollama_url: constants::OLLAMA_URL.clone(),
        }
    }

    pub fn build_backend(&self) -> Box<dyn ModelBackend> {
        match self.backend {
            BackendKind::Cli => Box::new(ProcessBackend::new(
                self.command.clone(),
                self.command_args.clone(),
                self.model.clone(),
                self.timeout,
            )),
            BackendKind::Http => Box::new(OllamaHttpBackend::new(
                self.ollama_url.clone(),
                self.model.clone(),
                self.timeout,
            )),
        }
    }

    pub fn load_catalog(&self) -> Result<Arc<Catalog>> {
        let catalog = Catalog::load(&self.catalog_path).with_context(|| {
            format!("Failed to load service catalog from {}", self.catalog_path.display())
        })?;
        Ok(Arc::new(catalog))
    }

    /// Load the catalog and assemble a ready navigator.
    pub fn build_navigator(&self) -> Result<Navigator> {
        let catalog = self.load_catalog()?;
        Navigator::new(catalog, self.build_backend()).context("Failed to initialize prompt template")
    }
}
