//! Classification boundary: query text in, [`ClassificationOutcome`] out.
//!
//! `Navigator` wires the prompt builder, the model backend and the response
//! parser around one shared catalog. Every failure on the way (template,
//! spawn, exit code, timeout) is turned into a localized conversation reply;
//! callers never see raw model text or process errors.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::catalog::Catalog;
use crate::error::{InvocationError, TemplateError};
use crate::formatter::{self, RenderedOutcome};
use crate::language::{detect_language, Language};
use crate::messages;
use crate::model::ModelBackend;
use crate::outcome::ClassificationOutcome;
use crate::parser::ResponseParser;
use crate::prompt::PromptBuilder;

pub struct Navigator {
    catalog: Arc<Catalog>,
    backend: Box<dyn ModelBackend>,
    prompts: PromptBuilder,
    parser: ResponseParser,
}

impl Navigator {
    pub fn new(catalog: Arc<Catalog>, backend: Box<dyn ModelBackend>) -> Result<Self, TemplateError> {
        info!(
            services = catalog.len(),
            backend = %backend.describe(),
            "Initializing navigator"
        );
        Ok(Self {
            parser: ResponseParser::for_catalog(&catalog),
            prompts: PromptBuilder::new()?,
            catalog,
            backend,
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The prompt that [`Navigator::classify`] would send for `query`.
    pub fn prompt_for(&self, query: &str) -> Result<String, TemplateError> {
        self.prompts
            .build(query, &self.catalog, detect_language(query))
    }

    #[instrument(skip(self))]
    pub async fn classify(&self, query: &str) -> ClassificationOutcome {
        let lang = detect_language(query);
        debug!(%lang, "Detected query language");

        let prompt = match self.prompts.build(query, &self.catalog, lang) {
            Ok(prompt) => prompt,
            Err(e) => {
                error!("Failed to build prompt: {}", e);
                return ClassificationOutcome::conversation(messages::unexpected_error(lang));
            }
        };

        match self.backend.generate(&prompt).await {
            Ok(raw) => {
                debug!(%raw, "Model reply");
                let outcome = self.parser.parse(&raw, lang);
                info!(?outcome, "Classified query");
                outcome
            }
            Err(e) => failure_outcome(&e, lang),
        }
    }

    pub fn format_for(&self, outcome: &ClassificationOutcome, lang: Language) -> RenderedOutcome {
        formatter::format_for(&self.catalog, outcome, lang)
    }
}

fn failure_outcome(err: &InvocationError, lang: Language) -> ClassificationOutcome {
    if err.is_timeout() {
        warn!("Model call timed out: {}", err);
        ClassificationOutcome::conversation(messages::timed_out(lang))
    } else {
        error!("Model call failed: {}", err);
        ClassificationOutcome::conversation(messages::unexpected_error(lang))
    }
}
