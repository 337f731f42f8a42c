//! Classification prompt, rendered from a minijinja template.
//!
//! The prompt is the model's whole task description: the catalog summary, the
//! output protocol (`SERVICE_KEY: <key>` lines) and the reply language. No
//! conversation history is included, so every query is classified on its own.

use minijinja::{context, Environment};
use serde::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::TemplateError;
use crate::language::Language;

/// Descriptions are cut to this many characters in the catalog summary.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 100;

const TEMPLATE_NAME: &str = "classify_prompt.txt";

const CLASSIFY_TEMPLATE: &str = r#"You are {{ assistant_name }}.

SERVICES:
{% for svc in services -%}
- {{ svc.key }}: {{ svc.title_ar }} / {{ svc.title_en }} | {{ svc.description }}
{% endfor %}
USER: "{{ query }}"

RULES:
1. Greeting -> greet back, NO SERVICE_KEY
2. "What are your services?" -> list service NAMES only, NO SERVICE_KEY
3. Service request -> if you find matches, you MUST output ALL of them as:
   SERVICE_KEY: key1
   SERVICE_KEY: key2
   (one SERVICE_KEY per line, NO explanations before the keys)
4. No match -> say "this service is not available" in {{ language }}, NO SERVICE_KEY, do NOT ask for clarification

HOW TO MATCH:
- Identify what the user ACTUALLY wants to DO (the ACTION/PROBLEM they need solved)
- Match ONLY if a service directly SOLVES that specific problem
- Do NOT match on shared words alone and do NOT guess from partial matches
- If the user needs MULTIPLE services, output ALL of them as SERVICE_KEY lines
- Do NOT write explanations or descriptions, just output SERVICE_KEY lines
- Read service descriptions carefully to understand what each service actually does
- If no service solves the user's actual problem -> say "not available"

LANGUAGE: Reply ONLY in {{ language }}. Never use any other language."#;

#[derive(Debug, Serialize)]
struct ServiceSummary<'a> {
    key: &'a str,
    title_ar: &'a str,
    title_en: &'a str,
    description: String,
}

fn assistant_name(lang: Language) -> &'static str {
    lang.pick(
        "موجه الخدمات الحكومية السعودية",
        "Saudi Government Services Navigator",
    )
}

/// First `max_chars` characters of `text` (character, not byte, boundary).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, CLASSIFY_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the prompt for one query. Output depends only on the inputs.
    pub fn build(
        &self,
        query: &str,
        catalog: &Catalog,
        lang: Language,
    ) -> Result<String, TemplateError> {
        let services: Vec<ServiceSummary> = catalog
            .iter()
            .map(|svc| ServiceSummary {
                key: &svc.key,
                title_ar: &svc.title_ar,
                title_en: &svc.title_en,
                // the Arabic description is the one summarised, whatever the query language
                description: truncate_chars(&svc.description_ar, DESCRIPTION_PREVIEW_CHARS)
                    .to_string(),
            })
            .collect();

        let template = self.env.get_template(TEMPLATE_NAME)?;
        let prompt = template.render(context! {
            assistant_name => assistant_name(lang),
            services => services,
            query => query,
            language => lang.display_name(),
        })?;

        debug!(chars = prompt.chars().count(), %lang, "Built classification prompt");
        Ok(prompt)
    }
}
