//! Expands classification outcomes into language-specific display data.
//!
//! Formatting happens at render time, not at classification time, so a stored
//! outcome can be re-rendered in the other language without another model call.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::language::Language;
use crate::messages;
use crate::outcome::ClassificationOutcome;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub key: String,
    pub title: String,
    pub description: String,
    pub platform: String,
    pub category: String,
    pub steps: Vec<String>,
    pub requirements: Vec<String>,
    pub official_link: Option<String>,
}

impl DisplayRecord {
    fn placeholder(key: &str, lang: Language) -> Self {
        Self {
            key: key.to_string(),
            title: messages::service_unavailable_title(lang).to_string(),
            description: messages::not_available(lang).to_string(),
            platform: String::new(),
            category: String::new(),
            steps: Vec::new(),
            requirements: Vec::new(),
            official_link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum RenderedOutcome {
    Message(String),
    Services(Vec<DisplayRecord>),
}

/// Project one service into `lang`. Unknown keys are an error.
pub fn format_service(
    catalog: &Catalog,
    key: &str,
    lang: Language,
) -> Result<DisplayRecord, CatalogError> {
    let svc = catalog.lookup(key)?;
    Ok(DisplayRecord {
        key: svc.key.clone(),
        title: svc.title(lang).to_string(),
        description: svc.description(lang).to_string(),
        platform: svc.platform.clone(),
        category: svc.category.clone(),
        steps: svc.steps(lang).to_vec(),
        requirements: svc.requirements(lang).to_vec(),
        official_link: svc.official_link.clone(),
    })
}

/// Render boundary. Never fails: a key missing from the catalog is logged and
/// shown as a placeholder record.
pub fn format_for(
    catalog: &Catalog,
    outcome: &ClassificationOutcome,
    lang: Language,
) -> RenderedOutcome {
    match outcome {
        ClassificationOutcome::Conversation { message } => RenderedOutcome::Message(message.clone()),
        _ => RenderedOutcome::Services(
            outcome
                .service_keys()
                .into_iter()
                .map(|key| {
                    format_service(catalog, key, lang).unwrap_or_else(|e| {
                        error!(%key, "Resolved service missing from catalog: {}", e);
                        DisplayRecord::placeholder(key, lang)
                    })
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::SAMPLE;

    fn catalog() -> Catalog {
        Catalog::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_format_english_steps_in_order() {
        let catalog = catalog();
        let outcome = ClassificationOutcome::Service {
            key: "passport_renewal".to_string(),
        };
        match format_for(&catalog, &outcome, Language::En) {
            RenderedOutcome::Services(records) => {
                assert_eq!(records.len(), 1);
                let svc = catalog.get("passport_renewal").unwrap();
                assert_eq!(records[0].steps, svc.steps_en);
                assert_eq!(records[0].title, "Passport Renewal");
                assert_eq!(records[0].requirements, vec!["Valid national ID".to_string()]);
            }
            other => panic!("Expected services, got {:?}", other),
        }
    }

    #[test]
    fn test_format_arabic_projection() {
        let record = format_service(&catalog(), "renew_driving_license", Language::Ar).unwrap();
        assert_eq!(record.title, "تجديد رخصة القيادة");
        assert_eq!(record.steps, vec!["إجراء الفحص الطبي".to_string(), "سداد الرسوم".to_string()]);
        // language-independent fields
        assert_eq!(record.platform, "Absher");
        assert_eq!(record.category, "Traffic");
        assert!(record.official_link.is_none());
    }

    #[test]
    fn test_format_unknown_key_is_error() {
        assert!(matches!(
            format_service(&catalog(), "ghost", Language::En),
            Err(CatalogError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_format_for_unknown_key_uses_placeholder() {
        let outcome = ClassificationOutcome::MultiService {
            keys: vec!["ghost".to_string(), "passport_renewal".to_string()],
        };
        match format_for(&catalog(), &outcome, Language::En) {
            RenderedOutcome::Services(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].key, "ghost");
                assert_eq!(records[0].title, "Service unavailable");
                assert_eq!(records[1].title, "Passport Renewal");
            }
            other => panic!("Expected services, got {:?}", other),
        }
    }

    #[test]
    fn test_format_for_conversation() {
        let outcome = ClassificationOutcome::conversation("Hello");
        assert_eq!(
            format_for(&catalog(), &outcome, Language::Ar),
            RenderedOutcome::Message("Hello".to_string())
        );
    }

    #[test]
    fn test_same_outcome_renders_in_both_languages() {
        let catalog = catalog();
        let outcome = ClassificationOutcome::Service {
            key: "passport_renewal".to_string(),
        };
        let en = format_for(&catalog, &outcome, Language::En);
        let ar = format_for(&catalog, &outcome, Language::Ar);
        assert_ne!(en, ar);
    }
}
