//! Service catalog: an immutable, ordered set of bilingual service records.
//!
//! The catalog is loaded once at startup from a JSON object keyed by service
//! key and then shared read-only (`Arc<Catalog>`) between the classifier, the
//! formatter and any number of sessions. Document order is preserved because
//! key matching walks services in catalog order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::language::Language;

/// Requirement lists per language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    pub ar: Vec<String>,
    pub en: Vec<String>,
}

/// Body of one catalog entry, exactly as it appears in the source file.
#[derive(Debug, Clone, Deserialize)]
struct RawServiceRecord {
    title_ar: String,
    title_en: String,
    description_ar: String,
    description_en: String,
    platform: String,
    category: String,
    steps_ar: Vec<String>,
    steps_en: Vec<String>,
    requirements: Requirements,
    official_link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRecord {
    pub key: String,
    pub title_ar: String,
    pub title_en: String,
    pub description_ar: String,
    pub description_en: String,
    pub platform: String,
    pub category: String,
    pub steps_ar: Vec<String>,
    pub steps_en: Vec<String>,
    pub requirements: Requirements,
    pub official_link: Option<String>,
}

impl ServiceRecord {
    fn from_raw(key: String, raw: RawServiceRecord) -> Self {
        let link = raw.official_link.trim();
        Self {
            key,
            title_ar: raw.title_ar,
            title_en: raw.title_en,
            description_ar: raw.description_ar,
            description_en: raw.description_en,
            platform: raw.platform,
            category: raw.category,
            steps_ar: raw.steps_ar,
            steps_en: raw.steps_en,
            requirements: raw.requirements,
            official_link: (!link.is_empty()).then(|| link.to_string()),
        }
    }

    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title_ar, &self.title_en)
    }

    pub fn description(&self, lang: Language) -> &str {
        lang.pick(&self.description_ar, &self.description_en)
    }

    pub fn steps(&self, lang: Language) -> &[String] {
        match lang {
            Language::Ar => &self.steps_ar,
            Language::En => &self.steps_en,
        }
    }

    pub fn requirements(&self, lang: Language) -> &[String] {
        match lang {
            Language::Ar => &self.requirements.ar,
            Language::En => &self.requirements.en,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<ServiceRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&contents)?;
        info!(path = %path.display(), services = catalog.len(), "Loaded service catalog");
        Ok(catalog)
    }

    /// Parse a catalog document. Any entry missing a required field fails the
    /// whole load with an error naming that entry's key.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        let entries = match root {
            serde_json::Value::Object(map) => map,
            _ => return Err(CatalogError::NotAnObject),
        };

        let mut services = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if key.trim().is_empty() {
                return Err(CatalogError::EmptyKey);
            }
            if key.chars().any(char::is_uppercase) {
                // candidates are lower-cased before matching, so this key can only
                // be found by the unstructured scan
                warn!(%key, "Service key contains uppercase characters");
            }
            let raw: RawServiceRecord = serde_json::from_value(value).map_err(|source| {
                CatalogError::Schema {
                    key: key.clone(),
                    source,
                }
            })?;
            services.push(ServiceRecord::from_raw(key, raw));
        }

        Self::from_records(services)
    }

    pub fn from_records(services: Vec<ServiceRecord>) -> Result<Self, CatalogError> {
        if services.is_empty() {
            return Err(CatalogError::Empty);
        }
        let index = services
            .iter()
            .enumerate()
            .map(|(i, svc)| (svc.key.clone(), i))
            .collect();
        Ok(Self { services, index })
    }

    pub fn get(&self, key: &str) -> Option<&ServiceRecord> {
        self.index.get(key).map(|&i| &self.services[i])
    }

    /// Like [`Catalog::get`] but absence is an error.
    pub fn lookup(&self, key: &str) -> Result<&ServiceRecord, CatalogError> {
        self.get(key)
            .ok_or_else(|| CatalogError::UnknownKey(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Services in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.services.iter()
    }

    /// Keys in catalog order.
    pub fn keys(&self) -> Vec<&str> {
        self.services.iter().map(|svc| svc.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"{
        "passport_renewal": {
            "title_ar": "تجديد جواز السفر",
            "title_en": "Passport Renewal",
            "description_ar": "تجديد جواز السفر السعودي إلكترونياً عبر منصة أبشر",
            "description_en": "Renew a Saudi passport online through Absher",
            "platform": "Absher",
            "category": "Passports",
            "steps_ar": ["تسجيل الدخول إلى أبشر", "اختيار خدمات الجوازات"],
            "steps_en": ["Log in to Absher", "Open passport services", "Pay the fee"],
            "requirements": {"ar": ["هوية وطنية سارية"], "en": ["Valid national ID"]},
            "official_link": "https://www.absher.sa"
        },
        "renew_driving_license": {
            "title_ar": "تجديد رخصة القيادة",
            "title_en": "Driving License Renewal",
            "description_ar": "تجديد رخصة القيادة المنتهية أو القريبة من الانتهاء",
            "description_en": "Renew an expired or expiring driving license",
            "platform": "Absher",
            "category": "Traffic",
            "steps_ar": ["إجراء الفحص الطبي", "سداد الرسوم"],
            "steps_en": ["Complete the medical check", "Pay the fee"],
            "requirements": {"ar": ["فحص طبي"], "en": ["Medical check"]},
            "official_link": ""
        }
    }"#;

    #[test]
    fn test_load_preserves_document_order() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.keys(), vec!["passport_renewal", "renew_driving_license"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_empty_link_becomes_none() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let svc = catalog.get("renew_driving_license").unwrap();
        assert!(svc.official_link.is_none());
        let svc = catalog.get("passport_renewal").unwrap();
        assert_eq!(svc.official_link.as_deref(), Some("https://www.absher.sa"));
    }

    #[test]
    fn test_language_projections() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        let svc = catalog.get("passport_renewal").unwrap();
        assert_eq!(svc.title(Language::En), "Passport Renewal");
        assert_eq!(svc.title(Language::Ar), "تجديد جواز السفر");
        assert_eq!(svc.steps(Language::En).len(), 3);
        assert_eq!(svc.requirements(Language::Ar), ["هوية وطنية سارية".to_string()]);
    }

    #[test]
    fn test_missing_field_names_offending_key() {
        let json = r#"{"broken_service": {"title_ar": "x", "title_en": "y"}}"#;
        let err = Catalog::from_json_str(json).unwrap_err();
        match &err {
            CatalogError::Schema { key, .. } => assert_eq!(key, "broken_service"),
            other => panic!("Expected schema error, got {:?}", other),
        }
        assert!(err.to_string().contains("broken_service"));
    }

    #[test]
    fn test_missing_requirements_language_is_schema_error() {
        let json = SAMPLE.replace(
            r#""requirements": {"ar": ["فحص طبي"], "en": ["Medical check"]}"#,
            r#""requirements": {"ar": ["فحص طبي"]}"#,
        );
        let err = Catalog::from_json_str(&json).unwrap_err();
        assert!(matches!(err, CatalogError::Schema { ref key, .. } if key == "renew_driving_license"));
    }

    #[test]
    fn test_non_object_root_rejected() {
        assert!(matches!(
            Catalog::from_json_str("[1, 2]").unwrap_err(),
            CatalogError::NotAnObject
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(Catalog::from_json_str("{}").unwrap_err(), CatalogError::Empty));
    }

    #[test]
    fn test_lookup_unknown_key() {
        let catalog = Catalog::from_json_str(SAMPLE).unwrap();
        assert!(matches!(
            catalog.lookup("missing").unwrap_err(),
            CatalogError::UnknownKey(ref k) if k == "missing"
        ));
        assert!(catalog.contains("passport_renewal"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");
        std::fs::write(&path, SAMPLE).unwrap();
        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);

        let missing = dir.path().join("nope.json");
        assert!(matches!(Catalog::load(&missing).unwrap_err(), CatalogError::Io { .. }));
    }
}
