//! Script-count language detection for user queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two languages the navigator answers in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ar,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    /// English name of the language, used inside the model prompt.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Ar => "Arabic",
            Language::En => "English",
        }
    }

    /// Pick between an Arabic and an English variant of the same text.
    pub fn pick<'a>(&self, ar: &'a str, en: &'a str) -> &'a str {
        match self {
            Language::Ar => ar,
            Language::En => en,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" | "arabic" => Ok(Language::Ar),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("unsupported language '{}', expected 'ar' or 'en'", other)),
        }
    }
}

/// Classify `text` as Arabic or English.
///
/// Counts characters in the Arabic block (U+0600..=U+06FF) against ASCII Latin
/// letters. Arabic wins only on a strict majority, so ties (including empty
/// input) and numeral-only or mixed text fall back to English.
pub fn detect_language(text: &str) -> Language {
    let (arabic, latin) = text.chars().fold((0usize, 0usize), |(ar, en), c| {
        if ('\u{0600}'..='\u{06FF}').contains(&c) {
            (ar + 1, en)
        } else if c.is_ascii_alphabetic() {
            (ar, en + 1)
        } else {
            (ar, en)
        }
    });

    if arabic > latin {
        Language::Ar
    } else {
        Language::En
    }
}
