//! Turns free-text model replies into a [`ClassificationOutcome`].
//!
//! The model is asked to answer with `SERVICE_KEY: <key>` lines, but nothing
//! guarantees it does. Parsing is therefore total: any input, including empty,
//! truncated or adversarial text, yields an outcome and never an error.
//!
//! Decision order:
//! 1. `NO_MATCH` anywhere in the reply: conversation with the remaining text.
//! 2. `SERVICE_KEY:` lines: the token after the marker on each line is resolved
//!    with [`KeyMatcher`], first occurrence wins, duplicates dropped.
//! 3. Nothing resolved: any catalog key appearing literally in the reply, in
//!    catalog order.
//! 4. One key is a `Service`, several a `MultiService`, none a conversation
//!    with key-like tokens scrubbed out.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::language::Language;
use crate::messages;
use crate::outcome::ClassificationOutcome;

/// Marker the model puts in front of every matched key.
pub const SERVICE_KEY_MARKER: &str = "SERVICE_KEY:";

/// Marker for an explicit "nothing matches" reply.
pub const NO_MATCH_MARKER: &str = "NO_MATCH";

/// Candidates shorter than this that contain a decline token are treated as the
/// model saying "none".
const DECLINE_MAX_CHARS: usize = 20;

const DECLINE_TOKENS: [&str; 2] = ["none", "no_match"];

const CANDIDATE_PUNCTUATION: &[char] = &['*', '`', ',', '.', '[', ']', '(', ')'];

lazy_static! {
    static ref NO_MATCH_RE: Regex =
        Regex::new(&format!(r"(?i){}[\s.:,;!\-]*", regex::escape(NO_MATCH_MARKER)))
            .expect("valid regex");
    static ref SERVICE_KEY_RE: Regex =
        Regex::new(&format!("(?i){}", regex::escape(SERVICE_KEY_MARKER))).expect("valid regex");
    static ref SERVICE_KEY_FRAGMENT_RE: Regex =
        Regex::new(&format!(r"(?i){}[ \t]*\S*", regex::escape(SERVICE_KEY_MARKER)))
            .expect("valid regex");
    static ref KEY_LIKE_TOKEN_RE: Regex = Regex::new(r"\[?\w+_\w+\]?").expect("valid regex");
}

struct KeyPattern {
    key: String,
    word: Option<Regex>,
    spaced: String,
}

/// Resolves a candidate token against the catalog keys.
///
/// Strategy A looks for the key as a whole word in the candidate. Strategy B
/// looks for the key with underscores replaced by spaces. Every key is tried
/// with A, in catalog order, before any key is tried with B.
pub struct KeyMatcher {
    patterns: Vec<KeyPattern>,
}

impl KeyMatcher {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = keys
            .into_iter()
            .map(|key| {
                let key = key.as_ref().to_string();
                let word = match Regex::new(&format!(r"\b{}\b", regex::escape(&key))) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(%key, "Cannot build whole-word pattern for key: {}", e);
                        None
                    }
                };
                let spaced = key.replace('_', " ");
                KeyPattern { key, word, spaced }
            })
            .collect();
        Self { patterns }
    }

    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self::new(catalog.keys())
    }

    /// Keys in the order they were given.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.key.as_str())
    }

    pub fn find(&self, candidate: &str) -> Option<&str> {
        let text = candidate.trim().to_lowercase();

        if text.chars().count() < DECLINE_MAX_CHARS
            && DECLINE_TOKENS.iter().any(|token| text.contains(token))
        {
            return None;
        }

        self.patterns
            .iter()
            .find(|p| p.word.as_ref().is_some_and(|re| re.is_match(&text)))
            .or_else(|| self.patterns.iter().find(|p| text.contains(&p.spaced)))
            .map(|p| p.key.as_str())
    }
}

/// One-shot form of [`KeyMatcher::find`].
pub fn match_key<'a>(candidate: &str, valid_keys: &[&'a str]) -> Option<&'a str> {
    let matcher = KeyMatcher::new(valid_keys.iter());
    let found = matcher.find(candidate)?;
    valid_keys.iter().copied().find(|key| *key == found)
}

/// Token following the last `SERVICE_KEY:` on a line, lower-cased and stripped
/// of surrounding markdown punctuation. `None` if the line has no marker.
fn key_candidate(line: &str) -> Option<String> {
    let marker = SERVICE_KEY_RE.find_iter(line).last()?;
    let token = line[marker.end()..].split_whitespace().next().unwrap_or("");
    Some(
        token
            .to_lowercase()
            .trim_matches(CANDIDATE_PUNCTUATION)
            .to_string(),
    )
}

fn push_unique(keys: &mut Vec<String>, key: &str) {
    if !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

pub struct ResponseParser {
    matcher: KeyMatcher,
}

impl ResponseParser {
    pub fn new(matcher: KeyMatcher) -> Self {
        Self { matcher }
    }

    pub fn for_catalog(catalog: &Catalog) -> Self {
        Self::new(KeyMatcher::for_catalog(catalog))
    }

    pub fn parse(&self, raw: &str, lang: Language) -> ClassificationOutcome {
        let text = raw.trim();

        if NO_MATCH_RE.is_match(text) {
            let without_marker = NO_MATCH_RE.replace_all(text, "");
            let message = SERVICE_KEY_FRAGMENT_RE.replace_all(&without_marker, "");
            let message = message.trim();
            debug!("Model reported no match");
            return if message.is_empty() {
                ClassificationOutcome::conversation(messages::not_available(lang))
            } else {
                ClassificationOutcome::conversation(message)
            };
        }

        let mut keys = self.structured_keys(text);
        if keys.is_empty() {
            keys = self.scan_for_keys(text);
            if !keys.is_empty() {
                debug!(?keys, "Resolved keys from unstructured reply");
            }
        }

        if let Some(outcome) = ClassificationOutcome::from_keys(keys) {
            return outcome;
        }

        let scrubbed = SERVICE_KEY_FRAGMENT_RE.replace_all(text, "");
        let scrubbed = KEY_LIKE_TOKEN_RE.replace_all(&scrubbed, "");
        let message = scrubbed.trim();
        if message.is_empty() {
            ClassificationOutcome::conversation(messages::how_can_i_help(lang))
        } else {
            ClassificationOutcome::conversation(message)
        }
    }

    fn structured_keys(&self, text: &str) -> Vec<String> {
        let mut keys = Vec::new();
        for candidate in text.lines().filter_map(key_candidate) {
            match self.matcher.find(&candidate) {
                Some(key) => push_unique(&mut keys, key),
                None => debug!(%candidate, "SERVICE_KEY candidate did not resolve"),
            }
        }
        keys
    }

    // Literal substring scan. Can fire on a key quoted inside unrelated prose.
    fn scan_for_keys(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut keys = Vec::new();
        for key in self.matcher.keys() {
            if lowered.contains(key) {
                push_unique(&mut keys, key);
            }
        }
        keys
    }
}

/// One-shot form of [`ResponseParser::parse`].
pub fn parse_reply(raw: &str, valid_keys: &[&str], lang: Language) -> ClassificationOutcome {
    ResponseParser::new(KeyMatcher::new(valid_keys.iter())).parse(raw, lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 4] = [
        "passport_renewal",
        "renew_driving_license",
        "traffic_violations",
        "national_id_issue",
    ];

    fn parse(raw: &str) -> ClassificationOutcome {
        parse_reply(raw, &KEYS, Language::En)
    }

    fn service(key: &str) -> ClassificationOutcome {
        ClassificationOutcome::Service { key: key.to_string() }
    }

    fn conversation(message: &str) -> ClassificationOutcome {
        ClassificationOutcome::conversation(message)
    }

    // --- key matcher ---

    #[test]
    fn test_match_whole_word() {
        assert_eq!(
            match_key("renew_driving_license", &["renew_driving_license"]),
            Some("renew_driving_license")
        );
    }

    #[test]
    fn test_match_underscores_as_spaces() {
        assert_eq!(
            match_key("renew driving license", &["renew_driving_license"]),
            Some("renew_driving_license")
        );
    }

    #[test]
    fn test_match_unrelated_text() {
        assert_eq!(match_key("unrelated text", &["renew_driving_license"]), None);
    }

    #[test]
    fn test_match_is_case_insensitive_on_candidate() {
        assert_eq!(match_key("Passport_Renewal", &KEYS), Some("passport_renewal"));
    }

    #[test]
    fn test_match_rejects_short_decline() {
        assert_eq!(match_key("none", &KEYS), None);
        assert_eq!(match_key("NONE.", &KEYS), None);
        assert_eq!(match_key("no_match", &KEYS), None);
    }

    #[test]
    fn test_long_candidate_with_none_still_matches() {
        // 20+ characters, so "none" is not read as a decline
        assert_eq!(
            match_key("none of these except passport_renewal", &KEYS),
            Some("passport_renewal")
        );
    }

    #[test]
    fn test_whole_word_beats_spaced_across_keys() {
        // "a b" (spaced form of a_b) appears, but c_d matches as a whole word
        let keys = ["a_b", "c_d"];
        assert_eq!(match_key("a b then c_d", &keys), Some("c_d"));
    }

    #[test]
    fn test_whole_word_respects_boundaries() {
        let keys = ["passport", "passport_renewal"];
        assert_eq!(match_key("passport_renewal", &keys), Some("passport_renewal"));
        assert_eq!(match_key("the passports", &["passports_office"]), None);
    }

    #[test]
    fn test_catalog_order_wins_on_ties() {
        let keys = ["traffic_violations", "passport_renewal"];
        assert_eq!(
            match_key("passport_renewal traffic_violations", &keys),
            Some("traffic_violations")
        );
    }

    #[test]
    fn test_empty_candidate() {
        assert_eq!(match_key("", &KEYS), None);
        assert_eq!(match_key("anything", &[]), None);
    }

    // --- candidate extraction ---

    #[test]
    fn test_key_candidate_strips_punctuation() {
        assert_eq!(
            key_candidate("**SERVICE_KEY: `passport_renewal`**,").as_deref(),
            Some("passport_renewal")
        );
        assert_eq!(
            key_candidate("service_key: [Traffic_Violations].").as_deref(),
            Some("traffic_violations")
        );
        assert_eq!(key_candidate("SERVICE_KEY:").as_deref(), Some(""));
        assert_eq!(key_candidate("no marker here"), None);
    }

    #[test]
    fn test_key_candidate_takes_last_marker_on_line() {
        assert_eq!(
            key_candidate("SERVICE_KEY: a_b SERVICE_KEY: c_d").as_deref(),
            Some("c_d")
        );
    }

    // --- step 1: explicit no match ---

    #[test]
    fn test_no_match_keeps_message() {
        assert_eq!(
            parse("NO_MATCH. This service is not available."),
            conversation("This service is not available.")
        );
    }

    #[test]
    fn test_no_match_alone_uses_canned_message() {
        assert_eq!(parse("NO_MATCH"), conversation(messages::not_available(Language::En)));
        assert_eq!(
            parse_reply("  no_match  ", &KEYS, Language::Ar),
            conversation(messages::not_available(Language::Ar))
        );
    }

    #[test]
    fn test_no_match_beats_service_keys() {
        assert_eq!(
            parse("NO_MATCH\nSERVICE_KEY: passport_renewal"),
            conversation(messages::not_available(Language::En))
        );
    }

    #[test]
    fn test_marker_constants_drive_parsing() {
        assert_eq!(
            parse(&format!("{} passport_renewal", SERVICE_KEY_MARKER)),
            service("passport_renewal")
        );
        assert_eq!(
            parse(&format!("{}: Not offered.", NO_MATCH_MARKER.to_lowercase())),
            conversation("Not offered.")
        );
    }

    // --- step 2: structured keys ---

    #[test]
    fn test_single_service_key() {
        assert_eq!(parse("SERVICE_KEY: passport_renewal"), service("passport_renewal"));
    }

    #[test]
    fn test_duplicate_keys_collapse_to_service() {
        assert_eq!(
            parse("SERVICE_KEY: passport_renewal\nSERVICE_KEY: passport_renewal\n"),
            service("passport_renewal")
        );
    }

    #[test]
    fn test_multiple_keys_keep_first_occurrence_order() {
        let outcome = parse(
            "SERVICE_KEY: traffic_violations\nSERVICE_KEY: passport_renewal\nSERVICE_KEY: traffic_violations",
        );
        assert_eq!(
            outcome,
            ClassificationOutcome::MultiService {
                keys: vec!["traffic_violations".to_string(), "passport_renewal".to_string()],
            }
        );
    }

    #[test]
    fn test_marker_is_case_insensitive_and_markdown_tolerant() {
        let outcome = parse("- **service_key: `Renew_Driving_License`**\n* Service_Key: national_id_issue.");
        assert_eq!(
            outcome.service_keys(),
            vec!["renew_driving_license", "national_id_issue"]
        );
    }

    #[test]
    fn test_prose_around_keys_is_ignored() {
        let outcome = parse("Here you go:\nSERVICE_KEY: passport_renewal\nHope this helps!");
        assert_eq!(outcome, service("passport_renewal"));
    }

    #[test]
    fn test_invalid_structured_key_falls_back_to_scan() {
        // the marker token is unknown, but a real key is mentioned elsewhere
        let outcome = parse("SERVICE_KEY: visa_extension\nMaybe traffic_violations?");
        assert_eq!(outcome, service("traffic_violations"));
    }

    #[test]
    fn test_declined_key_with_no_other_signal() {
        assert_eq!(parse("SERVICE_KEY: none"), conversation(messages::how_can_i_help(Language::En)));
    }

    // --- step 3: unstructured scan ---

    #[test]
    fn test_scan_uses_catalog_order() {
        let outcome = parse("You need national_id_issue and then passport_renewal.");
        assert_eq!(
            outcome.service_keys(),
            vec!["passport_renewal", "national_id_issue"]
        );
    }

    #[test]
    fn test_scan_is_case_insensitive() {
        assert_eq!(parse("Try PASSPORT_RENEWAL"), service("passport_renewal"));
    }

    // --- step 4: conversation ---

    #[test]
    fn test_greeting_passes_through() {
        assert_eq!(
            parse("Hello! How can I help you today?"),
            conversation("Hello! How can I help you today?")
        );
    }

    #[test]
    fn test_arabic_greeting_passes_through() {
        let outcome = parse_reply("أهلاً وسهلاً! كيف أساعدك؟", &KEYS, Language::Ar);
        assert_eq!(outcome, conversation("أهلاً وسهلاً! كيف أساعدك؟"));
    }

    #[test]
    fn test_key_like_tokens_are_scrubbed() {
        let outcome = parse("I could not find [visa_extension] for you");
        assert_eq!(outcome, conversation("I could not find  for you"));
    }

    #[test]
    fn test_empty_reply_uses_canned_greeting() {
        assert_eq!(parse(""), conversation(messages::how_can_i_help(Language::En)));
        assert_eq!(
            parse_reply("   \n  ", &KEYS, Language::Ar),
            conversation(messages::how_can_i_help(Language::Ar))
        );
    }

    #[test]
    fn test_reply_of_only_unknown_keys_uses_canned_greeting() {
        assert_eq!(
            parse("SERVICE_KEY: visa_extension"),
            conversation(messages::how_can_i_help(Language::En))
        );
    }

    #[test]
    fn test_garbage_never_panics() {
        let inputs = [
            "SERVICE_KEY:",
            "SERVICE_KEY: ****",
            "SERVICE_KEY:\nSERVICE_KEY:\n",
            "\u{0}\u{1}\u{2}",
            "[[[[]]]]",
            "______",
            "SERVICE_KEY: (((",
            "ـــــ",
            "İİİ service_key: İ",
        ];
        for input in inputs {
            let outcome = parse(input);
            if let ClassificationOutcome::Conversation { message } = &outcome {
                assert!(!message.is_empty(), "empty message for {:?}", input);
            }
        }
    }

    #[test]
    fn test_multi_service_never_single() {
        for raw in [
            "SERVICE_KEY: passport_renewal",
            "SERVICE_KEY: passport_renewal\nSERVICE_KEY: passport renewal",
            "passport_renewal passport_renewal",
        ] {
            if let ClassificationOutcome::MultiService { keys } = parse(raw) {
                panic!("unexpected MultiService {:?} for {:?}", keys, raw);
            }
        }
    }
}
