//! Canned, user-safe replies in both languages.

use crate::language::Language;

pub fn not_available(lang: Language) -> &'static str {
    lang.pick(
        "عذراً، هذه الخدمة غير متوفرة حالياً.",
        "Sorry, this service is not available.",
    )
}

pub fn how_can_i_help(lang: Language) -> &'static str {
    lang.pick("كيف يمكنني مساعدتك؟", "How can I help you?")
}

/// Opening line of a chat session.
pub fn welcome_title(lang: Language) -> &'static str {
    lang.pick("كيف يمكنني مساعدتك؟", "How can I help you today?")
}

pub fn welcome_subtitle(lang: Language) -> &'static str {
    lang.pick(
        "اسألني عن أي خدمة حكومية سعودية",
        "Ask me about any Saudi government service",
    )
}

pub fn timed_out(lang: Language) -> &'static str {
    lang.pick(
        "انتهت المهلة، حاول مرة أخرى.",
        "Request timed out. Please try again.",
    )
}

pub fn unexpected_error(lang: Language) -> &'static str {
    lang.pick("حدث خطأ، حاول مرة أخرى.", "An error occurred. Please try again.")
}

/// Title shown in place of a service that vanished from the catalog.
pub fn service_unavailable_title(lang: Language) -> &'static str {
    lang.pick("الخدمة غير متوفرة", "Service unavailable")
}
