//! Plain-text rendering of formatted outcomes for the terminal.

use std::fmt::Write;

use crate::formatter::{DisplayRecord, RenderedOutcome};
use crate::language::Language;

struct Labels {
    platform: &'static str,
    category: &'static str,
    steps: &'static str,
    requirements: &'static str,
    link: &'static str,
}

fn labels(lang: Language) -> Labels {
    match lang {
        Language::Ar => Labels {
            platform: "المنصة",
            category: "الفئة",
            steps: "الخطوات",
            requirements: "المتطلبات",
            link: "الرابط",
        },
        Language::En => Labels {
            platform: "Platform",
            category: "Category",
            steps: "Steps",
            requirements: "Requirements",
            link: "Link",
        },
    }
}

fn render_record(out: &mut String, record: &DisplayRecord, labels: &Labels) {
    let _ = writeln!(out, "{}", record.title);
    let _ = writeln!(
        out,
        "{}: {} | {}: {}",
        labels.platform, record.platform, labels.category, record.category
    );
    let _ = writeln!(out, "{}", record.description);
    // both headings print even over an empty list
    let _ = writeln!(out, "\n{}:", labels.steps);
    for (i, step) in record.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }
    let _ = writeln!(out, "\n{}:", labels.requirements);
    for req in &record.requirements {
        let _ = writeln!(out, "  • {}", req);
    }
    if let Some(link) = &record.official_link {
        let _ = writeln!(out, "\n{}: {}", labels.link, link);
    }
}

pub fn render_text(rendered: &RenderedOutcome, lang: Language) -> String {
    match rendered {
        RenderedOutcome::Message(message) => format!("{}\n", message),
        RenderedOutcome::Services(records) => {
            let labels = labels(lang);
            let mut out = String::new();
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    out.push_str("\n----------------------------------------\n\n");
                }
                render_record(&mut out, record, &labels);
            }
            out
        }
    }
}
