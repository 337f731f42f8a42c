// Interactive terminal chat over stdin/stdout.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::language::Language;
use crate::messages;
use crate::navigator::Navigator;
use crate::render::render_text;
use crate::session::{ChatSession, ChatTurn};

#[derive(Debug, PartialEq)]
enum ChatCommand {
    Ask(String),
    SetLanguage(Language),
    History,
    Clear,
    Quit,
    Help,
    Invalid(String),
    Empty,
}

fn parse_command(line: &str) -> ChatCommand {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit") | Some("exit"), _) => ChatCommand::Quit,
        (Some("history"), _) => ChatCommand::History,
        (Some("clear"), _) => ChatCommand::Clear,
        (Some("help"), _) => ChatCommand::Help,
        (Some("lang"), Some(code)) => match code.parse() {
            Ok(lang) => ChatCommand::SetLanguage(lang),
            Err(e) => ChatCommand::Invalid(e),
        },
        (Some("lang"), None) => ChatCommand::Invalid("usage: /lang ar|en".to_string()),
        _ => ChatCommand::Invalid(format!("unknown command '{}', try /help", line)),
    }
}

const HELP: &str = "Type a question about a government service.\n\
/lang ar|en  re-render the conversation in Arabic or English\n\
/history     show the conversation so far\n\
/clear       forget the conversation\n\
/quit        leave";

/// Arabic first, then English.
fn welcome_banner() -> String {
    [Language::Ar, Language::En]
        .iter()
        .map(|&lang| {
            format!(
                "{}\n{}\n",
                messages::welcome_title(lang),
                messages::welcome_subtitle(lang)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_session(session: &ChatSession, navigator: &Navigator, lang: Option<Language>) -> String {
    let rendered = session.render_history(navigator, lang);
    let mut out = String::new();
    let mut answers = rendered.into_iter().peekable();
    for (i, turn) in session.turns.iter().enumerate() {
        match turn {
            ChatTurn::User { text, timestamp, .. } => {
                out.push_str(&format!("[{}] > {}\n", timestamp, text));
            }
            ChatTurn::Assistant { language, .. } => {
                if let Some((_, answer)) = answers.next_if(|(idx, _)| *idx == i) {
                    out.push_str(&render_text(&answer, lang.unwrap_or(*language)));
                    out.push('\n');
                }
            }
        }
    }
    out
}

pub async fn run_chat(navigator: &Navigator) -> Result<()> {
    info!("Starting interactive chat session...");
    let mut session = ChatSession::new();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(format!("{}\n{}\n\n", welcome_banner(), HELP).as_bytes())
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };

        let output = match parse_command(&line) {
            ChatCommand::Empty => continue,
            ChatCommand::Quit => break,
            ChatCommand::Help => format!("{}\n", HELP),
            ChatCommand::Invalid(message) => format!("{}\n", message),
            ChatCommand::Clear => {
                session.clear();
                "Conversation cleared.\n".to_string()
            }
            ChatCommand::History => render_session(&session, navigator, None),
            ChatCommand::SetLanguage(lang) => render_session(&session, navigator, Some(lang)),
            ChatCommand::Ask(query) => {
                let lang = session.submit(navigator, &query).await;
                match session.last_outcome() {
                    Some(outcome) => render_text(&navigator.format_for(outcome, lang), lang),
                    None => String::new(),
                }
            }
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    info!(session = %session.id, turns = session.turns.len(), "Chat session finished.");
    Ok(())
}
