//! Interactive question loop over one session

use std::path::PathBuf;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::debug;

use crate::cli::output::print_answer;
use crate::cli::output::print_error;
use crate::cli::output::print_index_report;
use crate::cli::output::print_info;
use crate::cli::output::print_prompt;
use crate::cli::output::print_scores;
use crate::cli::output::print_success;
use crate::errors::Result;
use crate::ingest::load_documents;
use crate::rag::RagSession;
use crate::AppConfig;

/// One line of chat input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Question(String),
    /// `:rate N`
    Rate(u8),
    /// `:ref TEXT`
    Reference(String),
    /// `:quit` or `:q`
    Quit,
    Empty,
    Invalid(String),
}

/// Classify a line typed at the chat prompt
#[must_use]
pub fn parse_chat_line(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix(':') else {
        return ChatInput::Question(line.to_string());
    };

    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "q" | "quit" => ChatInput::Quit,
        "rate" => argument.parse::<u8>().map_or_else(
            |_| ChatInput::Invalid(format!("not a rating: {argument:?}")),
            ChatInput::Rate,
        ),
        "ref" if !argument.is_empty() => ChatInput::Reference(argument.to_string()),
        "ref" => ChatInput::Invalid("usage: :ref TEXT".to_string()),
        other => ChatInput::Invalid(format!("unknown command :{other}")),
    }
}

/// Index `files`, then answer questions from stdin until EOF or `:quit`
pub async fn handle_chat_command(config: &AppConfig, files: &[PathBuf], verbose: bool) -> Result<()> {
    let mut session = RagSession::from_config(config)?;
    let report = session.index_documents(load_documents(files)).await?;
    print_index_report(&report);

    print_info("Ask a question, or use :ref TEXT, :rate N (1-5), :quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print_prompt("\n❓ ")?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_chat_line(&line) {
            ChatInput::Empty => {}
            ChatInput::Quit => break,
            ChatInput::Question(question) => match session.ask(&question, None).await {
                Ok(answer) => print_answer(&answer, verbose),
                Err(e) => print_error(&e.to_string()),
            },
            ChatInput::Reference(reference) => match session.evaluate_last(&reference) {
                Ok(scores) => print_scores(&scores),
                Err(e) => print_error(&e.to_string()),
            },
            ChatInput::Rate(rating) => match session.rate_last(rating) {
                Ok(()) => print_success(&format!("Rated last answer {rating}/5")),
                Err(e) => print_error(&e.to_string()),
            },
            ChatInput::Invalid(message) => print_error(&message),
        }
    }

    debug!("Chat session {} finished", session.id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_line() {
        assert_eq!(parse_chat_line("   "), ChatInput::Empty);
        assert_eq!(
            parse_chat_line(" What is Rust? "),
            ChatInput::Question("What is Rust?".to_string())
        );
        assert_eq!(parse_chat_line(":rate 4"), ChatInput::Rate(4));
        assert_eq!(
            parse_chat_line(":ref  The answer is 42."),
            ChatInput::Reference("The answer is 42.".to_string())
        );
        assert_eq!(parse_chat_line(":q"), ChatInput::Quit);
        assert_eq!(parse_chat_line(":quit"), ChatInput::Quit);
    }

    #[test]
    fn test_parse_chat_line_invalid() {
        assert!(matches!(parse_chat_line(":rate x"), ChatInput::Invalid(_)));
        assert!(matches!(parse_chat_line(":ref"), ChatInput::Invalid(_)));
        assert!(matches!(parse_chat_line(":help"), ChatInput::Invalid(_)));
    }
}
