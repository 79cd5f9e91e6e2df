//! Question answering and search handlers over a saved index

use std::path::Path;

use crate::cli::output::print_answer;
use crate::cli::output::print_info;
use crate::cli::output::print_sources;
use crate::cli::output::print_warning;
use crate::errors::Result;
use crate::rag::RagSession;
use crate::AppConfig;

/// Options for a one-shot question
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub reference: Option<String>,
    pub rating: Option<u8>,
    pub top_k: Option<usize>,
    pub json: bool,
    pub verbose: bool,
}

/// Open a session over the configured saved index
///
/// # Errors
/// - Service configuration errors
/// - Index read or format errors
pub fn open_saved_session(config: &AppConfig) -> Result<RagSession> {
    let mut session = RagSession::from_config(config)?;
    session.load_index(Path::new(config.index_path()))?;
    Ok(session)
}

/// Answer a question against the saved index
pub async fn handle_ask_command(
    config: &AppConfig,
    question: &str,
    options: AskOptions,
) -> Result<()> {
    let mut session = open_saved_session(config)?;
    if let Some(top_k) = options.top_k {
        session.set_top_k(top_k);
    }

    if !options.json {
        print_info(&format!("🤖 Question: \"{question}\""));
    }

    let mut answer = session
        .ask(question, options.reference.as_deref())
        .await?;
    if let Some(rating) = options.rating {
        session.rate_last(rating)?;
        answer.rating = Some(rating);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_answer(&answer, options.verbose);
    }
    Ok(())
}

/// List the chunks nearest to `query`
pub async fn handle_search_command(
    config: &AppConfig,
    query: &str,
    top_k: Option<usize>,
) -> Result<()> {
    let session = open_saved_session(config)?;
    let k = top_k.unwrap_or_else(|| config.top_k());

    print_info(&format!("🔍 Searching for: \"{query}\""));
    let result = session.search(query, k).await?;
    if result.is_empty() {
        print_warning("No matching chunks");
        return Ok(());
    }

    print_sources(&session.describe(&result));
    Ok(())
}
