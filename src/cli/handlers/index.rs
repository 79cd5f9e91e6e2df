//! Index building handler

use std::path::Path;
use std::path::PathBuf;

use tracing::info;

use crate::cli::output::print_index_report;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::errors::Result;
use crate::ingest::load_documents;
use crate::rag::RagSession;
use crate::AppConfig;

/// Index `files` and save the index plus chunk sidecar
pub async fn handle_index_command(
    config: &AppConfig,
    files: &[PathBuf],
    output: Option<&Path>,
) -> Result<()> {
    let output = output.unwrap_or_else(|| Path::new(config.index_path()));
    print_info(&format!("Indexing {} documents...", files.len()));

    let mut session = RagSession::from_config(config)?;
    let report = session.index_documents(load_documents(files)).await?;
    print_index_report(&report);

    if report.chunks == 0 {
        print_warning("No text was extracted; the saved index is empty");
    }

    session.save_index(output)?;
    info!("Index written to {}", output.display());
    print_success(&format!("Index saved to {}", output.display()));
    Ok(())
}
