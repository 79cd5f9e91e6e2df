//! Plain-text document loading
//!
//! Each file is read independently. A file that cannot be read, is not UTF-8,
//! or holds no text becomes a [`DocumentFailure`] and never stops the others.

use std::path::Path;

use tracing::debug;
use tracing::warn;

use crate::errors::DocQaError;
use crate::errors::Result;
use crate::models::Document;
use crate::models::DocumentFailure;
use crate::models::ExtractedDocument;

/// Load every path, one result per path in input order
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Vec<ExtractedDocument> {
    paths.iter().map(|p| load_document(p.as_ref())).collect()
}

/// Load a single plain-text file
pub fn load_document(path: &Path) -> ExtractedDocument {
    let source = path.display().to_string();

    match extract_text(path, &source) {
        Ok(text) => {
            debug!("Extracted {} characters from {}", text.chars().count(), source);
            Ok(Document::new(source, text))
        }
        Err(e) => {
            warn!("{}", e);
            let message = match e {
                DocQaError::Extraction { message, .. } => message,
                other => other.to_string(),
            };
            Err(DocumentFailure { source, message })
        }
    }
}

fn extract_text(path: &Path, source: &str) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| DocQaError::Extraction {
        source_name: source.to_string(),
        message: e.to_string(),
    })?;

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(DocQaError::Extraction {
            source_name: source.to_string(),
            message: "document contains no text".to_string(),
        });
    }
    Ok(text)
}

/// Trim every line, drop blank ones, and join the rest with single spaces
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
