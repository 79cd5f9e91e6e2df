//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `docqa` CLI

use crate::models::Answer;
use crate::models::AnswerSource;
use crate::models::ScoreReport;
use crate::rag::IndexReport;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// This prevents panics when truncating strings with multi-byte UTF-8 characters (emojis, etc.)
///
/// # Arguments
/// * `s` - The string to truncate
/// * `max_chars` - Maximum number of characters (not bytes)
///
/// # Returns
/// Truncated string with "..." suffix if truncated, otherwise the original string
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Print the outcome of an indexing run
pub fn print_index_report(report: &IndexReport) {
    println!(
        "📚 Indexed {} documents into {} chunks ({:.2}s)",
        report.documents,
        report.chunks,
        report.elapsed.as_secs_f64()
    );
    if let Some(dimension) = report.dimension {
        println!("   Vector dimension: {dimension}");
    }
    for failure in &report.failures {
        print_warning(&format!(
            "Skipped {}: {}",
            failure.source, failure.message
        ));
    }
}

/// Print a generated answer
pub fn print_answer(answer: &Answer, verbose: bool) {
    println!("\n{}", "═".repeat(80));
    println!("📝 Answer:\n");
    println!("{}", answer.text);
    println!("\n{}", "═".repeat(80));
    println!(
        "⏱️  Generated in {:.2}s ({:.2}s end to end)",
        answer.elapsed.as_secs_f64(),
        answer.total_elapsed.as_secs_f64()
    );

    if let Some(scores) = &answer.scores {
        print_scores(scores);
    }
    if let Some(rating) = answer.rating {
        println!("⭐ Rating: {rating}/5");
    }

    if verbose {
        print_sources(&answer.sources);
    } else {
        println!("\n💡 Use --verbose to see source chunks");
    }
}

/// Print ROUGE scores
pub fn print_scores(scores: &ScoreReport) {
    println!("📊 Scores:");
    for (name, score) in [("ROUGE-1", &scores.rouge1), ("ROUGE-L", &scores.rouge_l)] {
        println!(
            "  {name}: P {:.3} | R {:.3} | F {:.3}",
            score.precision, score.recall, score.fmeasure
        );
    }
}

/// Print retrieved chunks, best match first
pub fn print_sources(sources: &[AnswerSource]) {
    println!("\n📚 Sources ({} chunks):", sources.len());
    for (rank, source) in sources.iter().enumerate() {
        let documents = if source.documents.is_empty() {
            "N/A".to_string()
        } else {
            source.documents.join(", ")
        };
        println!(
            "  {}. Chunk {} | Distance: {:.4} | {} | \"{}\"",
            rank + 1,
            source.chunk,
            source.distance,
            documents,
            source.preview
        );
    }
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 docqa Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.directory);
    println!("  File output: {}", config.logging.file_output);
    println!();

    println!("✂️  Chunking:");
    println!("  Chunk length: {} characters", config.chunk_length());
    println!();

    println!("🔍 Retrieval:");
    println!("  Top k: {}", config.top_k());
    println!("  Separator: {:?}", config.retrieval.separator);
    println!();

    println!("💭 Generation:");
    println!("  Max answer length: {}", config.max_answer_length());
    println!("  Timeout: {}s", config.generation_timeout_secs());
    println!();

    println!("🧠 Embeddings:");
    println!("  Provider: {:?}", config.embeddings.provider);
    println!("  Endpoint: {}", config.embeddings.endpoint);
    println!("  Model: {}", config.embeddings.model);
    println!("  Key: {}", mask_key(config.embeddings.api_key.as_deref()));
    if let Some(dimension) = config.embeddings.dimension {
        println!("  Dimension: {dimension}");
    }
    println!();

    println!("🤖 LLM:");
    println!("  Provider: {:?}", config.llm.provider);
    println!("  Endpoint: {}", config.llm.endpoint);
    println!("  Model: {}", config.llm.model);
    println!("  Key: {}", mask_key(config.llm.api_key.as_deref()));
    println!();

    println!("💾 Index:");
    println!("  Path: {}", config.index_path());
}

/// Mask an API key for display
fn mask_key(key: Option<&str>) -> String {
    match key {
        None => "not set".to_string(),
        Some(key) if key.chars().count() <= 8 => "***masked***".to_string(),
        Some(key) => {
            let prefix: String = key.chars().take(4).collect();
            format!("{prefix}***")
        }
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

/// Print a prompt without a trailing newline
///
/// # Errors
/// - Stdout flush errors
pub fn print_prompt(msg: &str) -> std::io::Result<()> {
    print!("{msg}");
    std::io::Write::flush(&mut std::io::stdout())
}
