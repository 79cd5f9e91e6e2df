//! CLI command definitions and argument parsing

use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Ask questions about plain-text documents with retrieval-augmented generation")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: configured level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (default: docqa.toml, then config.example.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the index from documents and save it
    Index {
        /// Plain-text files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Index file (default: [index] path from configuration)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Answer a question from the saved index
    Ask {
        /// Question text
        question: String,
        /// Reference answer to score the generated answer against
        #[arg(short, long)]
        reference: Option<String>,
        /// Rating for the answer (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
        /// Print the answer record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the chunks nearest to a query without generating an answer
    Search {
        /// Query text
        query: String,
        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Index documents, then answer questions read from stdin
    Chat {
        /// Plain-text files to index
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show current configuration
    Config,
}
