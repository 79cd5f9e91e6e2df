//! Retrieval-augmented question answering over plain-text documents
//!
//! Documents are joined into one corpus, split into fixed-length chunks,
//! embedded, and stored in an exact vector index. A question is embedded,
//! its nearest chunks become the context of a prompt, and a generator writes
//! the answer. Answers can be scored with ROUGE against a reference.

pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod ingest;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;


pub use config::AppConfig;
pub use errors::*;
pub use rag::RagSession;
