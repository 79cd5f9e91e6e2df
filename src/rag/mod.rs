//! Retrieval-augmented question answering over plain-text documents
//!
//! - [`Chunker`] splits the corpus into fixed-length chunks
//! - [`VectorIndex`] stores one embedding per chunk and finds nearest neighbours
//! - [`ContextAssembler`] turns retrieved chunk ids into a context string
//! - [`PromptTemplate`] wraps context and question for the generator
//! - [`Evaluator`] measures latency and ROUGE against a reference
//! - [`RagSession`] drives the whole flow as a state machine
//!
//! # Examples
//!
//! ```rust,no_run
//! use docqa::config::AppConfig;
//! use docqa::ingest::load_documents;
//! use docqa::rag::RagSession;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let mut session = RagSession::from_config(&config)?;
//!
//!     session.index_documents(load_documents(&["notes.txt"])).await?;
//!     let answer = session.ask("What is covered in the notes?", None).await?;
//!     println!("Answer: {}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod chunker;
pub mod context;
pub mod evaluation;
pub mod index;
pub mod pipeline;
pub mod prompts;

pub use chunker::Chunker;
pub use context::ContextAssembler;
/// Maps retrieval results to context text
pub use context::ContextAssembler as Retriever;
pub use evaluation::Evaluator;
pub use index::VectorIndex;
pub use pipeline::IndexReport;
pub use pipeline::RagSession;
pub use pipeline::SessionState;
pub use prompts::PromptTemplate;
