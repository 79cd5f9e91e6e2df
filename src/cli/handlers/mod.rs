//! CLI command handlers module
//!
//! This module is organized by command:
//! - index: Build and save the index
//! - ask: One-shot questions and nearest-chunk search over a saved index
//! - chat: Interactive session over freshly indexed documents
//! - info: Information display (config)

pub mod ask;
pub mod chat;
pub mod index;
pub mod info;

// Re-export all public handlers
pub use ask::*;
pub use chat::*;
pub use index::*;
pub use info::*;
