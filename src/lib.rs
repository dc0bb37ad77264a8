#![warn(unreachable_pub)]
#![warn(dead_code)]

//! In-memory, typo-tolerant full-text search over a typed document schema.
//!
//! Declare a nested schema with text, number and boolean leaves, insert
//! documents that conform to it, and search with a free-text term (exact,
//! prefix or bounded edit distance) combined with structured filters over
//! the boolean and numeric fields. See [`SearchEngine`] for a usage example.

pub mod engine;
pub mod error;
mod index;
mod query;
mod queue;
mod schema;
mod store;
pub mod tokenize;
pub mod tracing;
pub mod types;

// Re-export common types
pub use engine::{EngineConfig, SearchEngine};
pub use error::{Result, SearchError};
pub use query::{SearchHit, SearchParams, SearchResult};
pub use tokenize::{DefaultTokenizer, Tokenizer};
pub use types::Language;
