//! Centralized error handling with typed error enums.
//!
//! Every failure the engine can surface is a [`SearchError`] variant carrying
//! the data a caller needs to react programmatically. All validation happens
//! synchronously at the entry call; writer-side failures are fatal to the
//! item and are logged, never swallowed.

use thiserror::Error;

/// A specialized Result type for engine operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Primary error type for all engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The requested language is not in the supported set.
    #[error("language '{language}' is not supported")]
    LanguageNotSupported { language: String },

    /// The schema declaration contained a value that is neither a nested
    /// object nor one of the known leaf types.
    #[error("invalid schema type: expected 'text', 'number', 'boolean' or a nested object, found {found}")]
    InvalidSchemaType { found: String },

    /// An inserted document does not conform to the schema.
    #[error("document does not match schema: {reason}")]
    InvalidDocSchema { reason: String },

    /// A search referenced a text field the schema does not declare.
    #[error("invalid property '{name}', known text properties: {known:?}")]
    InvalidProperty { name: String, known: Vec<String> },

    /// A `where` filter was malformed.
    #[error("invalid query parameters: {reason}")]
    InvalidQueryParams { reason: String },

    /// A delete targeted an id the document table does not hold.
    #[error("document id '{id}' does not exist")]
    DocIdDoesNotExist { id: String },

    /// The radix tree failed to remove a posting the document was indexed
    /// under. Fatal: the indices and document table would disagree.
    #[error("failed to remove document '{id}' from index '{path}' (token '{token}')")]
    IndexRemovalFailure {
        id: String,
        path: String,
        token: String,
    },

    /// A write was submitted after the writer task ended.
    #[error("engine is closed, writer task is no longer running")]
    EngineClosed,
}

impl SearchError {
    /// Shorthand for [`SearchError::InvalidDocSchema`].
    pub(crate) fn doc_schema(reason: impl Into<String>) -> Self {
        Self::InvalidDocSchema {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`SearchError::InvalidQueryParams`].
    pub(crate) fn query_params(reason: impl Into<String>) -> Self {
        Self::InvalidQueryParams {
            reason: reason.into(),
        }
    }
}
