//! The engine facade: construction, writes, searches.
//!
//! A [`SearchEngine`] is a cheap-to-clone handle over shared state. Writes
//! flow through the writer lane (see [`crate::queue`]); searches take the
//! read half of the state lock and run concurrently with the writer and with
//! each other.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::error::{Result, SearchError};
use crate::index::IndexSet;
use crate::query::{self, SearchParams, SearchResult};
use crate::queue::{self, EngineState, WriteOp};
use crate::schema::Schema;
use crate::store::DocumentStore;
use crate::tokenize::{DefaultTokenizer, Tokenizer};
use crate::types::{IdGenerator, Language, format_elapsed};

/// Engine construction options.
#[derive(Clone)]
pub struct EngineConfig {
    /// Schema declaration: nested objects with `"text"`, `"number"` or
    /// `"boolean"` leaves. Required; fixed for the engine's lifetime.
    pub schema: Value,
    /// Language used when a call does not override it.
    pub default_language: Language,
    /// Replacement for the built-in analysis pipeline.
    pub tokenizer: Option<Arc<dyn Tokenizer>>,
}

impl EngineConfig {
    /// Config with the given schema and every other option at its default.
    pub fn new(schema: Value) -> Self {
        Self {
            schema,
            default_language: Language::default(),
            tokenizer: None,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("schema", &self.schema)
            .field("default_language", &self.default_language)
            .field("custom_tokenizer", &self.tokenizer.is_some())
            .finish()
    }
}

struct Inner {
    schema: Arc<Schema>,
    state: Arc<RwLock<EngineState>>,
    writer: mpsc::Sender<WriteOp>,
    tokenizer: Arc<dyn Tokenizer>,
    default_language: Language,
    ids: IdGenerator,
}

/// An in-memory, typo-tolerant full-text search engine.
///
/// ```
/// use serde_json::json;
/// use sift::{EngineConfig, SearchEngine, SearchParams};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> sift::Result<()> {
/// let engine = SearchEngine::create(EngineConfig::new(json!({
///     "title": "text",
///     "year": "number",
/// })))?;
///
/// engine.insert(json!({ "title": "The Lyra Book", "year": 2022 }), None).await?;
/// engine.flush().await?;
///
/// let found = engine
///     .search(SearchParams { term: "lyra".into(), ..Default::default() }, None)
///     .await?;
/// assert_eq!(found.count, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchEngine").finish_non_exhaustive()
    }
}

impl SearchEngine {
    /// Build the indices from the schema and spawn the writer task.
    ///
    /// Must be called inside a tokio runtime. Dropping every handle closes
    /// the writer lane and ends the task.
    pub fn create(config: EngineConfig) -> Result<Self> {
        let schema = Arc::new(Schema::from_value(&config.schema)?);
        let indices = IndexSet::build(&schema);
        tracing::debug!(
            text_paths = indices.text_paths().len(),
            default_language = %config.default_language,
            "engine created"
        );
        let state = Arc::new(RwLock::new(EngineState {
            indices,
            store: DocumentStore::default(),
        }));
        let tokenizer: Arc<dyn Tokenizer> = config
            .tokenizer
            .unwrap_or_else(|| Arc::new(DefaultTokenizer));
        let writer = queue::spawn_writer(Arc::clone(&state), Arc::clone(&schema), Arc::clone(&tokenizer));
        Ok(Self {
            inner: Arc::new(Inner {
                schema,
                state,
                writer,
                tokenizer,
                default_language: config.default_language,
                ids: IdGenerator::new(),
            }),
        })
    }

    /// Validate a document, enqueue it for application and return its id.
    ///
    /// The id is returned once the item is accepted by the writer lane,
    /// before application completes; callers that need read-your-writes
    /// await [`Self::flush`] first.
    pub async fn insert(&self, doc: Value, language: Option<Language>) -> Result<String> {
        let language = language.unwrap_or(self.inner.default_language);
        self.inner.schema.validate_document(&doc)?;
        let id = self.inner.ids.next();
        self.inner
            .writer
            .send(WriteOp::Insert {
                id: id.clone(),
                doc,
                language,
            })
            .await
            .map_err(|_| SearchError::EngineClosed)?;
        Ok(id)
    }

    /// Remove a document and every posting derived from it.
    ///
    /// Runs on the writer lane and resolves once applied. Fails with
    /// [`SearchError::DocIdDoesNotExist`] when the id is not in the document
    /// table — including an id whose insert is still queued.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        if !self.inner.state.read().await.store.contains(id) {
            return Err(SearchError::DocIdDoesNotExist { id: id.to_string() });
        }
        let (ack, done) = oneshot::channel();
        self.inner
            .writer
            .send(WriteOp::Delete {
                id: id.to_string(),
                ack,
            })
            .await
            .map_err(|_| SearchError::EngineClosed)?;
        done.await.map_err(|_| SearchError::EngineClosed)?
    }

    /// Barrier: resolves once every write enqueued before it has applied.
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.inner
            .writer
            .send(WriteOp::Flush { ack })
            .await
            .map_err(|_| SearchError::EngineClosed)?;
        done.await.map_err(|_| SearchError::EngineClosed)
    }

    /// Run a search against a consistent snapshot of the indices.
    pub async fn search(
        &self,
        params: SearchParams,
        language: Option<Language>,
    ) -> Result<SearchResult> {
        let language = language.unwrap_or(self.inner.default_language);
        let start = Instant::now();
        let state = self.inner.state.read().await;
        let (count, hits) = query::execute(
            &state,
            &self.inner.schema,
            self.inner.tokenizer.as_ref(),
            &params,
            language,
        )?;
        let elapsed = format_elapsed(start.elapsed());
        tracing::debug!(
            term = %params.term,
            count,
            returned = hits.len(),
            elapsed = %elapsed,
            "search completed"
        );
        Ok(SearchResult {
            count,
            hits,
            elapsed,
        })
    }

    /// Number of applied documents.
    pub async fn len(&self) -> usize {
        self.inner.state.read().await.store.len()
    }

    /// True when no document has been applied (or all were deleted).
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
