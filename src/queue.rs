//! The writer lane: a bounded channel drained by a dedicated task.
//!
//! All index and document-table mutation happens on this task, one item at a
//! time, so acceptance order equals application order and the indices never
//! see two writers. Readers share the state through the read half of the
//! lock and run concurrently with the writer.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::error::{Result, SearchError};
use crate::index::IndexSet;
use crate::schema::Schema;
use crate::store::DocumentStore;
use crate::tokenize::Tokenizer;
use crate::types::Language;

/// Queue capacity before `insert` backpressures.
const QUEUE_CAPACITY: usize = 1024;

/// Mutable engine state. The writer task is the only mutating holder.
#[derive(Debug)]
pub(crate) struct EngineState {
    pub(crate) indices: IndexSet,
    pub(crate) store: DocumentStore,
}

/// One unit of work for the writer task.
pub(crate) enum WriteOp {
    /// Apply a validated document. Failures are fatal to the item.
    Insert {
        id: String,
        doc: Value,
        language: Language,
    },
    /// Un-index and drop a document; the caller awaits the outcome.
    Delete {
        id: String,
        ack: oneshot::Sender<Result<bool>>,
    },
    /// Barrier: acknowledged once everything enqueued before it applied.
    Flush { ack: oneshot::Sender<()> },
}

/// Spawn the writer task. The task ends when every sender is dropped.
///
/// Must be called inside a tokio runtime.
pub(crate) fn spawn_writer(
    state: Arc<RwLock<EngineState>>,
    schema: Arc<Schema>,
    tokenizer: Arc<dyn Tokenizer>,
) -> mpsc::Sender<WriteOp> {
    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            match op {
                WriteOp::Insert { id, doc, language } => {
                    apply_insert(&state, &schema, tokenizer.as_ref(), id, doc, language).await;
                }
                WriteOp::Delete { id, ack } => {
                    let result = apply_delete(&state, &schema, tokenizer.as_ref(), &id).await;
                    let _ = ack.send(result);
                }
                WriteOp::Flush { ack } => {
                    let _ = ack.send(());
                }
            }
        }
        tracing::debug!("writer task stopped");
    });
    tx
}

async fn apply_insert(
    state: &RwLock<EngineState>,
    schema: &Schema,
    tokenizer: &dyn Tokenizer,
    id: String,
    doc: Value,
    language: Language,
) {
    let mut guard = state.write().await;
    let state = &mut *guard;
    let ord = state.store.insert(id.clone(), doc, language);
    if let Some(stored) = state.store.get(ord) {
        state
            .indices
            .insert_document(schema, &stored.doc, ord, tokenizer, language);
        tracing::debug!(doc_id = %id, ord = ord.0, "document applied");
    }
}

async fn apply_delete(
    state: &RwLock<EngineState>,
    schema: &Schema,
    tokenizer: &dyn Tokenizer,
    id: &str,
) -> Result<bool> {
    let mut guard = state.write().await;
    let state = &mut *guard;
    let Some((ord, stored)) = state.store.remove(id) else {
        // The synchronous check passed but the document is gone, e.g. a
        // concurrent delete of the same id won the lane.
        return Ok(false);
    };
    let result = state
        .indices
        .remove_document(schema, &stored.doc, ord, tokenizer, stored.language)
        .map(|()| true)
        .map_err(|failure| SearchError::IndexRemovalFailure {
            id: id.to_string(),
            path: failure.path,
            token: failure.token,
        });
    match &result {
        Ok(_) => tracing::debug!(doc_id = %id, ord = ord.0, "document deleted"),
        Err(err) => tracing::error!(doc_id = %id, error = %err, "delete failed"),
    }
    result
}
