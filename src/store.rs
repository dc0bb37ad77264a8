//! Document table: public id ↔ internal ordinal, plus the stored documents.
//!
//! Ordinals are dense slot indices assigned in application order and never
//! reused; a deleted document leaves an empty slot behind. Posting sets hold
//! ordinals, so iterating them in order yields insertion-observed order.

use ahash::AHashMap;
use serde_json::Value;

use crate::types::{DocOrd, Language};

/// A stored document with its public id and insert-time language.
#[derive(Debug, Clone)]
pub(crate) struct StoredDoc {
    pub(crate) id: String,
    pub(crate) doc: Value,
    pub(crate) language: Language,
}

#[derive(Debug, Default)]
pub(crate) struct DocumentStore {
    by_id: AHashMap<String, DocOrd>,
    slots: Vec<Option<StoredDoc>>,
    live: usize,
}

impl DocumentStore {
    /// Store a document under the next ordinal.
    pub(crate) fn insert(&mut self, id: String, doc: Value, language: Language) -> DocOrd {
        let ord = DocOrd(self.slots.len() as u32);
        self.by_id.insert(id.clone(), ord);
        self.slots.push(Some(StoredDoc { id, doc, language }));
        self.live += 1;
        ord
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub(crate) fn get(&self, ord: DocOrd) -> Option<&StoredDoc> {
        self.slots.get(ord.0 as usize).and_then(Option::as_ref)
    }

    /// Drop a document, returning its ordinal and contents for un-indexing.
    pub(crate) fn remove(&mut self, id: &str) -> Option<(DocOrd, StoredDoc)> {
        let ord = self.by_id.remove(id)?;
        let stored = self.slots.get_mut(ord.0 as usize)?.take()?;
        self.live -= 1;
        Some((ord, stored))
    }

    /// Number of live documents.
    pub(crate) fn len(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use serde_json::json;

    #[test]
    fn ordinals_follow_insertion_order() {
        let mut store = DocumentStore::default();
        let a = store.insert("a".into(), json!({"n": 1}), Language::English);
        let b = store.insert("b".into(), json!({"n": 2}), Language::English);
        check!(a < b);
        check!(store.get(a).unwrap().id == "a");
        check!(store.get(b).unwrap().id == "b");
        check!(store.len() == 2);
    }

    #[test]
    fn removal_leaves_a_hole_and_never_reuses_ordinals() {
        let mut store = DocumentStore::default();
        let a = store.insert("a".into(), json!({}), Language::English);
        let (removed_ord, stored) = store.remove("a").unwrap();
        check!(removed_ord == a);
        check!(stored.id == "a");
        check!(store.get(a).is_none());
        check!(!store.contains("a"));
        check!(store.len() == 0);

        let b = store.insert("b".into(), json!({}), Language::English);
        check!(b != a);
    }

    #[test]
    fn removing_unknown_id_is_none() {
        let mut store = DocumentStore::default();
        check!(store.remove("ghost").is_none());
    }
}
