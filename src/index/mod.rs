//! Per-field indices built from the schema.
//!
//! A depth-first walk of the schema creates one index per leaf, keyed by the
//! leaf's flat path: a radix tree for text, an ordered value map for numbers,
//! a true/false posting pair for booleans. Whole documents are indexed and
//! un-indexed here; the writer task is the only caller of the mutating half.

mod boolean;
mod numeric;
mod radix;

pub(crate) use numeric::{NumKey, NumOperator, NumericIndex};
pub(crate) use radix::RadixTree;

use ahash::AHashMap;
use serde_json::Value;

use crate::schema::{LeafKind, LeafValue, Schema};
use crate::tokenize::Tokenizer;
use crate::types::{DocOrd, Language};

use boolean::BooleanIndex;

/// Coordinates of a posting the text index failed to give back on removal.
#[derive(Debug)]
pub(crate) struct RemovalFailure {
    pub(crate) path: String,
    pub(crate) token: String,
}

/// All indices of an engine, one per schema leaf.
#[derive(Debug)]
pub(crate) struct IndexSet {
    text: AHashMap<String, RadixTree>,
    numeric: AHashMap<String, NumericIndex>,
    boolean: AHashMap<String, BooleanIndex>,
    /// Text paths in schema declaration order, for deterministic iteration.
    text_paths: Vec<String>,
}

impl IndexSet {
    /// Create an empty index per schema leaf.
    pub(crate) fn build(schema: &Schema) -> Self {
        let mut set = Self {
            text: AHashMap::new(),
            numeric: AHashMap::new(),
            boolean: AHashMap::new(),
            text_paths: Vec::new(),
        };
        for (path, kind) in schema.leaves() {
            match kind {
                LeafKind::Text => {
                    set.text_paths.push(path.clone());
                    set.text.insert(path, RadixTree::new());
                }
                LeafKind::Number => {
                    set.numeric.insert(path, NumericIndex::default());
                }
                LeafKind::Boolean => {
                    set.boolean.insert(path, BooleanIndex::default());
                }
            }
        }
        set
    }

    pub(crate) fn text_paths(&self) -> &[String] {
        &self.text_paths
    }

    pub(crate) fn text(&self, path: &str) -> Option<&RadixTree> {
        self.text.get(path)
    }

    pub(crate) fn numeric(&self, path: &str) -> Option<&NumericIndex> {
        self.numeric.get(path)
    }

    pub(crate) fn boolean_postings(&self, path: &str, value: bool) -> Option<&std::collections::BTreeSet<DocOrd>> {
        self.boolean.get(path).map(|index| index.query(value))
    }

    /// Index every leaf present in a validated document.
    pub(crate) fn insert_document(
        &mut self,
        schema: &Schema,
        doc: &Value,
        ord: DocOrd,
        tokenizer: &dyn Tokenizer,
        language: Language,
    ) {
        let text = &mut self.text;
        let numeric = &mut self.numeric;
        let boolean = &mut self.boolean;
        schema.walk_document(doc, &mut |path, leaf| match leaf {
            LeafValue::Text(value) => {
                if let Some(tree) = text.get_mut(path) {
                    for token in tokenizer.tokenize(value, language) {
                        tree.insert(&token, ord);
                    }
                }
            }
            LeafValue::Number(value) => {
                // Validation already rejected non-finite values.
                if let (Some(index), Some(key)) = (numeric.get_mut(path), NumKey::new(value)) {
                    index.insert(key, ord);
                }
            }
            LeafValue::Boolean(value) => {
                if let Some(index) = boolean.get_mut(path) {
                    index.insert(value, ord);
                }
            }
        });
    }

    /// Remove every posting a validated document produced.
    ///
    /// The text leaves are re-tokenized with the same language the document
    /// was inserted with, so the token set matches what was indexed. A text
    /// posting the radix tree does not hold is reported as a failure; the
    /// walk still completes so the remaining postings are cleaned up.
    pub(crate) fn remove_document(
        &mut self,
        schema: &Schema,
        doc: &Value,
        ord: DocOrd,
        tokenizer: &dyn Tokenizer,
        language: Language,
    ) -> Result<(), RemovalFailure> {
        let text = &mut self.text;
        let numeric = &mut self.numeric;
        let boolean = &mut self.boolean;
        let mut failure = None;
        schema.walk_document(doc, &mut |path, leaf| match leaf {
            LeafValue::Text(value) => {
                if let Some(tree) = text.get_mut(path) {
                    for token in tokenizer.tokenize(value, language) {
                        if !tree.remove(&token, ord) && failure.is_none() {
                            failure = Some(RemovalFailure {
                                path: path.to_string(),
                                token,
                            });
                        }
                    }
                }
            }
            LeafValue::Number(value) => {
                if let (Some(index), Some(key)) = (numeric.get_mut(path), NumKey::new(value)) {
                    index.remove(key, ord);
                }
            }
            LeafValue::Boolean(value) => {
                if let Some(index) = boolean.get_mut(path) {
                    index.remove(value, ord);
                }
            }
        });
        match failure {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }
}
