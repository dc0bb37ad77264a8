//! Search parameters, `where` normalization and the query planner.
//!
//! The planner composes three sources of document ids with set algebra:
//! radix-tree candidates per (token, text path) pair, the boolean/numeric
//! filter set, and the set of ids already counted. Everything iterates in
//! deterministic order (tokens lexicographically, paths in schema order,
//! postings in ordinal order), so identical engine state yields identical
//! results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SearchError};
use crate::index::NumOperator;
use crate::queue::EngineState;
use crate::schema::{LeafKind, Schema, json_type_name};
use crate::tokenize::Tokenizer;
use crate::types::{DocOrd, Language};

/// Parameters of one search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Free-text term, tokenized with the query language.
    pub term: String,
    /// Text paths to match against; `None` means every text path.
    pub properties: Option<Vec<String>>,
    /// Maximum number of hits to return.
    pub limit: usize,
    /// Number of matching documents to skip before the first hit.
    pub offset: usize,
    /// Match tokens exactly instead of by prefix.
    pub exact: bool,
    /// Maximum Levenshtein distance between the term and a matched token.
    pub tolerance: usize,
    /// Structured filter over boolean and numeric fields.
    #[serde(rename = "where")]
    pub where_filter: Option<Value>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            term: String::new(),
            properties: None,
            limit: 10,
            offset: 0,
            exact: false,
            tolerance: 0,
            where_filter: None,
        }
    }
}

/// One matching document.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub document: Value,
}

/// Outcome of a search call.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Total number of distinct matching documents, independent of paging.
    pub count: usize,
    /// At most `limit` hits, in discovery order.
    pub hits: Vec<SearchHit>,
    /// Human-readable duration of the call.
    pub elapsed: String,
}

/// Normalized `where` clause: flat bags of typed lookups.
#[derive(Debug, Default)]
struct FilterBags {
    booleans: Vec<(String, bool)>,
    numerics: Vec<(String, NumOperator, f64)>,
}

impl FilterBags {
    fn is_empty(&self) -> bool {
        self.booleans.is_empty() && self.numerics.is_empty()
    }
}

/// Run a search against a consistent snapshot of the engine state.
pub(crate) fn execute(
    state: &EngineState,
    schema: &Schema,
    tokenizer: &dyn Tokenizer,
    params: &SearchParams,
    language: Language,
) -> Result<(usize, Vec<SearchHit>)> {
    let paths = resolve_properties(state, params)?;
    // `None` means unconstrained; a constrained filter that admits nothing
    // stays `Some(empty)` and empties every intersection below.
    let filter = match &params.where_filter {
        Some(value) => evaluate_filters(state, &normalize_filters(schema, value)?),
        None => None,
    };

    let tokens = tokenizer.tokenize(&params.term, language);

    let mut seen: BTreeSet<DocOrd> = BTreeSet::new();
    let mut hit_ords: Vec<DocOrd> = Vec::new();
    let mut count = 0usize;
    let mut to_skip = params.offset;

    for token in &tokens {
        for path in &paths {
            let Some(tree) = state.indices.text(path) else {
                continue;
            };
            let mut candidates: BTreeSet<DocOrd> = tree
                .find(token, params.exact, params.tolerance)
                .into_values()
                .flatten()
                .collect();
            if let Some(filter) = &filter {
                candidates = candidates.intersection(filter).copied().collect();
            }
            // Count every fresh id, even past the emit limit: `count` is the
            // true number of distinct matches, not the number streamed.
            for ord in candidates.difference(&seen).copied().collect::<Vec<_>>() {
                seen.insert(ord);
                count += 1;
                if to_skip > 0 {
                    to_skip -= 1;
                } else if hit_ords.len() < params.limit {
                    hit_ords.push(ord);
                }
            }
        }
    }

    let hits = hit_ords
        .into_iter()
        .filter_map(|ord| {
            state.store.get(ord).map(|stored| SearchHit {
                id: stored.id.clone(),
                document: stored.doc.clone(),
            })
        })
        .collect();
    Ok((count, hits))
}

/// Resolve the requested text paths against the schema's text leaves.
fn resolve_properties(state: &EngineState, params: &SearchParams) -> Result<Vec<String>> {
    let known = state.indices.text_paths();
    match &params.properties {
        None => Ok(known.to_vec()),
        Some(requested) => {
            for name in requested {
                if !known.contains(name) {
                    return Err(SearchError::InvalidProperty {
                        name: name.clone(),
                        known: known.to_vec(),
                    });
                }
            }
            Ok(requested.clone())
        }
    }
}

/// Normalize a `where` value into typed lookup bags.
///
/// The clause is an object paralleling the schema: bare booleans at boolean
/// leaves, single-operator objects at numeric leaves, nested objects at
/// internal nodes. Anything else is a malformed query.
fn normalize_filters(schema: &Schema, filter: &Value) -> Result<FilterBags> {
    let mut bags = FilterBags::default();
    collect_filters(schema, filter, &mut String::new(), &mut bags)?;
    Ok(bags)
}

fn collect_filters(
    schema: &Schema,
    filter: &Value,
    path: &mut String,
    bags: &mut FilterBags,
) -> Result<()> {
    match schema {
        Schema::Object(children) => {
            let Value::Object(fields) = filter else {
                return Err(SearchError::query_params(format!(
                    "filter at '{path}' must be an object, found {}",
                    json_type_name(filter)
                )));
            };
            for (name, value) in fields {
                let saved = path.len();
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(name);
                match children.iter().find(|(child_name, _)| child_name == name) {
                    None => {
                        return Err(SearchError::query_params(format!(
                            "unknown field '{path}' in where clause"
                        )));
                    }
                    Some((_, child)) => collect_filters(child, value, path, bags)?,
                }
                path.truncate(saved);
            }
            Ok(())
        }
        Schema::Leaf(LeafKind::Boolean) => {
            let Value::Bool(value) = filter else {
                return Err(SearchError::query_params(format!(
                    "boolean filter at '{path}' must be true or false, found {}",
                    json_type_name(filter)
                )));
            };
            bags.booleans.push((path.clone(), *value));
            Ok(())
        }
        Schema::Leaf(LeafKind::Number) => {
            let Value::Object(operators) = filter else {
                return Err(SearchError::query_params(format!(
                    "numeric filter at '{path}' must be an operator object, found {}",
                    json_type_name(filter)
                )));
            };
            if operators.len() != 1 {
                return Err(SearchError::query_params(format!(
                    "numeric filter at '{path}' must use exactly one comparison operator, found {}",
                    operators.len()
                )));
            }
            for (symbol, target) in operators {
                let Some(op) = NumOperator::parse(symbol) else {
                    return Err(SearchError::query_params(format!(
                        "unknown operator '{symbol}' at '{path}', allowed: {:?}",
                        NumOperator::SYMBOLS
                    )));
                };
                let Some(target) = target.as_f64() else {
                    return Err(SearchError::query_params(format!(
                        "operator '{symbol}' at '{path}' requires a number, found {}",
                        json_type_name(target)
                    )));
                };
                bags.numerics.push((path.clone(), op, target));
            }
            Ok(())
        }
        Schema::Leaf(LeafKind::Text) => Err(SearchError::query_params(format!(
            "text field '{path}' cannot appear in a where clause"
        ))),
    }
}

/// Evaluate the bags into the filter set.
///
/// Each bag contributes the union of its lookups; the filter set is the
/// intersection of the contributing bags. An empty bag contributes no
/// constraint (`None`), never the empty set.
fn evaluate_filters(state: &EngineState, bags: &FilterBags) -> Option<BTreeSet<DocOrd>> {
    if bags.is_empty() {
        return None;
    }
    let boolean_hits: Option<BTreeSet<DocOrd>> = if bags.booleans.is_empty() {
        None
    } else {
        Some(
            bags.booleans
                .iter()
                .filter_map(|(path, value)| state.indices.boolean_postings(path, *value))
                .flatten()
                .copied()
                .collect(),
        )
    };
    let numeric_hits: Option<BTreeSet<DocOrd>> = if bags.numerics.is_empty() {
        None
    } else {
        Some(
            bags.numerics
                .iter()
                .filter_map(|(path, op, target)| {
                    state.indices.numeric(path).map(|index| index.query(*op, *target))
                })
                .flatten()
                .collect(),
        )
    };
    match (boolean_hits, numeric_hits) {
        (Some(b), Some(n)) => Some(b.intersection(&n).copied().collect()),
        (Some(b), None) => Some(b),
        (None, Some(n)) => Some(n),
        (None, None) => None,
    }
}
