//! Ordered map from numeric value to posting set, one per numeric leaf.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound::{Excluded, Included, Unbounded};

use crate::types::DocOrd;

/// Comparison operator of a numeric `where` lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumOperator {
    Lt,
    Lte,
    Eq,
    Gt,
    Gte,
}

impl NumOperator {
    /// The symbols accepted in a `where` object.
    pub(crate) const SYMBOLS: &'static [&'static str] = &["<", "<=", "=", ">", ">="];

    pub(crate) fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            "=" => Some(Self::Eq),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            _ => None,
        }
    }
}

/// Total-order key over finite f64 values.
///
/// Construction rejects non-finite values; negative zero normalizes to zero
/// so `= 0` matches documents inserted with `-0.0`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NumKey(f64);

impl NumKey {
    pub(crate) fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Self(if value == 0.0 { 0.0 } else { value }))
    }
}

impl PartialEq for NumKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for NumKey {}

impl PartialOrd for NumKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Posting sets keyed by numeric value for one flat path.
#[derive(Debug, Default)]
pub(crate) struct NumericIndex {
    values: BTreeMap<NumKey, BTreeSet<DocOrd>>,
}

impl NumericIndex {
    pub(crate) fn insert(&mut self, key: NumKey, ord: DocOrd) {
        self.values.entry(key).or_default().insert(ord);
    }

    /// Remove a posting; empty value entries are dropped.
    pub(crate) fn remove(&mut self, key: NumKey, ord: DocOrd) -> bool {
        let Some(postings) = self.values.get_mut(&key) else {
            return false;
        };
        let removed = postings.remove(&ord);
        if postings.is_empty() {
            self.values.remove(&key);
        }
        removed
    }

    /// Union of the posting sets of every value satisfying `op target`.
    pub(crate) fn query(&self, op: NumOperator, target: f64) -> BTreeSet<DocOrd> {
        let Some(key) = NumKey::new(target) else {
            return BTreeSet::new();
        };
        let range = match op {
            NumOperator::Eq => {
                return self.values.get(&key).cloned().unwrap_or_default();
            }
            NumOperator::Lt => (Unbounded, Excluded(key)),
            NumOperator::Lte => (Unbounded, Included(key)),
            NumOperator::Gt => (Excluded(key), Unbounded),
            NumOperator::Gte => (Included(key), Unbounded),
        };
        self.values
            .range(range)
            .flat_map(|(_, postings)| postings.iter().copied())
            .collect()
    }
}
