//! True/false posting pair, one per boolean leaf.

use std::collections::BTreeSet;

use crate::types::DocOrd;

#[derive(Debug, Default)]
pub(crate) struct BooleanIndex {
    truthy: BTreeSet<DocOrd>,
    falsy: BTreeSet<DocOrd>,
}

impl BooleanIndex {
    fn side_mut(&mut self, value: bool) -> &mut BTreeSet<DocOrd> {
        if value { &mut self.truthy } else { &mut self.falsy }
    }

    pub(crate) fn insert(&mut self, value: bool, ord: DocOrd) {
        self.side_mut(value).insert(ord);
    }

    pub(crate) fn remove(&mut self, value: bool, ord: DocOrd) -> bool {
        self.side_mut(value).remove(&ord)
    }

    pub(crate) fn query(&self, value: bool) -> &BTreeSet<DocOrd> {
        if value { &self.truthy } else { &self.falsy }
    }
}
