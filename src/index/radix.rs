//! Compact prefix tree mapping tokens to posting sets.
//!
//! Nodes live in an arena and address each other by index, so there are no
//! parent pointers and no reference cycles. Edge labels hold runs of
//! characters; descending compares the longest common prefix and splits an
//! edge when a new token diverges inside it.
//!
//! Lookup comes in three shapes: exact, prefix (every terminal below the
//! term), and bounded edit distance. The fuzzy walk carries one row of the
//! Levenshtein DP matrix per consumed label character and abandons a subtree
//! as soon as the row minimum exceeds the tolerance, which keeps the visited
//! region proportional to the match envelope rather than the whole tree.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::DocOrd;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

/// Terminal payload: the full token and its posting set.
#[derive(Debug, Clone)]
struct Terminal {
    token: String,
    postings: BTreeSet<DocOrd>,
}

#[derive(Debug, Clone)]
struct Node {
    /// Edge label from the parent; empty only at the root.
    label: Vec<char>,
    /// Children keyed by the first character of their label.
    children: BTreeMap<char, NodeId>,
    terminal: Option<Terminal>,
}

impl Node {
    fn empty() -> Self {
        Self {
            label: Vec::new(),
            children: BTreeMap::new(),
            terminal: None,
        }
    }
}

/// Where a descent for a char sequence ended.
enum Descent {
    /// No node or edge continues the sequence.
    Miss,
    /// The sequence ends exactly at this node.
    AtNode(NodeId),
    /// The sequence ends inside this node's edge label.
    InEdge(NodeId),
}

/// Radix tree over tokens with per-terminal posting sets.
#[derive(Debug)]
pub(crate) struct RadixTree {
    nodes: Vec<Node>,
}

impl RadixTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node::empty()],
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Add `ord` to the posting set of `token`. Idempotent on (token, ord).
    pub(crate) fn insert(&mut self, token: &str, ord: DocOrd) {
        let chars: Vec<char> = token.chars().collect();
        let mut node = ROOT;
        let mut pos = 0;
        loop {
            if pos == chars.len() {
                self.node_mut(node)
                    .terminal
                    .get_or_insert_with(|| Terminal {
                        token: token.to_string(),
                        postings: BTreeSet::new(),
                    })
                    .postings
                    .insert(ord);
                return;
            }
            let first = chars[pos];
            let Some(&child) = self.node(node).children.get(&first) else {
                let leaf = self.push(Node {
                    label: chars[pos..].to_vec(),
                    children: BTreeMap::new(),
                    terminal: Some(Terminal {
                        token: token.to_string(),
                        postings: BTreeSet::from([ord]),
                    }),
                });
                self.node_mut(node).children.insert(first, leaf);
                return;
            };
            let common = common_prefix_len(&self.node(child).label, &chars[pos..]);
            if common < self.node(child).label.len() {
                self.split_edge(child, common);
            }
            node = child;
            pos += common;
        }
    }

    /// Split `node`'s edge label at `at`, pushing the tail (with all children
    /// and any terminal) into a new child. `node` keeps its arena slot, so
    /// the parent's child pointer stays valid.
    fn split_edge(&mut self, node: NodeId, at: usize) {
        let tail_label = self.node_mut(node).label.split_off(at);
        let tail_children = std::mem::take(&mut self.node_mut(node).children);
        let tail_terminal = self.node_mut(node).terminal.take();
        let first = tail_label[0];
        let tail = self.push(Node {
            label: tail_label,
            children: tail_children,
            terminal: tail_terminal,
        });
        self.node_mut(node).children.insert(first, tail);
    }

    fn descend(&self, chars: &[char]) -> Descent {
        let mut node = ROOT;
        let mut pos = 0;
        loop {
            if pos == chars.len() {
                return Descent::AtNode(node);
            }
            let Some(&child) = self.node(node).children.get(&chars[pos]) else {
                return Descent::Miss;
            };
            let label = &self.node(child).label;
            let remaining = &chars[pos..];
            let common = common_prefix_len(label, remaining);
            if common == label.len() {
                node = child;
                pos += common;
            } else if common == remaining.len() {
                return Descent::InEdge(child);
            } else {
                return Descent::Miss;
            }
        }
    }

    /// Posting set of the exact token; empty when absent.
    pub(crate) fn find_exact(&self, token: &str) -> BTreeSet<DocOrd> {
        let chars: Vec<char> = token.chars().collect();
        match self.descend(&chars) {
            Descent::AtNode(node) => self
                .node(node)
                .terminal
                .as_ref()
                .map(|t| t.postings.clone())
                .unwrap_or_default(),
            _ => BTreeSet::new(),
        }
    }

    /// Matched tokens and their posting sets for a search term.
    ///
    /// - `exact`: the term itself, when indexed.
    /// - `tolerance == 0`: every terminal that extends the term as a prefix.
    /// - `tolerance > 0`: every terminal within `tolerance` edits of the term.
    pub(crate) fn find(
        &self,
        term: &str,
        exact: bool,
        tolerance: usize,
    ) -> BTreeMap<String, BTreeSet<DocOrd>> {
        let mut out = BTreeMap::new();
        if exact {
            let postings = self.find_exact(term);
            if !postings.is_empty() {
                out.insert(term.to_string(), postings);
            }
        } else if tolerance == 0 {
            self.collect_prefix(term, &mut out);
        } else {
            let chars: Vec<char> = term.chars().collect();
            let row: Vec<usize> = (0..=chars.len()).collect();
            self.fuzzy_collect(ROOT, &chars, &row, tolerance, &mut out);
        }
        out
    }

    fn collect_prefix(&self, prefix: &str, out: &mut BTreeMap<String, BTreeSet<DocOrd>>) {
        let chars: Vec<char> = prefix.chars().collect();
        match self.descend(&chars) {
            Descent::AtNode(node) | Descent::InEdge(node) => self.collect_terminals(node, out),
            Descent::Miss => {}
        }
    }

    fn collect_terminals(&self, node: NodeId, out: &mut BTreeMap<String, BTreeSet<DocOrd>>) {
        if let Some(terminal) = &self.node(node).terminal {
            out.insert(terminal.token.clone(), terminal.postings.clone());
        }
        for &child in self.node(node).children.values() {
            self.collect_terminals(child, out);
        }
    }

    /// Bounded-edit-distance walk. `row[j]` holds the Levenshtein distance
    /// between the path consumed so far and `term[..j]`; the walk stops in a
    /// subtree once the row minimum exceeds the tolerance, since appending
    /// characters can never lower any cell below that minimum.
    fn fuzzy_collect(
        &self,
        node: NodeId,
        term: &[char],
        row: &[usize],
        tolerance: usize,
        out: &mut BTreeMap<String, BTreeSet<DocOrd>>,
    ) {
        let mut row = row.to_vec();
        for &c in &self.node(node).label {
            let mut next = vec![0; row.len()];
            next[0] = row[0] + 1;
            let mut min = next[0];
            for j in 1..row.len() {
                let cost = usize::from(term[j - 1] != c);
                next[j] = (next[j - 1] + 1).min(row[j] + 1).min(row[j - 1] + cost);
                min = min.min(next[j]);
            }
            row = next;
            if min > tolerance {
                return;
            }
        }
        if let Some(terminal) = &self.node(node).terminal {
            if row[row.len() - 1] <= tolerance {
                out.insert(terminal.token.clone(), terminal.postings.clone());
            }
        }
        for &child in self.node(node).children.values() {
            self.fuzzy_collect(child, term, &row, tolerance, out);
        }
    }

    /// Remove `ord` from the posting set of `token`.
    ///
    /// Returns true iff the posting was present and removed. When a posting
    /// set empties, the terminal is unset and the path is pruned: empty leaf
    /// nodes detach from their parents and single-child pass-through nodes
    /// merge labels with their only child.
    pub(crate) fn remove(&mut self, token: &str, ord: DocOrd) -> bool {
        let chars: Vec<char> = token.chars().collect();
        let mut path = vec![ROOT];
        let mut pos = 0;
        while pos < chars.len() {
            let current = *path.last().unwrap_or(&ROOT);
            let Some(&child) = self.node(current).children.get(&chars[pos]) else {
                return false;
            };
            let common = common_prefix_len(&self.node(child).label, &chars[pos..]);
            if common < self.node(child).label.len() {
                return false;
            }
            path.push(child);
            pos += common;
        }
        let node = *path.last().unwrap_or(&ROOT);
        let Some(terminal) = self.node_mut(node).terminal.as_mut() else {
            return false;
        };
        if !terminal.postings.remove(&ord) {
            return false;
        }
        if terminal.postings.is_empty() {
            self.node_mut(node).terminal = None;
            self.prune(&path);
        }
        true
    }

    /// Walk a root-to-leaf path bottom-up after a terminal was unset,
    /// detaching empty nodes and merging single-child pass-throughs.
    fn prune(&mut self, path: &[NodeId]) {
        for i in (1..path.len()).rev() {
            let node = path[i];
            if self.node(node).terminal.is_some() {
                break;
            }
            match self.node(node).children.len() {
                0 => {
                    let parent = path[i - 1];
                    let first = self.node(node).label[0];
                    self.node_mut(parent).children.remove(&first);
                    // The parent may now be empty or mergeable itself.
                }
                1 => {
                    self.merge_with_only_child(node);
                    break;
                }
                _ => break,
            }
        }
    }

    /// Fold a non-terminal node's only child into it. The child's arena slot
    /// is orphaned; slots are not reclaimed (there is no compaction).
    fn merge_with_only_child(&mut self, node: NodeId) {
        let Some(&child) = self.node(node).children.values().next() else {
            return;
        };
        let folded = std::mem::replace(self.node_mut(child), Node::empty());
        let merged = self.node_mut(node);
        merged.label.extend(folded.label);
        merged.children = folded.children;
        merged.terminal = folded.terminal;
    }
}

fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
