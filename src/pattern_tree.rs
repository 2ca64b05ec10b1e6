//! Prefix tree over merged bout sequences
//!
//! Each level holds the labels that followed a given prefix, with the number
//! of bouts that passed through each node. Percentages are relative to the
//! sibling nodes on the same level.

use std::collections::HashMap;

use crate::types::Label;

/// One label following a prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternNode<L: Label> {
    /// Number of bouts whose sequence passes through this node
    pub count: u64,
    pub children: PatternTree<L>,
}

/// A level of the prefix tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTree<L: Label> {
    pub nodes: HashMap<L, PatternNode<L>>,
}

impl<L: Label> Default for PatternTree<L> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }
}

impl<L: Label> PatternTree<L> {
    /// Walk `labels` from the root, creating nodes as needed
    pub fn record(&mut self, labels: &[L]) {
        let mut level = self;
        for label in labels {
            let node = level
                .nodes
                .entry(label.clone())
                .or_insert_with(|| PatternNode {
                    count: 0,
                    children: PatternTree::default(),
                });
            node.count += 1;
            level = &mut node.children;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Sum of node counts on this level
    pub fn level_total(&self) -> u64 {
        self.nodes.values().map(|n| n.count).sum()
    }

    /// Share of `label` among its siblings in percent
    pub fn percentage(&self, label: &L) -> Option<f64> {
        let node = self.nodes.get(label)?;
        let total = self.level_total();
        if total == 0 {
            return None;
        }
        Some(node.count as f64 / total as f64 * 100.0)
    }

    /// Node reached by following `path` from this level
    pub fn get(&self, path: &[L]) -> Option<&PatternNode<L>> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(first)?;
        for label in rest {
            node = node.children.nodes.get(label)?;
        }
        Some(node)
    }

    /// Length of the longest recorded sequence
    pub fn depth(&self) -> usize {
        self.nodes
            .values()
            .map(|n| 1 + n.children.depth())
            .max()
            .unwrap_or(0)
    }

    pub fn absorb(&mut self, other: PatternTree<L>) {
        for (label, theirs) in other.nodes {
            match self.nodes.get_mut(&label) {
                Some(mine) => {
                    mine.count += theirs.count;
                    mine.children.absorb(theirs.children);
                }
                None => {
                    self.nodes.insert(label, theirs);
                }
            }
        }
    }
}
