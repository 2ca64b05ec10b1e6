//! Positional usage aggregation
//!
//! For each bout type, counts how often every label occurs at every position
//! of the merged bout sequences, and how often each label follows another.
//! All accumulation is additive so partial results can be combined in any
//! order.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as _};

use crate::pattern_tree::PatternTree;
use crate::types::{BoutType, Label, MergedBout};

/// Label counts at one position of a bout sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionCounts<L: Label> {
    pub counts: HashMap<L, u64>,
    /// Number of bouts reaching this position
    pub total: u64,
}

impl<L: Label> Default for PositionCounts<L> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
            total: 0,
        }
    }
}

impl<L: Label> PositionCounts<L> {
    pub fn count(&self, label: &L) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Share of `label` at this position in percent, `None` without data
    pub fn percentage(&self, label: &L) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(self.count(label) as f64 / self.total as f64 * 100.0)
    }

    fn record(&mut self, label: &L) {
        *self.counts.entry(label.clone()).or_insert(0) += 1;
        self.total += 1;
    }

    fn absorb(&mut self, other: PositionCounts<L>) {
        for (label, count) in other.counts {
            *self.counts.entry(label).or_insert(0) += count;
        }
        self.total += other.total;
    }
}

/// Per-position label histogram for one bout type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionHistogram<L: Label> {
    positions: Vec<PositionCounts<L>>,
}

impl<L: Label> Default for PositionHistogram<L> {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
        }
    }
}

impl<L: Label> PositionHistogram<L> {
    /// Count every label of `labels` at its index
    pub fn record(&mut self, labels: &[L]) {
        if labels.len() > self.positions.len() {
            self.positions.resize_with(labels.len(), PositionCounts::default);
        }
        for (position, label) in labels.iter().enumerate() {
            self.positions[position].record(label);
        }
    }

    /// Number of positions, i.e. the longest merged bout observed
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, position: usize) -> Option<&PositionCounts<L>> {
        self.positions.get(position)
    }

    pub fn positions(&self) -> &[PositionCounts<L>] {
        &self.positions
    }

    /// Occurrences of `label` at `position`
    pub fn count(&self, position: usize, label: &L) -> u64 {
        self.position(position).map_or(0, |p| p.count(label))
    }

    /// Bouts reaching `position`
    pub fn total(&self, position: usize) -> u64 {
        self.position(position).map_or(0, |p| p.total)
    }

    /// Share of `label` at `position` in percent; `None` when no bout reaches it
    pub fn percentage(&self, position: usize, label: &L) -> Option<f64> {
        self.position(position).and_then(|p| p.percentage(label))
    }

    pub fn absorb(&mut self, other: PositionHistogram<L>) {
        if other.positions.len() > self.positions.len() {
            self.positions
                .resize_with(other.positions.len(), PositionCounts::default);
        }
        for (mine, theirs) in self.positions.iter_mut().zip(other.positions) {
            mine.absorb(theirs);
        }
    }
}

/// Directed graph of observed label transitions for one bout type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionGraph<L: Label> {
    pub nodes: HashSet<L>,
    pub edges: HashMap<(L, L), u64>,
}

impl<L: Label> Default for TransitionGraph<L> {
    fn default() -> Self {
        Self {
            nodes: HashSet::new(),
            edges: HashMap::new(),
        }
    }
}

impl<L: Label> TransitionGraph<L> {
    /// Add the labels of one bout as nodes and its adjacent pairs as edges
    pub fn record(&mut self, labels: &[L]) {
        for label in labels {
            if !self.nodes.contains(label) {
                self.nodes.insert(label.clone());
            }
        }
        for pair in labels.windows(2) {
            *self
                .edges
                .entry((pair[0].clone(), pair[1].clone()))
                .or_insert(0) += 1;
        }
    }

    /// Times `to` directly followed `from`
    pub fn edge_count(&self, from: &L, to: &L) -> u64 {
        self.edges
            .get(&(from.clone(), to.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of all edge weights
    pub fn total_transitions(&self) -> u64 {
        self.edges.values().sum()
    }

    pub fn absorb(&mut self, other: TransitionGraph<L>) {
        self.nodes.extend(other.nodes);
        for (edge, count) in other.edges {
            *self.edges.entry(edge).or_insert(0) += count;
        }
    }
}

/// Aggregated statistics for all bouts of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoutTypeStatistics<L: Label> {
    pub bout_type: BoutType,
    /// Number of merged bouts recorded
    pub bouts: u64,
    pub histogram: PositionHistogram<L>,
    pub graph: TransitionGraph<L>,
    pub tree: PatternTree<L>,
}

impl<L: Label> BoutTypeStatistics<L> {
    pub fn new(bout_type: BoutType) -> Self {
        Self {
            bout_type,
            bouts: 0,
            histogram: PositionHistogram::default(),
            graph: TransitionGraph::default(),
            tree: PatternTree::default(),
        }
    }

    pub fn record(&mut self, labels: &[L]) {
        self.bouts += 1;
        self.histogram.record(labels);
        self.graph.record(labels);
        self.tree.record(labels);
    }

    /// Per-position percentages and pattern tree as indented text, for logging
    pub fn percentage_table(&self) -> String
    where
        L: fmt::Debug,
    {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_percentage_table(&mut out);
        out
    }

    fn write_percentage_table(&self, out: &mut String) -> fmt::Result
    where
        L: fmt::Debug,
    {
        for (position, counts) in self.histogram.positions().iter().enumerate() {
            write!(out, "[{}] n={}:", position, counts.total)?;
            for (label, count) in sorted_by_count(&counts.counts) {
                let percent = counts.percentage(label).unwrap_or(0.0);
                write!(out, " {:?}={:.1}% ({})", label, percent, count)?;
            }
            writeln!(out)?;
        }
        write_tree(out, &self.tree, 0)
    }

    pub fn absorb(&mut self, other: BoutTypeStatistics<L>) {
        self.bouts += other.bouts;
        self.histogram.absorb(other.histogram);
        self.graph.absorb(other.graph);
        self.tree.absorb(other.tree);
    }
}

/// Entries by descending count, ties by debug rendering of the label
fn sorted_by_count<L: fmt::Debug>(counts: &HashMap<L, u64>) -> Vec<(&L, u64)> {
    let mut entries: Vec<(&L, u64)> = counts.iter().map(|(l, c)| (l, *c)).collect();
    entries.sort_by_cached_key(|(label, count)| (std::cmp::Reverse(*count), format!("{:?}", label)));
    entries
}

fn write_tree<L: Label + fmt::Debug>(
    out: &mut String,
    tree: &PatternTree<L>,
    depth: usize,
) -> fmt::Result {
    let counts: HashMap<&L, u64> = tree.nodes.iter().map(|(l, n)| (l, n.count)).collect();
    for (label, count) in sorted_by_count(&counts) {
        let percent = tree.percentage(label).unwrap_or(0.0);
        writeln!(
            out,
            "{}{:?} {:.1}% ({})",
            "  ".repeat(depth),
            label,
            percent,
            count
        )?;
        if let Some(node) = tree.nodes.get(*label) {
            write_tree(out, &node.children, depth + 1)?;
        }
    }
    Ok(())
}

/// Statistics for both bout types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoutStatistics<L: Label> {
    pub stimulus: BoutTypeStatistics<L>,
    pub pause: BoutTypeStatistics<L>,
}

impl<L: Label> Default for BoutStatistics<L> {
    fn default() -> Self {
        Self {
            stimulus: BoutTypeStatistics::new(BoutType::Stimulus),
            pause: BoutTypeStatistics::new(BoutType::Pause),
        }
    }
}

impl<L: Label> BoutStatistics<L> {
    pub fn get(&self, bout_type: BoutType) -> &BoutTypeStatistics<L> {
        match bout_type {
            BoutType::Stimulus => &self.stimulus,
            BoutType::Pause => &self.pause,
        }
    }

    pub fn get_mut(&mut self, bout_type: BoutType) -> &mut BoutTypeStatistics<L> {
        match bout_type {
            BoutType::Stimulus => &mut self.stimulus,
            BoutType::Pause => &mut self.pause,
        }
    }

    /// Add counts of one merged bout to the statistics of its type
    pub fn record(&mut self, bout: &MergedBout<L>) {
        self.get_mut(bout.bout_type).record(&bout.labels);
    }

    /// Sum `other` into these statistics
    pub fn absorb(&mut self, other: BoutStatistics<L>) {
        self.stimulus.absorb(other.stimulus);
        self.pause.absorb(other.pause);
    }
}

/// Aggregator over merged bouts
pub struct Aggregator;

impl Aggregator {
    /// Build statistics for a set of merged bouts of any type
    pub fn aggregate<'a, L, I>(bouts: I) -> BoutStatistics<L>
    where
        L: Label + 'a,
        I: IntoIterator<Item = &'a MergedBout<L>>,
    {
        let mut stats = BoutStatistics::default();
        for bout in bouts {
            stats.record(bout);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn merged(bout_type: BoutType, labels: Vec<u32>) -> MergedBout<u32> {
        MergedBout {
            bout_type,
            raw_len: labels.len(),
            labels,
        }
    }

    #[test]
    fn test_position_counts_single_bout() {
        let bouts = vec![merged(BoutType::Stimulus, vec![1, 2, 3])];
        let stats = Aggregator::aggregate(&bouts);

        let hist = &stats.stimulus.histogram;
        assert_eq!(hist.len(), 3);
        assert_eq!(hist.count(0, &1), 1);
        assert_eq!(hist.total(0), 1);
        assert_eq!(hist.percentage(0, &1), Some(100.0));
        assert_eq!(hist.percentage(0, &2), Some(0.0));
        assert!(stats.pause.histogram.is_empty());
    }

    #[test]
    fn test_histogram_spans_longest_bout() {
        let bouts = vec![
            merged(BoutType::Pause, vec![1, 2]),
            merged(BoutType::Pause, vec![2, 1, 3, 4]),
            merged(BoutType::Pause, vec![1]),
        ];
        let stats = Aggregator::aggregate(&bouts);
        let hist = &stats.pause.histogram;

        assert_eq!(hist.len(), 4);
        assert_eq!(hist.total(0), 3);
        assert_eq!(hist.total(1), 2);
        assert_eq!(hist.total(3), 1);
        assert_eq!(hist.count(0, &1), 2);
        let pct = hist.percentage(0, &1).unwrap();
        assert!((pct - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_percentage_without_data_is_none() {
        let bouts = vec![merged(BoutType::Stimulus, vec![1, 2])];
        let stats = Aggregator::aggregate(&bouts);
        assert_eq!(stats.stimulus.histogram.percentage(2, &1), None);
        assert_eq!(stats.pause.histogram.percentage(0, &1), None);
        assert_eq!(PositionCounts::<u32>::default().percentage(&1), None);
    }

    #[test]
    fn test_position_zero_sums_to_non_empty_bouts() {
        let bouts = vec![
            merged(BoutType::Stimulus, vec![1, 2]),
            merged(BoutType::Stimulus, vec![]),
            merged(BoutType::Stimulus, vec![3]),
            merged(BoutType::Stimulus, vec![1, 1, 1]),
        ];
        let stats = Aggregator::aggregate(&bouts);
        let at_zero: u64 = stats.stimulus.histogram.positions()[0].counts.values().sum();
        assert_eq!(at_zero, 3);
        assert_eq!(stats.stimulus.bouts, 4);
    }

    #[test]
    fn test_transition_edges_merged() {
        let bouts = vec![merged(BoutType::Stimulus, vec![1, 2, 3])];
        let stats = Aggregator::aggregate(&bouts);
        let graph = &stats.stimulus.graph;

        let expected: HashMap<(u32, u32), u64> = [((1, 2), 1), ((2, 3), 1)].into_iter().collect();
        assert_eq!(graph.edges, expected);
        assert_eq!(graph.nodes.len(), 3);
    }

    #[test]
    fn test_transition_self_loops_counted() {
        let bouts = vec![merged(BoutType::Stimulus, vec![1, 1, 2, 2, 3])];
        let stats = Aggregator::aggregate(&bouts);
        let graph = &stats.stimulus.graph;

        let expected: HashMap<(u32, u32), u64> =
            [((1, 1), 1), ((1, 2), 1), ((2, 2), 1), ((2, 3), 1)].into_iter().collect();
        assert_eq!(graph.edges, expected);
        assert_eq!(graph.edge_count(&1, &1), 1);
        assert_eq!(graph.edge_count(&3, &1), 0);
    }

    #[test]
    fn test_transition_total_matches_bout_lengths() {
        let bouts = vec![
            merged(BoutType::Pause, vec![1, 2, 3, 1]),
            merged(BoutType::Pause, vec![2]),
            merged(BoutType::Pause, vec![]),
            merged(BoutType::Pause, vec![3, 2]),
        ];
        let stats = Aggregator::aggregate(&bouts);
        // (4 - 1) + (1 - 1) + 0 + (2 - 1)
        assert_eq!(stats.pause.graph.total_transitions(), 4);
        assert!(stats.pause.graph.nodes.contains(&2));
    }

    #[test]
    fn test_single_label_bout_adds_node_without_edges() {
        let bouts = vec![merged(BoutType::Stimulus, vec![5])];
        let stats = Aggregator::aggregate(&bouts);
        assert!(stats.stimulus.graph.edges.is_empty());
        assert!(stats.stimulus.graph.nodes.contains(&5));
        assert_eq!(stats.stimulus.histogram.count(0, &5), 1);
    }

    #[test]
    fn test_percentage_table_lists_positions_and_tree() {
        let bouts = vec![
            merged(BoutType::Stimulus, vec![1, 2]),
            merged(BoutType::Stimulus, vec![1, 3]),
            merged(BoutType::Stimulus, vec![2]),
        ];
        let stats = Aggregator::aggregate(&bouts);
        let table = stats.stimulus.percentage_table();

        assert_eq!(
            table,
            "[0] n=3: 1=66.7% (2) 2=33.3% (1)\n\
             [1] n=2: 2=50.0% (1) 3=50.0% (1)\n\
             1 66.7% (2)\n\
             \x20\x202 50.0% (1)\n\
             \x20\x203 50.0% (1)\n\
             2 33.3% (1)\n"
        );
        assert_eq!(stats.pause.percentage_table(), "");
    }

    #[test]
    fn test_absorb_is_order_independent() {
        let chunk_a = vec![
            merged(BoutType::Stimulus, vec![1, 2, 3]),
            merged(BoutType::Pause, vec![2, 2]),
        ];
        let chunk_b = vec![
            merged(BoutType::Stimulus, vec![2, 1, 3, 4, 5]),
            merged(BoutType::Pause, vec![1]),
        ];

        let mut ab = Aggregator::aggregate(&chunk_a);
        ab.absorb(Aggregator::aggregate(&chunk_b));

        let mut ba = Aggregator::aggregate(&chunk_b);
        ba.absorb(Aggregator::aggregate(&chunk_a));

        let all = Aggregator::aggregate(chunk_a.iter().chain(chunk_b.iter()));

        assert_eq!(ab, ba);
        assert_eq!(ab, all);
    }

    #[test]
    fn test_labels_are_opaque() {
        let bouts = vec![MergedBout {
            bout_type: BoutType::Stimulus,
            raw_len: 3,
            labels: vec!["run".to_string(), "turn".to_string(), "run".to_string()],
        }];
        let stats = Aggregator::aggregate(&bouts);
        assert_eq!(stats.stimulus.graph.nodes.len(), 2);
        assert_eq!(stats.stimulus.histogram.count(2, &"run".to_string()), 1);
    }
}
