//! Run merging
//!
//! Collapses maximal runs of identical adjacent labels within one bout.

use crate::types::{Bout, MergedBout};

/// Run-length collapse of bout label sequences
pub struct RunMerger;

impl RunMerger {
    /// Produce the merged form of `bout`
    ///
    /// With `merge_adjacent == false` the labels are passed through unchanged.
    pub fn merge<L: PartialEq>(bout: Bout<L>, merge_adjacent: bool) -> MergedBout<L> {
        let raw_len = bout.labels.len();
        let labels = if merge_adjacent {
            collapse_runs(bout.labels)
        } else {
            bout.labels
        };

        MergedBout {
            bout_type: bout.bout_type,
            raw_len,
            labels,
        }
    }
}

/// Keep a label only when it differs from the previously kept one
pub fn collapse_runs<L: PartialEq>(mut labels: Vec<L>) -> Vec<L> {
    labels.dedup();
    labels
}
