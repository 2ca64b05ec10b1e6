//! Core data types
//!
//! This module defines the bout types and bout sequences that flow through
//! the segmentation → merge → aggregation pipeline. Labels are opaque: any
//! type with equality and hashing can be used.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::error::PatternError;

/// Bound required of behavior labels
pub trait Label: Clone + Eq + Hash {}

impl<T: Clone + Eq + Hash> Label for T {}

/// One row of the experiment table: one label per time point
pub type Row<L> = Vec<L>;

/// Experimental phase a bout belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoutType {
    Stimulus,
    Pause,
}

impl BoutType {
    /// Both bout types, stimulus first
    pub const ALL: [BoutType; 2] = [BoutType::Stimulus, BoutType::Pause];

    /// The other bout type in the alternation
    pub fn flip(self) -> Self {
        match self {
            BoutType::Stimulus => BoutType::Pause,
            BoutType::Pause => BoutType::Stimulus,
        }
    }

    /// Single-letter alias used in log output
    pub fn alias(self) -> &'static str {
        match self {
            BoutType::Stimulus => "S",
            BoutType::Pause => "P",
        }
    }
}

impl fmt::Display for BoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoutType::Stimulus => write!(f, "stimulus"),
            BoutType::Pause => write!(f, "pause"),
        }
    }
}

impl FromStr for BoutType {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stimulus" | "stimuli" | "s" => Ok(BoutType::Stimulus),
            "pause" | "p" => Ok(BoutType::Pause),
            other => Err(PatternError::invalid_config(
                "starts_with",
                format!("expected `stimulus` or `pause`, got `{}`", other),
            )),
        }
    }
}

/// A contiguous slice of a row tagged with its bout type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bout<L> {
    pub bout_type: BoutType,
    /// Column of the first label, relative to the segmented row
    pub start: usize,
    pub labels: Vec<L>,
}

impl<L> Bout<L> {
    /// Number of time points covered by this bout
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Column of the last label (inclusive)
    pub fn end(&self) -> usize {
        (self.start + self.labels.len()).saturating_sub(1)
    }
}

/// A bout after optional run-length collapse of adjacent identical labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedBout<L> {
    pub bout_type: BoutType,
    /// Length of the raw bout this was derived from
    pub raw_len: usize,
    pub labels: Vec<L>,
}

impl<L> MergedBout<L> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Adjacent label pairs in sequence order
    pub fn transitions(&self) -> impl Iterator<Item = (&L, &L)> {
        self.labels.windows(2).map(|w| (&w[0], &w[1]))
    }
}

impl<L: Clone> MergedBout<L> {
    /// Labels right-padded with `pad` back to the raw bout length
    pub fn padded(&self, pad: &L) -> Vec<L> {
        let mut labels = self.labels.clone();
        if labels.len() < self.raw_len {
            labels.resize(self.raw_len, pad.clone());
        }
        labels
    }
}
