//! Bout Patterns - positional usage statistics for behavioral bout tables
//!
//! Every row of an experiment table alternates between stimulus and pause
//! bouts, each covering a fixed number of time points that hold a behavior
//! label. Rows run through a deterministic pipeline: segmentation → run
//! merging → aggregation → report encoding.
//!
//! For each bout type the aggregation yields:
//!
//! - **Position histogram**: how often each label occurs at each position of
//!   the merged bout sequences
//! - **Transition graph**: how often one label directly follows another
//! - **Pattern tree**: label usage conditioned on the preceding pattern

pub mod aggregator;
pub mod config;
pub mod error;
pub mod merger;
pub mod pattern_tree;
pub mod pipeline;
pub mod report;
pub mod segmenter;
pub mod table;
pub mod types;

pub use aggregator::{
    Aggregator, BoutStatistics, BoutTypeStatistics, PositionCounts, PositionHistogram,
    TransitionGraph,
};
pub use config::{BoutSpec, MalformedRowPolicy, TableOptions};
pub use error::PatternError;
pub use merger::RunMerger;
pub use pattern_tree::{PatternNode, PatternTree};
pub use pipeline::{analyze_table, compute_patterns, PatternProcessor, PatternRun, RunSummary};
pub use report::{PatternReport, ReportEncoder, ReportFormat};
pub use segmenter::Segmenter;
pub use types::{Bout, BoutType, Label, MergedBout, Row};

/// Version embedded in all reports
pub const PATTERNS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "bout-patterns";
