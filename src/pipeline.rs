//! Pattern pipeline orchestration
//!
//! This module provides the public API for bout pattern analysis. It runs
//! every row through segmentation and run merging and accumulates the
//! per-type statistics.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregator::BoutStatistics;
use crate::config::{BoutSpec, MalformedRowPolicy, TableOptions};
use crate::error::PatternError;
use crate::merger::RunMerger;
use crate::segmenter::Segmenter;
use crate::table;
use crate::types::{BoutType, Label, Row};

/// Default label used to pad merged bouts back to their raw length on export
pub const DEFAULT_PAD_LABEL: &str = "0";

/// Row and bout counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Rows segmented successfully
    pub rows_processed: usize,
    /// Indices of rows skipped as malformed
    pub rows_rejected: Vec<usize>,
    pub stimulus_bouts: usize,
    pub pause_bouts: usize,
}

impl RunSummary {
    fn count_bout(&mut self, bout_type: BoutType) {
        match bout_type {
            BoutType::Stimulus => self.stimulus_bouts += 1,
            BoutType::Pause => self.pause_bouts += 1,
        }
    }
}

/// Result of a complete run
#[derive(Debug, Clone)]
pub struct PatternRun<L: Label> {
    pub spec: BoutSpec,
    pub summary: RunSummary,
    pub statistics: BoutStatistics<L>,
    /// Exported bouts per accepted row, when export was enabled
    pub exported_rows: Option<Vec<Row<L>>>,
}

/// Compute bout statistics for in-memory rows (one-shot).
///
/// # Arguments
/// * `rows` - Rows of labels, indexed from 0 for error reporting
/// * `spec` - Bout layout and merge flag
/// * `policy` - Whether a malformed row aborts the run or is skipped
///
/// # Example
/// ```
/// use bout_patterns::{compute_patterns, BoutSpec, BoutType, MalformedRowPolicy};
///
/// let spec = BoutSpec::new(5, 5, BoutType::Stimulus, true).unwrap();
/// let rows = vec![vec![1, 1, 2, 2, 3, 1, 1, 1, 2, 2]];
/// let run = compute_patterns(&rows, spec, MalformedRowPolicy::Abort).unwrap();
/// assert_eq!(run.statistics.stimulus.histogram.count(0, &1), 1);
/// ```
pub fn compute_patterns<L>(
    rows: &[Row<L>],
    spec: BoutSpec,
    policy: MalformedRowPolicy,
) -> Result<PatternRun<L>, PatternError>
where
    L: Label + fmt::Debug,
{
    let mut processor = PatternProcessor::new(spec, policy)?;
    for (index, row) in rows.iter().enumerate() {
        processor.process_row(index, row)?;
    }
    Ok(processor.finish())
}

/// Read a delimited table from disk and compute its bout statistics.
///
/// When `export_bouts` is set, the exported bouts are padded with
/// [`DEFAULT_PAD_LABEL`].
pub fn analyze_table(
    path: &Path,
    options: &TableOptions,
    spec: BoutSpec,
    policy: MalformedRowPolicy,
    export_bouts: bool,
) -> Result<PatternRun<String>, PatternError> {
    let mut processor = PatternProcessor::new(spec, policy)?;
    if export_bouts {
        processor = processor.with_bout_export(DEFAULT_PAD_LABEL.to_string());
    }

    info!(
        "Creating pattern histograms beginning with {} bout in file: {}",
        spec.starts_with,
        path.display()
    );

    let table = table::read_table_path(path, options)?;
    for (index, row) in table.rows.iter().enumerate() {
        processor.process_row(index, row)?;
    }
    Ok(processor.finish())
}

/// Stateful processor accumulating statistics row by row.
pub struct PatternProcessor<L: Label> {
    spec: BoutSpec,
    policy: MalformedRowPolicy,
    statistics: BoutStatistics<L>,
    summary: RunSummary,
    pad_label: Option<L>,
    exported_rows: Vec<Row<L>>,
}

impl<L: Label + fmt::Debug> PatternProcessor<L> {
    /// Create a processor, validating the bout specification up front
    pub fn new(spec: BoutSpec, policy: MalformedRowPolicy) -> Result<Self, PatternError> {
        spec.validate()?;
        info!(
            "Stimulus bout length: {} Pause bout length: {}",
            spec.stimulus_length, spec.pause_length
        );
        Ok(Self {
            spec,
            policy,
            statistics: BoutStatistics::default(),
            summary: RunSummary::default(),
            pad_label: None,
            exported_rows: Vec::new(),
        })
    }

    /// Also keep every accepted row's bouts, merged bouts padded with `pad_label`
    pub fn with_bout_export(mut self, pad_label: L) -> Self {
        self.pad_label = Some(pad_label);
        self
    }

    /// Segment, merge and count one row.
    ///
    /// A malformed row is returned as an error under [`MalformedRowPolicy::Abort`]
    /// and recorded in the summary under [`MalformedRowPolicy::Skip`].
    pub fn process_row(&mut self, row_index: usize, row: &[L]) -> Result<(), PatternError> {
        debug!(row = row_index, "Row: {:?}", row);

        let bouts = match Segmenter::segment(row, &self.spec, row_index) {
            Ok(bouts) => bouts,
            Err(e @ PatternError::MalformedRow { .. }) => match self.policy {
                MalformedRowPolicy::Abort => return Err(e),
                MalformedRowPolicy::Skip => {
                    warn!("Skipping row: {}", e);
                    self.summary.rows_rejected.push(row_index);
                    return Ok(());
                }
            },
            Err(e) => return Err(e),
        };

        let mut exported = Vec::with_capacity(row.len());
        for bout in bouts {
            let merged = RunMerger::merge(bout, self.spec.merge_adjacent);
            debug!(
                row = row_index,
                "{}: {}: {:?}",
                merged.bout_type.alias(),
                if self.spec.merge_adjacent {
                    "Bout (merged)"
                } else {
                    "Bout"
                },
                merged.labels
            );

            if let Some(pad) = &self.pad_label {
                exported.extend(merged.padded(pad));
            }
            self.summary.count_bout(merged.bout_type);
            self.statistics.record(&merged);
        }

        if self.pad_label.is_some() {
            self.exported_rows.push(exported);
        }
        self.summary.rows_processed += 1;
        Ok(())
    }

    pub fn statistics(&self) -> &BoutStatistics<L> {
        &self.statistics
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Finish the run and hand over the accumulated results
    pub fn finish(self) -> PatternRun<L> {
        info!(
            "Found {} stimulus bouts in total",
            self.summary.stimulus_bouts
        );
        info!("Found {} pause bouts in total", self.summary.pause_bouts);
        for bout_type in BoutType::ALL {
            info!(
                "{} histogram: \n{}",
                bout_type,
                self.statistics.get(bout_type).percentage_table()
            );
        }
        if !self.summary.rows_rejected.is_empty() {
            warn!(
                "Skipped {} malformed rows",
                self.summary.rows_rejected.len()
            );
        }

        PatternRun {
            spec: self.spec,
            summary: self.summary,
            statistics: self.statistics,
            exported_rows: self.pad_label.map(|_| self.exported_rows),
        }
    }
}
