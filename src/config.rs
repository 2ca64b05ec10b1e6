//! Run configuration
//!
//! Bout layout, malformed-row policy and table reading options are explicit
//! immutable values passed into the pipeline stages.

use serde::{Deserialize, Serialize};

use crate::error::PatternError;
use crate::types::BoutType;

/// How a row decomposes into alternating stimulus and pause bouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoutSpec {
    /// Number of time points (columns) in one stimulus bout
    pub stimulus_length: usize,
    /// Number of time points (columns) in one pause bout
    pub pause_length: usize,
    /// Type of the first bout in every row
    pub starts_with: BoutType,
    /// Collapse runs of identical adjacent labels within a bout
    pub merge_adjacent: bool,
}

impl BoutSpec {
    /// Create a validated bout specification
    pub fn new(
        stimulus_length: usize,
        pause_length: usize,
        starts_with: BoutType,
        merge_adjacent: bool,
    ) -> Result<Self, PatternError> {
        let spec = Self {
            stimulus_length,
            pause_length,
            starts_with,
            merge_adjacent,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Check that both bout lengths are positive
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.stimulus_length == 0 {
            return Err(PatternError::invalid_config(
                "stimulus_length",
                "bout length must be positive",
            ));
        }
        if self.pause_length == 0 {
            return Err(PatternError::invalid_config(
                "pause_length",
                "bout length must be positive",
            ));
        }
        if self.stimulus_length.checked_add(self.pause_length).is_none() {
            return Err(PatternError::invalid_config(
                "pause_length",
                "cycle length overflows",
            ));
        }
        Ok(())
    }

    /// Configured length of a bout of the given type
    pub fn length_of(&self, bout_type: BoutType) -> usize {
        match bout_type {
            BoutType::Stimulus => self.stimulus_length,
            BoutType::Pause => self.pause_length,
        }
    }

    /// Columns covered by one stimulus + pause cycle
    ///
    /// Only meaningful on a validated spec.
    pub fn cycle_length(&self) -> usize {
        self.stimulus_length + self.pause_length
    }
}

/// What to do with a row that cannot be segmented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedRowPolicy {
    /// Stop the run at the first malformed row
    #[default]
    Abort,
    /// Log a warning, record the row index and continue
    Skip,
}

/// Default field delimiter of experiment tables
pub const DEFAULT_DELIMITER: u8 = b';';

/// Options for reading the experiment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Leading records kept aside as header rows
    pub head_rows: usize,
    /// Leading columns to drop before the first bout (e.g. an individual id)
    pub offset: usize,
    /// Maximum number of data rows to read
    pub max_rows: Option<usize>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            head_rows: 0,
            offset: 0,
            max_rows: None,
        }
    }
}

impl TableOptions {
    /// Parse a single-byte delimiter option
    pub fn parse_delimiter(delim: &str) -> Result<u8, PatternError> {
        match delim.as_bytes() {
            [b] => Ok(*b),
            _ if delim == "\\t" => Ok(b'\t'),
            _ => Err(PatternError::invalid_config(
                "delimiter",
                format!("expected a single-byte delimiter, got `{}`", delim),
            )),
        }
    }
}
