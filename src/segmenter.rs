//! Row segmentation
//!
//! Splits a row into alternating stimulus and pause bouts. Cut points depend
//! only on the configured bout lengths, never on the labels.

use tracing::debug;

use crate::config::BoutSpec;
use crate::error::PatternError;
use crate::types::Bout;

/// Segmenter for experiment rows
pub struct Segmenter;

impl Segmenter {
    /// Partition `row` into bouts alternating type, starting with `spec.starts_with`
    ///
    /// The row must hold a whole, positive number of stimulus + pause cycles.
    /// `row_index` is only used for error context.
    pub fn segment<L: Clone>(
        row: &[L],
        spec: &BoutSpec,
        row_index: usize,
    ) -> Result<Vec<Bout<L>>, PatternError> {
        spec.validate()?;

        let cycle = spec.cycle_length();
        if row.is_empty() || row.len() % cycle != 0 {
            return Err(PatternError::MalformedRow {
                row: row_index,
                expected: format!("a positive multiple of {} columns", cycle),
                actual: row.len(),
            });
        }

        let mut bouts = Vec::with_capacity(2 * row.len() / cycle);
        let mut offset = 0;
        let mut bout_type = spec.starts_with;
        while offset < row.len() {
            let length = spec.length_of(bout_type);
            let bout = Bout {
                bout_type,
                start: offset,
                labels: row[offset..offset + length].to_vec(),
            };
            debug!(
                row = row_index,
                "{}: Bout start: {} bout end: {}",
                bout_type.alias(),
                bout.start,
                bout.end()
            );
            bouts.push(bout);
            offset += length;
            bout_type = bout_type.flip();
        }

        Ok(bouts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoutType;
    use pretty_assertions::assert_eq;

    fn spec(s: usize, p: usize, starts_with: BoutType) -> BoutSpec {
        BoutSpec::new(s, p, starts_with, true).unwrap()
    }

    #[test]
    fn test_segment_single_cycle() {
        let row = vec![1, 1, 2, 2, 3, 1, 1, 1, 2, 2];
        let bouts = Segmenter::segment(&row, &spec(5, 5, BoutType::Stimulus), 0).unwrap();

        assert_eq!(bouts.len(), 2);
        assert_eq!(bouts[0].bout_type, BoutType::Stimulus);
        assert_eq!(bouts[0].labels, vec![1, 1, 2, 2, 3]);
        assert_eq!(bouts[1].bout_type, BoutType::Pause);
        assert_eq!(bouts[1].labels, vec![1, 1, 1, 2, 2]);
        assert_eq!(bouts[1].start, 5);
    }

    #[test]
    fn test_segment_multiple_cycles_alternate_and_concatenate() {
        let row: Vec<u32> = (0..21).collect();
        let bouts = Segmenter::segment(&row, &spec(3, 4, BoutType::Pause), 0).unwrap();

        // 21 = 3 cycles of 7 columns
        assert_eq!(bouts.len(), 6);
        for (i, bout) in bouts.iter().enumerate() {
            let expected_type = if i % 2 == 0 {
                BoutType::Pause
            } else {
                BoutType::Stimulus
            };
            assert_eq!(bout.bout_type, expected_type);
            let expected_len = if expected_type == BoutType::Pause { 4 } else { 3 };
            assert_eq!(bout.len(), expected_len);
        }

        let rejoined: Vec<u32> = bouts.into_iter().flat_map(|b| b.labels).collect();
        assert_eq!(rejoined, row);
    }

    #[test]
    fn test_partial_cycle_is_malformed() {
        let row: Vec<u8> = vec![1; 9];
        let err = Segmenter::segment(&row, &spec(5, 5, BoutType::Stimulus), 4).unwrap_err();
        match err {
            PatternError::MalformedRow { row, actual, expected } => {
                assert_eq!(row, 4);
                assert_eq!(actual, 9);
                assert!(expected.contains("10"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_one_and_a_half_cycles_is_malformed() {
        // A complete stimulus bout after a full cycle is still a partial cycle
        let row = vec!["a"; 15];
        assert!(Segmenter::segment(&row, &spec(5, 5, BoutType::Stimulus), 0).is_err());
    }

    #[test]
    fn test_empty_row_is_malformed() {
        let row: Vec<u8> = Vec::new();
        assert!(matches!(
            Segmenter::segment(&row, &spec(2, 2, BoutType::Stimulus), 0),
            Err(PatternError::MalformedRow { actual: 0, .. })
        ));
    }

    #[test]
    fn test_overflowing_spec_rejected_before_segmenting() {
        let bad = BoutSpec {
            stimulus_length: usize::MAX,
            pause_length: 1,
            starts_with: BoutType::Stimulus,
            merge_adjacent: true,
        };
        let row = vec![1u8; 4];
        assert!(matches!(
            Segmenter::segment(&row, &bad, 0),
            Err(PatternError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_zero_length_bout_rejected_before_segmenting() {
        let bad = BoutSpec {
            stimulus_length: 0,
            pause_length: 5,
            starts_with: BoutType::Stimulus,
            merge_adjacent: true,
        };
        let row = vec![1; 10];
        assert!(matches!(
            Segmenter::segment(&row, &bad, 0),
            Err(PatternError::InvalidConfiguration { .. })
        ));
    }
}
