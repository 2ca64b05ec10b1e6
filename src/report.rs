//! Pattern report encoder
//!
//! Turns accumulated bout statistics into a serializable report with
//! percentages, and renders it as JSON or plain text. Positions without data
//! carry `null` percentages instead of dividing by zero.

use std::cmp::Ordering;
use std::fmt::{self, Display, Write as _};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::{BoutTypeStatistics, PositionCounts};
use crate::config::BoutSpec;
use crate::error::PatternError;
use crate::pattern_tree::PatternTree;
use crate::pipeline::{PatternRun, RunSummary};
use crate::types::{BoutType, Label};
use crate::{PATTERNS_VERSION, PRODUCER_NAME};

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub spec: BoutSpec,
    pub summary: RunSummary,
    pub stimulus: BoutTypeReport,
    pub pause: BoutTypeReport,
}

impl PatternReport {
    /// Section of the given bout type
    pub fn section(&self, bout_type: BoutType) -> &BoutTypeReport {
        match bout_type {
            BoutType::Stimulus => &self.stimulus,
            BoutType::Pause => &self.pause,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Statistics of one bout type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoutTypeReport {
    pub bout_type: BoutType,
    pub bouts: u64,
    pub positions: Vec<PositionReport>,
    pub nodes: Vec<String>,
    pub transitions: Vec<TransitionReport>,
    pub pattern_tree: Vec<PatternNodeReport>,
}

/// Label usage at one position
///
/// Only positions reached by at least one bout are listed, so `total` is
/// positive and every listed `percent` is `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub position: usize,
    pub total: u64,
    pub labels: Vec<LabelUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelUsage {
    pub label: String,
    pub count: u64,
    /// `None` when no bout reaches the position; never the case for listed positions
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReport {
    pub from: String,
    pub to: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternNodeReport {
    pub label: String,
    pub count: u64,
    pub percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PatternNodeReport>,
}

/// Output rendering of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Json,
    JsonPretty,
    Text,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build the report for a finished run
    pub fn encode<L: Label + Display>(&self, run: &PatternRun<L>) -> PatternReport {
        PatternReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: PATTERNS_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            spec: run.spec,
            summary: run.summary.clone(),
            stimulus: encode_bout_type(&run.statistics.stimulus),
            pause: encode_bout_type(&run.statistics.pause),
        }
    }

    /// Encode and render in the requested format
    pub fn render<L: Label + Display>(
        &self,
        run: &PatternRun<L>,
        format: ReportFormat,
    ) -> Result<String, PatternError> {
        let report = self.encode(run);
        match format {
            ReportFormat::Json => Ok(serde_json::to_string(&report)?),
            ReportFormat::JsonPretty => Ok(serde_json::to_string_pretty(&report)?),
            ReportFormat::Text => render_text(&report),
        }
    }
}

fn encode_bout_type<L: Label + Display>(stats: &BoutTypeStatistics<L>) -> BoutTypeReport {
    let positions = stats
        .histogram
        .positions()
        .iter()
        .enumerate()
        .map(|(position, counts)| encode_position(position, counts))
        .collect();

    let mut nodes: Vec<String> = stats.graph.nodes.iter().map(|l| l.to_string()).collect();
    nodes.sort();

    let mut transitions: Vec<TransitionReport> = stats
        .graph
        .edges
        .iter()
        .map(|((from, to), count)| TransitionReport {
            from: from.to_string(),
            to: to.to_string(),
            count: *count,
        })
        .collect();
    transitions.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });

    BoutTypeReport {
        bout_type: stats.bout_type,
        bouts: stats.bouts,
        positions,
        nodes,
        transitions,
        pattern_tree: encode_tree(&stats.tree),
    }
}

fn encode_position<L: Label + Display>(position: usize, counts: &PositionCounts<L>) -> PositionReport {
    let mut labels: Vec<LabelUsage> = counts
        .counts
        .iter()
        .map(|(label, count)| LabelUsage {
            label: label.to_string(),
            count: *count,
            percent: counts.percentage(label),
        })
        .collect();
    labels.sort_by(by_count_then_label);

    PositionReport {
        position,
        total: counts.total,
        labels,
    }
}

fn encode_tree<L: Label + Display>(tree: &PatternTree<L>) -> Vec<PatternNodeReport> {
    let mut nodes: Vec<PatternNodeReport> = tree
        .nodes
        .iter()
        .map(|(label, node)| PatternNodeReport {
            label: label.to_string(),
            count: node.count,
            percent: tree.percentage(label),
            children: encode_tree(&node.children),
        })
        .collect();
    nodes.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    nodes
}

fn by_count_then_label(a: &LabelUsage, b: &LabelUsage) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label))
}

/// Percentage cell, "no data" when undefined
pub fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(p) => format!("{:.1}%", p),
        None => "no data".to_string(),
    }
}

fn render_text(report: &PatternReport) -> Result<String, PatternError> {
    let mut out = String::new();
    write_text(&mut out, report).map_err(|e| PatternError::Encoding(e.to_string()))?;
    Ok(out)
}

fn write_text(out: &mut String, report: &PatternReport) -> fmt::Result {
    writeln!(
        out,
        "rows processed: {}  rows rejected: {}",
        report.summary.rows_processed,
        report.summary.rows_rejected.len()
    )?;
    for section in BoutType::ALL.map(|bout_type| report.section(bout_type)) {
        writeln!(out)?;
        writeln!(out, "{} histogram ({} bouts)", section.bout_type, section.bouts)?;
        for position in &section.positions {
            write!(out, "  [{}] n={}:", position.position, position.total)?;
            for usage in &position.labels {
                write!(
                    out,
                    " {}={} ({})",
                    usage.label,
                    format_percent(usage.percent),
                    usage.count
                )?;
            }
            writeln!(out)?;
        }
        writeln!(out, "{} transitions", section.bout_type)?;
        for edge in &section.transitions {
            writeln!(out, "  {} -> {}: {}", edge.from, edge.to, edge.count)?;
        }
        writeln!(out, "{} patterns", section.bout_type)?;
        write_tree(out, &section.pattern_tree, 1)?;
    }
    Ok(())
}

fn write_tree(out: &mut String, nodes: &[PatternNodeReport], depth: usize) -> fmt::Result {
    for node in nodes {
        writeln!(
            out,
            "{}{} {} ({})",
            "  ".repeat(depth),
            node.label,
            format_percent(node.percent),
            node.count
        )?;
        write_tree(out, &node.children, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MalformedRowPolicy;
    use crate::pipeline::compute_patterns;
    use pretty_assertions::assert_eq;

    fn sample_run() -> PatternRun<u32> {
        let spec = BoutSpec::new(5, 5, BoutType::Stimulus, true).unwrap();
        let rows = vec![
            vec![1, 1, 2, 2, 3, 1, 1, 1, 2, 2],
            vec![1, 3, 3, 3, 3, 2, 2, 2, 2, 2],
        ];
        compute_patterns(&rows, spec, MalformedRowPolicy::Abort).unwrap()
    }

    #[test]
    fn test_encode_positions_sorted_with_percent() {
        let encoder = ReportEncoder::with_instance_id("test".to_string());
        let report = encoder.encode(&sample_run());

        assert_eq!(report.producer.instance_id, "test");
        assert_eq!(report.stimulus.bouts, 2);

        let first = &report.stimulus.positions[0];
        assert_eq!(first.total, 2);
        assert_eq!(
            first.labels,
            vec![LabelUsage {
                label: "1".to_string(),
                count: 2,
                percent: Some(100.0),
            }]
        );

        let second = &report.stimulus.positions[1];
        assert_eq!(second.labels[0].label, "2");
        assert_eq!(second.labels[0].percent, Some(50.0));
        assert_eq!(second.labels[1].label, "3");

        // [1, 2, 3] reaches position 2, [1, 3] does not
        assert_eq!(report.stimulus.positions[2].total, 1);
        assert_eq!(report.stimulus.positions.len(), 3);
    }

    #[test]
    fn test_encode_transitions_and_nodes() {
        let report = ReportEncoder::new().encode(&sample_run());

        assert_eq!(report.stimulus.nodes, vec!["1", "2", "3"]);
        assert_eq!(
            report.stimulus.transitions,
            vec![
                TransitionReport {
                    from: "1".to_string(),
                    to: "2".to_string(),
                    count: 1
                },
                TransitionReport {
                    from: "1".to_string(),
                    to: "3".to_string(),
                    count: 1
                },
                TransitionReport {
                    from: "2".to_string(),
                    to: "3".to_string(),
                    count: 1
                },
            ]
        );
        // Second row's pause bout is a single label
        assert_eq!(report.pause.transitions.len(), 1);
        assert_eq!(report.pause.nodes, vec!["1", "2"]);
    }

    #[test]
    fn test_encode_pattern_tree() {
        let report = ReportEncoder::new().encode(&sample_run());
        let tree = &report.stimulus.pattern_tree;

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].label, "1");
        assert_eq!(tree[0].percent, Some(100.0));
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].percent, Some(50.0));
    }

    #[test]
    fn test_positions_span_only_reached_positions() {
        let run = sample_run();
        let report = ReportEncoder::new().encode(&run);
        let histogram = &run.statistics.stimulus.histogram;

        assert_eq!(report.stimulus.positions.len(), histogram.len());
        for position in &report.stimulus.positions {
            assert!(position.total > 0);
            assert!(position.labels.iter().all(|usage| usage.percent.is_some()));
        }
        // Past the longest bout there is no data
        assert_eq!(histogram.percentage(histogram.len(), &1), None);
        assert_eq!(format_percent(histogram.percentage(histogram.len(), &1)), "no data");
    }

    #[test]
    fn test_sections_follow_bout_type_order() {
        let report = ReportEncoder::new().encode(&sample_run());
        for bout_type in BoutType::ALL {
            assert_eq!(report.section(bout_type).bout_type, bout_type);
        }

        let text = render_text(&report).unwrap();
        let stimulus_at = text.find("stimulus histogram").unwrap();
        let pause_at = text.find("pause histogram").unwrap();
        assert!(stimulus_at < pause_at);
    }

    #[test]
    fn test_json_roundtrip_keeps_null_percent() {
        let usage = LabelUsage {
            label: "x".to_string(),
            count: 0,
            percent: None,
        };
        let json = serde_json::to_value(&usage).unwrap();
        assert!(json["percent"].is_null());
    }

    #[test]
    fn test_render_json() {
        let json = ReportEncoder::new()
            .render(&sample_run(), ReportFormat::Json)
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "bout-patterns");
        assert_eq!(payload["spec"]["starts_with"], "stimulus");
        assert_eq!(payload["summary"]["rows_processed"], 2);
        assert_eq!(payload["stimulus"]["positions"][0]["labels"][0]["percent"], 100.0);
        assert!(payload["computed_at_utc"].is_string());
    }

    #[test]
    fn test_render_text() {
        let text = ReportEncoder::new()
            .render(&sample_run(), ReportFormat::Text)
            .unwrap();

        assert!(text.contains("stimulus histogram (2 bouts)"));
        assert!(text.contains("[0] n=2: 1=100.0% (2)"));
        assert!(text.contains("1 -> 2: 1"));
        assert!(text.contains("pause patterns"));
    }

    #[test]
    fn test_format_percent_no_data() {
        assert_eq!(format_percent(None), "no data");
        assert_eq!(format_percent(Some(33.3333)), "33.3%");
    }
}
