//! Trend analysis over a user's completed analysis history.
//!
//! Classification only ever consults the two most recent entries; the full
//! history is used for the chart series alone.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::risk::round1;
use crate::models::{AnalysisRecord, Trend};

/// Deltas that move a comparison out of `stable`.
pub mod trend_thresholds {
    /// Score change beyond this (strictly) counts as a shift.
    pub const SCORE_DELTA: f64 = 2.0;
    /// Finding-count change beyond this (strictly) counts as a shift.
    pub const FINDING_DELTA: i64 = 1;
}

/// One completed analysis, reduced to the fields trend analysis needs.
/// History passed to [`analyze_trend`] must be ordered oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Utc>,
    pub score: f64,
    pub finding_count: usize,
}

impl From<&AnalysisRecord> for HistoryEntry {
    fn from(analysis: &AnalysisRecord) -> Self {
        Self {
            recorded_at: analysis.created_at,
            score: analysis.risk_score,
            finding_count: analysis.findings.len(),
        }
    }
}

/// Comparison of the two most recent entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendComparison {
    /// latest - previous, rounded to one decimal.
    pub score_diff: f64,
    pub finding_diff: i64,
    pub latest_score: f64,
    pub previous_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub trend: Trend,
    pub message: &'static str,
    /// None when there were fewer than two entries to compare.
    pub comparison: Option<TrendComparison>,
    pub record_count: usize,
}

/// Classify the trajectory of a chronologically ordered history.
pub fn analyze_trend(history: &[HistoryEntry]) -> TrendReport {
    if history.len() < 2 {
        return TrendReport {
            trend: Trend::InsufficientData,
            message: "At least 2 records are needed for trend analysis",
            comparison: None,
            record_count: history.len(),
        };
    }

    let latest = &history[history.len() - 1];
    let previous = &history[history.len() - 2];

    let score_diff = latest.score - previous.score;
    let finding_diff = latest.finding_count as i64 - previous.finding_count as i64;

    let (trend, message) = if score_diff > trend_thresholds::SCORE_DELTA
        || finding_diff > trend_thresholds::FINDING_DELTA
    {
        (
            Trend::Worsening,
            "Oral health has worsened since the previous record; extra care advised",
        )
    } else if score_diff < -trend_thresholds::SCORE_DELTA
        || finding_diff < -trend_thresholds::FINDING_DELTA
    {
        (
            Trend::Improving,
            "Oral health has improved since the previous record; keep it up",
        )
    } else {
        (
            Trend::Stable,
            "No significant change compared with the previous record",
        )
    };

    TrendReport {
        trend,
        message,
        comparison: Some(TrendComparison {
            score_diff: round1(score_diff),
            finding_diff,
            latest_score: latest.score,
            previous_score: previous.score,
        }),
        record_count: history.len(),
    }
}

/// Chart-ready view of the whole history: one labeled point per entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSeries {
    /// `M/D` labels, one per entry, in history order.
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

/// None on empty history rather than an error.
pub fn chart_series(history: &[HistoryEntry]) -> Option<ChartSeries> {
    if history.is_empty() {
        return None;
    }

    Some(ChartSeries {
        labels: history
            .iter()
            .map(|entry| format!("{}/{}", entry.recorded_at.month(), entry.recorded_at.day()))
            .collect(),
        scores: history.iter().map(|entry| entry.score).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(day: u32, score: f64, finding_count: usize) -> HistoryEntry {
        HistoryEntry {
            recorded_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            score,
            finding_count,
        }
    }

    #[test]
    fn single_entry_is_insufficient() {
        let report = analyze_trend(&[entry(1, 3.0, 2)]);
        assert_eq!(report.trend, Trend::InsufficientData);
        assert!(report.comparison.is_none());
        assert_eq!(report.record_count, 1);
    }

    #[test]
    fn rising_score_is_worsening() {
        let report = analyze_trend(&[entry(1, 3.0, 2), entry(8, 6.0, 2)]);
        assert_eq!(report.trend, Trend::Worsening);
        assert_eq!(report.comparison.unwrap().score_diff, 3.0);
    }

    #[test]
    fn extra_findings_alone_are_worsening() {
        let report = analyze_trend(&[entry(1, 3.0, 1), entry(8, 3.5, 3)]);
        assert_eq!(report.trend, Trend::Worsening);
    }

    #[test]
    fn falling_score_is_improving() {
        let report = analyze_trend(&[entry(1, 7.0, 4), entry(8, 4.0, 4)]);
        assert_eq!(report.trend, Trend::Improving);
    }

    #[test]
    fn fewer_findings_alone_are_improving() {
        let report = analyze_trend(&[entry(1, 4.0, 4), entry(8, 4.0, 2)]);
        assert_eq!(report.trend, Trend::Improving);
    }

    #[test]
    fn small_shifts_are_stable() {
        let report = analyze_trend(&[entry(1, 4.0, 2), entry(8, 5.5, 3)]);
        assert_eq!(report.trend, Trend::Stable);
    }

    #[test]
    fn deltas_at_threshold_are_stable() {
        // Exactly +2.0 / -1 must not tip the classification.
        let up = analyze_trend(&[entry(1, 3.0, 2), entry(8, 5.0, 2)]);
        assert_eq!(up.trend, Trend::Stable);

        let down = analyze_trend(&[entry(1, 3.0, 3), entry(8, 3.0, 2)]);
        assert_eq!(down.trend, Trend::Stable);
    }

    #[test]
    fn only_last_two_entries_are_consulted() {
        // Early history swings wildly; the last two entries are flat.
        let report = analyze_trend(&[
            entry(1, 9.5, 6),
            entry(5, 0.5, 0),
            entry(10, 4.0, 2),
            entry(15, 4.5, 2),
        ]);
        assert_eq!(report.trend, Trend::Stable);
        assert_eq!(report.record_count, 4);
    }

    #[test]
    fn chart_series_labels_every_entry() {
        let series = chart_series(&[entry(1, 3.0, 2), entry(15, 4.2, 3)]).unwrap();
        assert_eq!(series.labels, vec!["3/1", "3/15"]);
        assert_eq!(series.scores, vec![3.0, 4.2]);
    }

    #[test]
    fn chart_series_on_empty_history_is_none() {
        assert!(chart_series(&[]).is_none());
    }
}
