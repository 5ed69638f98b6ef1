//! Interval classification.
//!
//! A closed interval is scored by majority vote over its members' region
//! labels. The interval is a tower jump when the vote is split and the
//! dominant label's share falls strictly below the configured threshold.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tally::LabelTally;

/// Classification of one closed interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalResult {
    /// Time of the first member record
    pub start_time: DateTime<Utc>,
    /// Time of the last member record
    pub end_time: DateTime<Utc>,
    /// Most frequent label (ties: first seen)
    pub dominant_label: String,
    pub is_tower_jump: bool,
    /// Dominant share in (0, 1], unrounded
    pub confidence: f64,
    /// Number of member records
    pub total_records: usize,
    /// Per-label counts in first-seen order
    pub label_counts: LabelTally,
}

impl IntervalResult {
    /// Confidence as a 0-100 percentage rounded to 2 decimals. Display only.
    pub fn confidence_percentage(&self) -> f64 {
        (self.confidence * 10_000.0).round() / 100.0
    }

    /// Number of distinct labels in the interval.
    pub fn distinct_labels(&self) -> usize {
        self.label_counts.distinct()
    }
}

/// The jump rule: more than one label present and the dominant share
/// strictly below `min_confidence`.
pub fn is_tower_jump(distinct_labels: usize, confidence: f64, min_confidence: f64) -> bool {
    distinct_labels > 1 && confidence < min_confidence
}

/// Score a closed interval. Returns `None` for an empty tally.
///
/// The comparison against `min_confidence` uses the exact ratio, never the
/// rounded percentage.
pub fn classify_interval(
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    label_counts: LabelTally,
    min_confidence: f64,
) -> Option<IntervalResult> {
    let (dominant_label, dominant_count) = label_counts
        .dominant()
        .map(|(label, count)| (label.to_string(), count))?;
    let total_records = label_counts.total();
    let confidence = dominant_count as f64 / total_records as f64;

    Some(IntervalResult {
        start_time,
        end_time,
        dominant_label,
        is_tower_jump: is_tower_jump(label_counts.distinct(), confidence, min_confidence),
        confidence,
        total_records,
        label_counts,
    })
}
