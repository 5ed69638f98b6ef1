//! End-to-end batch analysis: impute, sort, segment.

use log::info;
use serde::Serialize;

use crate::classification::IntervalResult;
use crate::error::Result;
use crate::imputation::{impute_missing_regions, ImputationStats};
use crate::segmentation::IntervalSegmenter;
use crate::{AnalysisConfig, CarrierRecord};

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Classified intervals in time order
    pub intervals: Vec<IntervalResult>,
    pub imputation: ImputationStats,
    /// Records that took part in segmentation
    pub labeled_records: usize,
    /// Records still without a label after imputation
    pub unlabeled_records: usize,
}

impl AnalysisOutcome {
    pub fn summary(&self) -> AnalysisSummary {
        AnalysisSummary::from_intervals(&self.intervals)
    }
}

/// Headline numbers for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_intervals: usize,
    pub tower_jumps: usize,
    /// Sum of interval member counts
    pub labeled_records: usize,
    /// Share of intervals flagged, 0-100 rounded to 2 decimals.
    /// `None` when there are no intervals at all.
    pub jump_percentage: Option<f64>,
}

impl AnalysisSummary {
    pub fn from_intervals(intervals: &[IntervalResult]) -> Self {
        let total_intervals = intervals.len();
        let tower_jumps = intervals.iter().filter(|i| i.is_tower_jump).count();
        let labeled_records = intervals.iter().map(|i| i.total_records).sum();
        let jump_percentage = (total_intervals > 0).then(|| {
            let pct = tower_jumps as f64 / total_intervals as f64 * 100.0;
            (pct * 100.0).round() / 100.0
        });

        Self {
            total_intervals,
            tower_jumps,
            labeled_records,
            jump_percentage,
        }
    }

    /// True when no labeled record survived, as opposed to "no jumps found".
    pub fn is_empty(&self) -> bool {
        self.total_intervals == 0
    }
}

/// Run the full pipeline over an unsorted batch of records.
///
/// 1. Validate `config`
/// 2. Fill blank region labels from coordinate buckets
/// 3. Stable-sort by UTC time
/// 4. Segment and classify
pub fn analyze(mut records: Vec<CarrierRecord>, config: &AnalysisConfig) -> Result<AnalysisOutcome> {
    config.validate()?;

    info!("[Analysis] Filling missing states for {} records", records.len());
    let imputation = impute_missing_regions(&mut records, config.bucket_decimals);

    records.sort_by_key(|r| r.utc_time);

    info!(
        "[Analysis] Segmenting with {} min window ({:?} boundary), min confidence {}",
        config.time_window_minutes, config.boundary_policy, config.min_confidence
    );
    let mut segmenter = IntervalSegmenter::new(config);
    let mut intervals = Vec::new();
    for record in &records {
        if let Some(closed) = segmenter.push(record)? {
            intervals.push(closed);
        }
    }
    intervals.extend(segmenter.finish());

    let unlabeled_records = segmenter.skipped();
    let labeled_records = records.len() - unlabeled_records;

    let jumps = intervals.iter().filter(|i| i.is_tower_jump).count();
    info!(
        "[Analysis] {} intervals, {} tower jumps ({} labeled records, {} skipped)",
        intervals.len(),
        jumps,
        labeled_records,
        unlabeled_records
    );

    Ok(AnalysisOutcome {
        intervals,
        imputation,
        labeled_records,
        unlabeled_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    #[test]
    fn test_analyze_sorts_input() {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 9, 12, 0, 0).unwrap();
        let records = vec![
            CarrierRecord::new(t0 + TimeDelta::minutes(2)).with_region("Texas"),
            CarrierRecord::new(t0).with_region("Texas"),
            CarrierRecord::new(t0 + TimeDelta::minutes(1)).with_region("Texas"),
        ];
        let outcome = analyze(records, &AnalysisConfig::default()).unwrap();
        assert_eq!(outcome.intervals.len(), 1);
        assert_eq!(outcome.intervals[0].start_time, t0);
        assert_eq!(outcome.intervals[0].end_time, t0 + TimeDelta::minutes(2));
    }

    #[test]
    fn test_analyze_rejects_bad_config() {
        let config = AnalysisConfig {
            min_confidence: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(analyze(Vec::new(), &config).is_err());
    }

    #[test]
    fn test_summary_empty_vs_no_jumps() {
        let empty = AnalysisSummary::from_intervals(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.jump_percentage, None);

        let t0 = Utc.with_ymd_and_hms(2025, 7, 9, 12, 0, 0).unwrap();
        let outcome = analyze(
            vec![CarrierRecord::new(t0).with_region("Texas")],
            &AnalysisConfig::default(),
        )
        .unwrap();
        let summary = outcome.summary();
        assert!(!summary.is_empty());
        assert_eq!(summary.tower_jumps, 0);
        assert_eq!(summary.jump_percentage, Some(0.0));
    }
}
