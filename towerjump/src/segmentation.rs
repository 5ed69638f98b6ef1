//! Gap-based interval segmentation.
//!
//! Records sorted by UTC time are consumed in a single pass. At most one
//! interval is open at a time; a record whose gap to the open interval's
//! boundary exceeds the window closes it and seeds the next one. Whatever is
//! open at end of input is closed by [`IntervalSegmenter::finish`].
//!
//! The boundary an incoming record is measured against depends on
//! [`BoundaryPolicy`]:
//! - `Rolling`: the last accepted record, so evenly spaced records chain into
//!   one long interval
//! - `FixedStart`: the interval's first record, capping each span at the window
//!
//! Records without a usable region label are invisible: they neither extend
//! nor close an interval.

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;

use crate::classification::{classify_interval, IntervalResult};
use crate::error::{Result, TowerJumpError};
use crate::tally::LabelTally;
use crate::{AnalysisConfig, BoundaryPolicy, CarrierRecord};

/// The interval currently accumulating records.
#[derive(Debug)]
struct OpenInterval {
    start: DateTime<Utc>,
    last: DateTime<Utc>,
    labels: LabelTally,
}

impl OpenInterval {
    fn seed(time: DateTime<Utc>, label: &str) -> Self {
        let mut labels = LabelTally::new();
        labels.add(label);
        Self {
            start: time,
            last: time,
            labels,
        }
    }

    fn boundary(&self, policy: BoundaryPolicy) -> DateTime<Utc> {
        match policy {
            BoundaryPolicy::Rolling => self.last,
            BoundaryPolicy::FixedStart => self.start,
        }
    }

    fn accept(&mut self, time: DateTime<Utc>, label: &str) {
        self.last = time;
        self.labels.add(label);
    }
}

/// Single-pass interval state machine.
///
/// # Example
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use towerjump::{AnalysisConfig, CarrierRecord, IntervalSegmenter};
///
/// let t0 = Utc.with_ymd_and_hms(2025, 7, 9, 12, 0, 0).unwrap();
/// let mut segmenter = IntervalSegmenter::new(&AnalysisConfig::default());
///
/// assert!(segmenter.push(&CarrierRecord::new(t0).with_region("Texas")).unwrap().is_none());
/// let closed = segmenter
///     .push(&CarrierRecord::new(t0 + TimeDelta::minutes(30)).with_region("Texas"))
///     .unwrap();
/// assert_eq!(closed.unwrap().total_records, 1);
/// assert!(segmenter.finish().is_some());
/// ```
#[derive(Debug)]
pub struct IntervalSegmenter {
    window: TimeDelta,
    min_confidence: f64,
    policy: BoundaryPolicy,
    open: Option<OpenInterval>,
    skipped: usize,
}

impl IntervalSegmenter {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            window: config.window(),
            min_confidence: config.min_confidence,
            policy: config.boundary_policy,
            open: None,
            skipped: 0,
        }
    }

    /// Feed the next record. Returns the interval it closed, if any.
    ///
    /// Fails with [`TowerJumpError::OutOfOrder`] if the record is earlier
    /// than the last accepted one.
    pub fn push(&mut self, record: &CarrierRecord) -> Result<Option<IntervalResult>> {
        let Some(label) = record.region_label() else {
            self.skipped += 1;
            return Ok(None);
        };
        let time = record.utc_time;

        if let Some(open) = self.open.as_mut() {
            if time < open.last {
                return Err(TowerJumpError::OutOfOrder {
                    record_time: time,
                    previous_time: open.last,
                });
            }
            if time - open.boundary(self.policy) <= self.window {
                open.accept(time, label);
                return Ok(None);
            }
        }

        let closed = self.open.replace(OpenInterval::seed(time, label));
        Ok(closed.and_then(|interval| self.close(interval)))
    }

    /// Close whatever interval is open. Call once at end of input.
    pub fn finish(&mut self) -> Option<IntervalResult> {
        self.open.take().and_then(|interval| self.close(interval))
    }

    /// Records ignored so far for lacking a region label.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn close(&self, interval: OpenInterval) -> Option<IntervalResult> {
        let result = classify_interval(
            interval.start,
            interval.last,
            interval.labels,
            self.min_confidence,
        )?;
        debug!(
            "[Segmenter] Interval {} -> {}: {} ({} records, confidence {:.3}, jump={})",
            result.start_time,
            result.end_time,
            result.dominant_label,
            result.total_records,
            result.confidence,
            result.is_tower_jump
        );
        Some(result)
    }
}

/// Segment and classify records that are already sorted by UTC time.
pub fn segment_records(
    records: &[CarrierRecord],
    config: &AnalysisConfig,
) -> Result<Vec<IntervalResult>> {
    let mut segmenter = IntervalSegmenter::new(config);
    let mut intervals = Vec::new();

    for record in records {
        if let Some(closed) = segmenter.push(record)? {
            intervals.push(closed);
        }
    }
    intervals.extend(segmenter.finish());

    Ok(intervals)
}
