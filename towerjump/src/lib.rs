//! # Tower Jump
//!
//! Detection of "tower jumps" in cellular carrier location logs.
//!
//! A carrier log holds one row per network event with a UTC timestamp,
//! coordinates and the administrative region (state) the serving tower
//! reported. This library:
//! - Fills missing region labels from other records at the same rounded coordinates
//! - Splits the time-ordered log into intervals separated by inactivity gaps
//! - Scores each interval by majority vote and flags unstable ones as tower jumps
//!
//! ## Features
//!
//! - **`parallel`** - Enable the parallel bucket-counting pass of the imputer (rayon)
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use towerjump::{analyze, AnalysisConfig, CarrierRecord};
//!
//! let t0 = Utc.with_ymd_and_hms(2025, 7, 9, 12, 0, 0).unwrap();
//! let records = vec![
//!     CarrierRecord::new(t0).with_region("Texas"),
//!     CarrierRecord::new(t0 + chrono::TimeDelta::minutes(1)).with_region("Oklahoma"),
//! ];
//!
//! let outcome = analyze(records, &AnalysisConfig::default()).unwrap();
//! assert_eq!(outcome.intervals.len(), 1);
//! assert!(outcome.intervals[0].is_tower_jump);
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TowerJumpError};

// Insertion-ordered label counting shared by imputation and classification
pub mod tally;
pub use tally::LabelTally;

// Missing region imputation from coordinate buckets
pub mod imputation;
#[cfg(feature = "parallel")]
pub use imputation::bucket_majorities_parallel;
pub use imputation::{bucket_majorities, impute_missing_regions, BucketKey, ImputationStats};

// Interval classification (majority vote + jump rule)
pub mod classification;
pub use classification::{classify_interval, is_tower_jump, IntervalResult};

// Gap-based interval segmentation
pub mod segmentation;
pub use segmentation::{segment_records, IntervalSegmenter};

// End-to-end batch analysis
pub mod analysis;
pub use analysis::{analyze, AnalysisOutcome, AnalysisSummary};

// CSV ingestion of carrier logs
pub mod ingest;
pub use ingest::{load_records, load_records_from_path, parse_timestamp, LoadOutcome, LoadStats};

// Report writers
pub mod report;
pub use report::{write_csv_report, write_csv_report_to_path, write_json_report, ReportRow};

// ============================================================================
// Core Types
// ============================================================================

/// A coordinate reading that is known to be present.
///
/// Carrier exports encode "no fix" as `0.0` in either axis. That sentinel is
/// resolved once, by [`Coordinate::from_raw`], so the rest of the crate only
/// ever sees `Option<Coordinate>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without sentinel checks.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Interpret raw export values, returning `None` for the absent sentinel.
    ///
    /// Either axis being exactly `0.0` (or non-finite) marks the whole reading
    /// as absent.
    ///
    /// # Example
    /// ```
    /// use towerjump::Coordinate;
    /// assert!(Coordinate::from_raw(32.7767, -96.7970).is_some());
    /// assert!(Coordinate::from_raw(0.0, -96.7970).is_none());
    /// ```
    pub fn from_raw(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if latitude == 0.0 || longitude == 0.0 {
            return None;
        }
        Some(Self::new(latitude, longitude))
    }
}

/// One observed location event from a carrier log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRecord {
    /// Page number in the carrier export (carried through only)
    pub page: Option<i64>,
    /// Item number within the page (carried through only)
    pub item: Option<i64>,
    /// Event time in UTC; the sole ordering key
    pub utc_time: DateTime<Utc>,
    /// Local wall-clock time as exported (advisory)
    pub local_time: Option<NaiveDateTime>,
    /// Tower or device coordinates, `None` when the export had no fix
    pub location: Option<Coordinate>,
    /// Administrative region label (e.g. a state name)
    pub region: Option<String>,
    pub timezone: String,
    pub city: String,
    pub county: String,
    pub country: String,
    /// Cell technology, e.g. "LTE"
    pub cell_type: String,
}

impl CarrierRecord {
    /// Create a record with only a timestamp; other fields empty.
    pub fn new(utc_time: DateTime<Utc>) -> Self {
        Self {
            page: None,
            item: None,
            utc_time,
            local_time: None,
            location: None,
            region: None,
            timezone: String::new(),
            city: String::new(),
            county: String::new(),
            country: String::new(),
            cell_type: String::new(),
        }
    }

    /// Set the region label.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the location from raw export values (sentinel-aware).
    pub fn with_raw_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Coordinate::from_raw(latitude, longitude);
        self
    }

    /// The usable region label: trimmed, `None` when missing or blank.
    pub fn region_label(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// Whether the record can vote in interval segmentation.
    pub fn is_labeled(&self) -> bool {
        self.region_label().is_some()
    }
}

/// How the gap of an incoming record is measured against an open interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryPolicy {
    /// Gap measured from the last accepted record; intervals may chain
    /// indefinitely while consecutive gaps stay within the window.
    #[default]
    Rolling,
    /// Gap measured from the interval's first record; span is capped at the window.
    FixedStart,
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum gap between records of the same interval, in minutes.
    /// Default: 5
    pub time_window_minutes: u32,

    /// Dominant-label share below which a mixed interval is a tower jump.
    /// Compared with strict `<`. Default: 0.6
    pub min_confidence: f64,

    /// Gap measurement policy. Default: rolling
    pub boundary_policy: BoundaryPolicy,

    /// Decimal places coordinates are rounded to for imputation buckets.
    /// Default: 3 (~110 m of latitude)
    pub bucket_decimals: u32,
}

/// Upper bound for `bucket_decimals`; beyond this the scaled key overflows
/// typical coordinate precision anyway.
pub const MAX_BUCKET_DECIMALS: u32 = 9;

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            time_window_minutes: 5,
            min_confidence: 0.6,
            boundary_policy: BoundaryPolicy::Rolling,
            bucket_decimals: 3,
        }
    }
}

impl AnalysisConfig {
    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(TowerJumpError::config(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if self.bucket_decimals > MAX_BUCKET_DECIMALS {
            return Err(TowerJumpError::config(format!(
                "bucket_decimals must be at most {}, got {}",
                MAX_BUCKET_DECIMALS, self.bucket_decimals
            )));
        }
        Ok(())
    }

    /// Load a config from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The window as an exact duration.
    pub fn window(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::minutes(i64::from(self.time_window_minutes))
    }
}

// ============================================================================
// Tests
// ============================================================================
