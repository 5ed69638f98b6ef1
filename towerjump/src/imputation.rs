//! Missing region imputation from coordinate buckets.
//!
//! Carrier exports often leave the state column empty for some events while
//! other events at the same tower carry it. Coordinates are rounded to a fixed
//! number of decimals to form a bucket; each bucket's majority label fills the
//! blank records that fall into it.
//!
//! ## Rules
//! - Records without a location are never bucketed and never filled
//! - Only records that already carry a label vote
//! - Ties resolve to the label seen first in input order
//! - Records that already have a label are never changed, so running the
//!   imputer twice gives the same result as running it once
//!
//! ## Example
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use towerjump::{impute_missing_regions, CarrierRecord};
//!
//! let t = Utc.with_ymd_and_hms(2025, 7, 9, 12, 0, 0).unwrap();
//! let mut records = vec![
//!     CarrierRecord::new(t).with_region("Texas").with_raw_location(32.77671, -96.79701),
//!     CarrierRecord::new(t).with_raw_location(32.77669, -96.79698),
//! ];
//! let stats = impute_missing_regions(&mut records, 3);
//! assert_eq!(stats.filled, 1);
//! assert_eq!(records[1].region_label(), Some("Texas"));
//! ```

use std::collections::HashMap;

use log::info;

use crate::tally::LabelTally;
use crate::{CarrierRecord, Coordinate};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Below this many records the parallel pass is not worth the split.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_RECORDS: usize = 10_000;

/// A rounded coordinate pair, stored as scaled integers so it can be hashed.
///
/// Rounding is half away from zero (`f64::round`) at `decimals` places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketKey {
    lat: i64,
    lon: i64,
}

impl BucketKey {
    pub fn from_coordinate(coord: &Coordinate, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self {
            lat: (coord.latitude * scale).round() as i64,
            lon: (coord.longitude * scale).round() as i64,
        }
    }
}

/// Counts from one imputation pass, for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImputationStats {
    /// Buckets with at least one known label
    pub buckets: usize,
    /// Blank records that received a label
    pub filled: usize,
    /// Blank records with a location whose bucket had no known label
    pub unresolved: usize,
    /// Blank records without a location
    pub no_location: usize,
}

/// Record's bucket, if it has a location and a known label.
fn voting_key(record: &CarrierRecord, decimals: u32) -> Option<(BucketKey, &str)> {
    let label = record.region_label()?;
    let coord = record.location.as_ref()?;
    Some((BucketKey::from_coordinate(coord, decimals), label))
}

fn majorities(tallies: HashMap<BucketKey, LabelTally>) -> HashMap<BucketKey, String> {
    tallies
        .into_iter()
        .filter_map(|(key, tally)| {
            tally
                .dominant()
                .map(|(label, _)| (key, label.to_string()))
        })
        .collect()
}

/// Majority label of every bucket that has at least one labeled record.
pub fn bucket_majorities(records: &[CarrierRecord], decimals: u32) -> HashMap<BucketKey, String> {
    let mut tallies: HashMap<BucketKey, LabelTally> = HashMap::new();
    for (key, label) in records.iter().filter_map(|r| voting_key(r, decimals)) {
        tallies.entry(key).or_default().add(label);
    }
    majorities(tallies)
}

/// Bucket majorities using parallel processing.
/// Chunk tallies are merged in input order, so ties resolve exactly as in
/// [`bucket_majorities`].
#[cfg(feature = "parallel")]
pub fn bucket_majorities_parallel(
    records: &[CarrierRecord],
    decimals: u32,
) -> HashMap<BucketKey, String> {
    if records.len() < PARALLEL_MIN_RECORDS {
        return bucket_majorities(records, decimals);
    }

    let tallies = records
        .par_iter()
        .fold(HashMap::new, |mut acc: HashMap<BucketKey, LabelTally>, record| {
            if let Some((key, label)) = voting_key(record, decimals) {
                acc.entry(key).or_default().add(label);
            }
            acc
        })
        .reduce(HashMap::new, |mut left, right| {
            for (key, tally) in right {
                left.entry(key).or_default().merge(&tally);
            }
            left
        });

    majorities(tallies)
}

/// Fill blank region labels from their bucket's majority label.
///
/// Only the `region` field of blank, located records is touched.
pub fn impute_missing_regions(records: &mut [CarrierRecord], decimals: u32) -> ImputationStats {
    #[cfg(feature = "parallel")]
    let majority = bucket_majorities_parallel(records, decimals);
    #[cfg(not(feature = "parallel"))]
    let majority = bucket_majorities(records, decimals);

    let mut stats = ImputationStats {
        buckets: majority.len(),
        ..ImputationStats::default()
    };

    for record in records.iter_mut().filter(|r| !r.is_labeled()) {
        let Some(coord) = record.location else {
            stats.no_location += 1;
            continue;
        };
        match majority.get(&BucketKey::from_coordinate(&coord, decimals)) {
            Some(label) => {
                record.region = Some(label.clone());
                stats.filled += 1;
            }
            None => stats.unresolved += 1,
        }
    }

    info!(
        "[Imputer] States filled: {} ({} buckets, {} unresolved, {} without location)",
        stats.filled, stats.buckets, stats.unresolved, stats.no_location
    );

    stats
}
