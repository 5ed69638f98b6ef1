//! CSV ingestion of carrier location logs.
//!
//! Expected header columns (any order, extra columns ignored):
//! `Page, Item, UTCDateTime, LocalDateTime, Latitude, Longitude, TimeZone,
//! City, County, State, Country, CellType`.
//!
//! Only `UTCDateTime` is required. Rows are handled leniently:
//! - Missing or unparseable UTC time: row dropped with a warning
//! - Row the CSV reader cannot decode: row dropped with a warning
//! - Unparseable local time: kept, `local_time` left empty
//! - Blank or non-numeric coordinates: treated as absent
//! - Non-numeric page/item: left empty

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::error::{Result, TowerJumpError};
use crate::{CarrierRecord, Coordinate};

/// Column holding the UTC event time.
pub const UTC_COLUMN: &str = "UTCDateTime";

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%m/%d/%y %H:%M", "%Y-%m-%d %H:%M:%S"];

/// One CSV row before type conversion.
#[derive(Debug, Default, Deserialize)]
struct RawRow {
    #[serde(rename = "Page", default)]
    page: Option<String>,
    #[serde(rename = "Item", default)]
    item: Option<String>,
    #[serde(rename = "UTCDateTime", default)]
    utc_datetime: Option<String>,
    #[serde(rename = "LocalDateTime", default)]
    local_datetime: Option<String>,
    #[serde(rename = "Latitude", default)]
    latitude: Option<String>,
    #[serde(rename = "Longitude", default)]
    longitude: Option<String>,
    #[serde(rename = "TimeZone", default)]
    timezone: Option<String>,
    #[serde(rename = "City", default)]
    city: Option<String>,
    #[serde(rename = "County", default)]
    county: Option<String>,
    #[serde(rename = "State", default)]
    state: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "CellType", default)]
    cell_type: Option<String>,
}

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows seen (header excluded)
    pub rows_read: usize,
    /// Rows turned into records
    pub loaded: usize,
    /// Rows with an empty UTC time
    pub dropped_missing_time: usize,
    /// Rows whose UTC time matched no accepted format
    pub dropped_bad_time: usize,
    /// Rows the CSV reader could not decode
    pub dropped_malformed: usize,
}

impl LoadStats {
    /// Total rows dropped for any reason.
    pub fn dropped(&self) -> usize {
        self.dropped_missing_time + self.dropped_bad_time + self.dropped_malformed
    }
}

/// Records parsed from one input, in file order.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub records: Vec<CarrierRecord>,
    pub stats: LoadStats,
}

/// Parse a carrier timestamp.
///
/// Tries `MM/DD/YY HH:MM` first, then `YYYY-MM-DD HH:MM:SS`.
///
/// # Example
/// ```
/// use towerjump::parse_timestamp;
/// assert!(parse_timestamp("07/09/25 14:05").is_some());
/// assert!(parse_timestamp("2025-07-09 14:05:30").is_some());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_axis(value: Option<&str>, row: usize, column: &str) -> f64 {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => 0.0,
        Some(v) => v.parse::<f64>().unwrap_or_else(|_| {
            debug!("[Ingest] Row {}: non-numeric {} '{}', treating as absent", row, column, v);
            0.0
        }),
    }
}

fn parse_id(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Why a row could not become a record.
enum RowRejection {
    MissingTime,
    BadTime(String),
}

fn convert_row(raw: RawRow, row: usize) -> std::result::Result<CarrierRecord, RowRejection> {
    let utc_text = non_empty(raw.utc_datetime).ok_or(RowRejection::MissingTime)?;
    let utc_time = parse_timestamp(&utc_text)
        .ok_or(RowRejection::BadTime(utc_text))?
        .and_utc();

    let local_time = non_empty(raw.local_datetime).and_then(|text| {
        let parsed = parse_timestamp(&text);
        if parsed.is_none() {
            debug!("[Ingest] Row {}: could not parse local time '{}'", row, text);
        }
        parsed
    });

    let latitude = parse_axis(raw.latitude.as_deref(), row, "Latitude");
    let longitude = parse_axis(raw.longitude.as_deref(), row, "Longitude");

    Ok(CarrierRecord {
        page: parse_id(raw.page.as_deref()),
        item: parse_id(raw.item.as_deref()),
        utc_time,
        local_time,
        location: Coordinate::from_raw(latitude, longitude),
        region: non_empty(raw.state),
        timezone: raw.timezone.unwrap_or_default(),
        city: raw.city.unwrap_or_default(),
        county: raw.county.unwrap_or_default(),
        country: raw.country.unwrap_or_default(),
        cell_type: raw.cell_type.unwrap_or_default(),
    })
}

/// Load records from any CSV source.
///
/// Fails only if the header lacks `UTCDateTime` or the underlying reader
/// errors; bad rows are counted in [`LoadStats`].
pub fn load_records<R: Read>(source: R) -> Result<LoadOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(source);

    let headers = reader.headers()?;
    if !headers.iter().any(|h| h.trim_start_matches('\u{feff}') == UTC_COLUMN) {
        return Err(TowerJumpError::MissingColumn {
            column: UTC_COLUMN.to_string(),
        });
    }

    let mut stats = LoadStats::default();
    let mut records = Vec::new();

    for (idx, result) in reader.deserialize::<RawRow>().enumerate() {
        // Header is line 1
        let row = idx + 2;
        stats.rows_read += 1;

        let raw = match result {
            Ok(raw) => raw,
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => {
                warn!("[Ingest] Row {}: malformed, dropped: {}", row, err);
                stats.dropped_malformed += 1;
                continue;
            }
        };

        match convert_row(raw, row) {
            Ok(record) => records.push(record),
            Err(RowRejection::MissingTime) => {
                warn!("[Ingest] Row {}: no UTC time, dropped", row);
                stats.dropped_missing_time += 1;
            }
            Err(RowRejection::BadTime(text)) => {
                warn!("[Ingest] Row {}: could not parse date '{}', dropped", row, text);
                stats.dropped_bad_time += 1;
            }
        }
    }

    stats.loaded = records.len();
    info!(
        "[Ingest] Data loaded: {} records ({} rows read, {} dropped)",
        stats.loaded,
        stats.rows_read,
        stats.dropped()
    );

    Ok(LoadOutcome { records, stats })
}

/// Load records from a CSV file.
pub fn load_records_from_path(path: impl AsRef<Path>) -> Result<LoadOutcome> {
    let path = path.as_ref();
    info!("[Ingest] Loading data from {}", path.display());
    let file = File::open(path)?;
    load_records(BufReader::new(file))
}
