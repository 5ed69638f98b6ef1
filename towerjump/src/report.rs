//! Report writers for classified intervals.
//!
//! - CSV: one row per interval, human-oriented (percentage confidence,
//!   `yes`/`no` jump flag, label counts as a JSON object)
//! - JSON: the [`IntervalResult`] list as-is (fraction confidence, RFC 3339 times)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;
use serde::Serialize;

use crate::classification::IntervalResult;
use crate::error::Result;

/// Timestamp layout used in the CSV report.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One CSV report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub start_time: String,
    pub end_time: String,
    pub state: String,
    /// "yes" or "no"
    pub is_tower_jump: &'static str,
    /// 0-100, two decimals
    pub confidence_percentage: f64,
    pub total_records: usize,
    /// JSON object of label counts, e.g. `{"Texas":2,"Oklahoma":1}`
    pub states_count: String,
}

impl ReportRow {
    pub fn from_interval(interval: &IntervalResult) -> Result<Self> {
        Ok(Self {
            start_time: interval.start_time.format(REPORT_TIME_FORMAT).to_string(),
            end_time: interval.end_time.format(REPORT_TIME_FORMAT).to_string(),
            state: interval.dominant_label.clone(),
            is_tower_jump: if interval.is_tower_jump { "yes" } else { "no" },
            confidence_percentage: interval.confidence_percentage(),
            total_records: interval.total_records,
            states_count: serde_json::to_string(&interval.label_counts)?,
        })
    }
}

/// Write the CSV report (header included) to any writer.
pub fn write_csv_report<W: Write>(writer: W, intervals: &[IntervalResult]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if intervals.is_empty() {
        // serialize() only emits the header alongside the first row
        csv_writer.write_record([
            "start_time",
            "end_time",
            "state",
            "is_tower_jump",
            "confidence_percentage",
            "total_records",
            "states_count",
        ])?;
    }
    for interval in intervals {
        csv_writer.serialize(ReportRow::from_interval(interval)?)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the CSV report to a file, replacing it if present.
pub fn write_csv_report_to_path(path: impl AsRef<Path>, intervals: &[IntervalResult]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_csv_report(BufWriter::new(file), intervals)?;
    info!("[Report] Report saved as: {} ({} intervals)", path.display(), intervals.len());
    Ok(())
}

/// Write intervals as a pretty-printed JSON array.
pub fn write_json_report<W: Write>(mut writer: W, intervals: &[IntervalResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, intervals)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::classify_interval;
    use crate::tally::LabelTally;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn sample() -> IntervalResult {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 9, 14, 5, 0).unwrap();
        let tally: LabelTally = ["Texas", "Oklahoma", "Texas"].into_iter().collect();
        classify_interval(t0, t0 + TimeDelta::minutes(2), tally, 0.6).unwrap()
    }

    #[test]
    fn test_report_row() {
        let row = ReportRow::from_interval(&sample()).unwrap();
        assert_eq!(row.start_time, "2025-07-09 14:05:00");
        assert_eq!(row.end_time, "2025-07-09 14:07:00");
        assert_eq!(row.state, "Texas");
        assert_eq!(row.is_tower_jump, "no");
        assert_eq!(row.confidence_percentage, 66.67);
        assert_eq!(row.states_count, r#"{"Texas":2,"Oklahoma":1}"#);
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        write_csv_report(&mut buf, &[sample()]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("start_time,end_time,state,is_tower_jump,confidence_percentage,total_records,states_count")
        );
        assert_eq!(
            lines.next(),
            Some(r#"2025-07-09 14:05:00,2025-07-09 14:07:00,Texas,no,66.67,3,"{""Texas"":2,""Oklahoma"":1}""#)
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_csv_empty_has_header() {
        let mut buf = Vec::new();
        write_csv_report(&mut buf, &[]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("start_time,end_time,state"));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_json_output() {
        let mut buf = Vec::new();
        write_json_report(&mut buf, &[sample()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let first = &value[0];
        assert_eq!(first["dominant_label"], "Texas");
        assert_eq!(first["is_tower_jump"], false);
        assert_eq!(first["total_records"], 3);
        assert_eq!(first["label_counts"]["Oklahoma"], 1);
    }
}
