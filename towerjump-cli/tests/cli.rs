//! End-to-end tests driving the built `tower-jump` binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CARRIER_LOG: &str = "\
Page,Item,UTCDateTime,LocalDateTime,Latitude,Longitude,TimeZone,City,County,State,Country,CellType
1,1,07/09/25 12:00,07/09/25 07:00,32.7767,-96.7970,America/Chicago,Dallas,Dallas,Texas,US,LTE
1,2,07/09/25 12:01,07/09/25 07:01,32.7767,-96.7970,America/Chicago,Dallas,Dallas,,US,LTE
1,3,07/09/25 12:02,07/09/25 07:02,34.0000,-97.1000,America/Chicago,Ardmore,Carter,Oklahoma,US,LTE
1,4,07/09/25 12:10,07/09/25 07:10,32.7767,-96.7970,America/Chicago,Dallas,Dallas,Texas,US,LTE
1,5,07/09/25 12:11,07/09/25 07:11,34.0000,-97.1000,America/Chicago,Ardmore,Carter,Oklahoma,US,LTE
1,6,07/09/25 12:30,07/09/25 07:30,32.7767,-96.7970,America/Chicago,Dallas,Dallas,Texas,US,5G
";

fn tower_jump(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tower-jump"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run tower-jump")
}

fn write_input(dir: &Path, body: &str) -> String {
    let path = dir.join("carrier.csv");
    fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_writes_csv_report_and_summary() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), CARRIER_LOG);
    let output = dir.path().join("report.csv");

    let result = tower_jump(&[&input, output.to_str().unwrap()]);
    assert!(result.status.success(), "stderr: {}", String::from_utf8_lossy(&result.stderr));

    let report = fs::read_to_string(&output).unwrap();
    assert_eq!(report.lines().count(), 4);
    assert!(report.contains(",Texas,yes,50.0,2,"));

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("States filled: 1"));
    assert!(stdout.contains("Total intervals: 3"));
    assert!(stdout.contains("Tower jumps detected: 1"));
    assert!(stdout.contains("First 3 intervals:"));
}

#[test]
fn test_flags_change_classification() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), CARRIER_LOG);
    let output = dir.path().join("report.csv");

    // A 15 minute window merges 12:00-12:11 into one 5-record interval (Texas 3/5 = 0.6)
    let result = tower_jump(&[
        &input,
        output.to_str().unwrap(),
        "--window",
        "15",
        "--confidence",
        "0.61",
    ]);
    assert!(result.status.success());

    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Total intervals: 2"));
    assert!(stdout.contains("Tower jumps detected: 1"));
}

#[test]
fn test_config_file_and_json_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), CARRIER_LOG);
    let config = dir.path().join("settings.json");
    fs::write(&config, r#"{"time_window_minutes": 60}"#).unwrap();

    let result = tower_jump(&[
        &input,
        "-",
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(result.status.success());

    let intervals: serde_json::Value = serde_json::from_slice(&result.stdout).unwrap();
    let intervals = intervals.as_array().unwrap();
    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0]["total_records"], 6);
    assert_eq!(intervals[0]["dominant_label"], "Texas");

    // Summary goes to stderr when the report is on stdout
    assert!(String::from_utf8_lossy(&result.stderr).contains("Total intervals: 1"));
}

#[test]
fn test_no_labeled_records_reported_distinctly() {
    let dir = TempDir::new().unwrap();
    let header = CARRIER_LOG.lines().next().unwrap();
    let input = write_input(
        dir.path(),
        &format!("{}\n1,1,07/09/25 12:00,,0,0,,,,,US,LTE\n", header),
    );
    let output = dir.path().join("report.csv");

    let result = tower_jump(&[&input, output.to_str().unwrap()]);
    assert!(result.status.success());
    assert!(String::from_utf8_lossy(&result.stdout).contains("No labeled records to analyze"));
    assert_eq!(fs::read_to_string(&output).unwrap().lines().count(), 1);
}

#[test]
fn test_invalid_confidence_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), CARRIER_LOG);
    let output = dir.path().join("report.csv");

    let result = tower_jump(&[&input, output.to_str().unwrap(), "--confidence", "1.5"]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("min_confidence"));
    assert!(!output.exists());
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.csv");
    let result = tower_jump(&[missing.to_str().unwrap(), "-"]);
    assert!(!result.status.success());
}
