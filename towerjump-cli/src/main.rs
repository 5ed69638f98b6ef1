//! tower-jump - Tower jump report generator for carrier location logs
//!
//! Usage:
//!   tower-jump <input.csv> [output] [--window <min>] [--confidence <f>]
//!
//! Loads a carrier CSV export, fills missing states from coordinates,
//! segments the log into time intervals and writes one report row per
//! interval. A short summary and the first few intervals are printed.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum, ValueHint};
use towerjump::{
    analyze, load_records_from_path, write_csv_report, write_json_report, AnalysisConfig,
    AnalysisOutcome, BoundaryPolicy, LoadStats,
};

#[derive(Parser, Debug)]
#[command(name = "tower-jump", version)]
#[command(about = "Analyze cell tower data for tower jumps", long_about = None)]
struct Cli {
    /// Carrier CSV export to analyze
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Report path (`-` for stdout)
    #[arg(default_value = "tower_jump_analysis_report.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Time window in minutes for analysis [default: 5]
    #[arg(long)]
    window: Option<u32>,

    /// Minimum confidence threshold [default: 0.6]
    #[arg(long)]
    confidence: Option<f64>,

    /// How the gap to an open interval is measured [default: rolling]
    #[arg(long, value_enum)]
    boundary: Option<BoundaryOpt>,

    /// Decimal places for coordinate buckets when filling states [default: 3]
    #[arg(long)]
    bucket_decimals: Option<u32>,

    /// JSON file with analysis settings; flags override it
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = FormatOpt::Csv)]
    format: FormatOpt,

    /// Number of intervals to show after the summary
    #[arg(long, default_value_t = 5)]
    preview: usize,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BoundaryOpt {
    Rolling,
    FixedStart,
}

impl From<BoundaryOpt> for BoundaryPolicy {
    fn from(value: BoundaryOpt) -> Self {
        match value {
            BoundaryOpt::Rolling => BoundaryPolicy::Rolling,
            BoundaryOpt::FixedStart => BoundaryPolicy::FixedStart,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatOpt {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let config = build_config(&cli)?;
    run(&cli, &config)
}

/// Defaults, then the JSON config file, then explicit flags.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match cli.config.as_ref() {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            AnalysisConfig::from_json(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    if let Some(window) = cli.window {
        config.time_window_minutes = window;
    }
    if let Some(confidence) = cli.confidence {
        config.min_confidence = confidence;
    }
    if let Some(boundary) = cli.boundary {
        config.boundary_policy = boundary.into();
    }
    if let Some(decimals) = cli.bucket_decimals {
        config.bucket_decimals = decimals;
    }

    config.validate().context("invalid analysis settings")?;
    Ok(config)
}

fn run(cli: &Cli, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_records_from_path(&cli.input)
        .with_context(|| format!("loading {}", cli.input.display()))?;
    let stats = loaded.stats;

    let outcome = analyze(loaded.records, config).context("analyzing tower jumps")?;

    let to_stdout = cli.output == Path::new("-");
    write_report(&cli.output, cli.format, &outcome)?;

    // Keep stdout clean for the report itself when it is piped there
    if to_stdout {
        print_summary(&mut io::stderr().lock(), cli, &stats, &outcome)?;
    } else {
        print_summary(&mut io::stdout().lock(), cli, &stats, &outcome)?;
    }
    Ok(())
}

fn write_report(path: &Path, format: FormatOpt, outcome: &AnalysisOutcome) -> Result<()> {
    let writer: Box<dyn Write> = if path == Path::new("-") {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Box::new(BufWriter::new(file))
    };

    match format {
        FormatOpt::Csv => write_csv_report(writer, &outcome.intervals),
        FormatOpt::Json => write_json_report(writer, &outcome.intervals),
    }
    .with_context(|| format!("writing report to {}", path.display()))?;

    log::info!("[Report] Report saved as: {}", path.display());
    Ok(())
}

fn print_summary(
    out: &mut dyn Write,
    cli: &Cli,
    stats: &LoadStats,
    outcome: &AnalysisOutcome,
) -> Result<()> {
    let summary = outcome.summary();

    writeln!(out)?;
    writeln!(out, "Analysis Summary:")?;
    writeln!(
        out,
        "Records loaded: {} ({} dropped)",
        stats.loaded,
        stats.dropped()
    )?;
    writeln!(out, "States filled: {}", outcome.imputation.filled)?;
    writeln!(
        out,
        "Records without state: {}",
        outcome.unlabeled_records
    )?;

    let Some(jump_percentage) = summary.jump_percentage else {
        writeln!(out, "No labeled records to analyze; report contains no intervals")?;
        return Ok(());
    };

    writeln!(out, "Total intervals: {}", summary.total_intervals)?;
    writeln!(out, "Tower jumps detected: {}", summary.tower_jumps)?;
    writeln!(out, "Jump percentage: {}%", jump_percentage)?;

    if cli.preview > 0 {
        let shown = cli.preview.min(outcome.intervals.len());
        writeln!(out)?;
        writeln!(out, "First {} intervals:", shown)?;
        for (i, interval) in outcome.intervals.iter().take(shown).enumerate() {
            writeln!(
                out,
                "{}. {} to {}: {} (Conf: {}%, Tower Jump: {})",
                i + 1,
                interval.start_time.format("%Y-%m-%d %H:%M:%S"),
                interval.end_time.format("%Y-%m-%d %H:%M:%S"),
                interval.dominant_label,
                interval.confidence_percentage(),
                if interval.is_tower_jump { "yes" } else { "no" }
            )?;
        }
    }
    Ok(())
}
