//! Vitalgauge CLI - Command-line interface for the quality engine
//!
//! Commands:
//! - report: score a reading dump and print a full quality report
//! - validate: validate a single reading against a reading dump
//! - describe: print the presentation badge for a 0-100 score

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use thiserror::Error;

use vitalgauge::{
    AnalysisWindow, EngineError, MemoryStore, QualityEngine, Reading, DEFAULT_WINDOW_DAYS,
    ENGINE_VERSION,
};

/// Vitalgauge - data quality and device reliability engine
#[derive(Parser)]
#[command(name = "vitalgauge")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score health reading quality and device reliability", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a reading dump and print a full quality report
    Report {
        /// Readings file (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// User whose readings should be scored
        #[arg(long)]
        user: String,

        /// Report window in days, ending at the newest reading
        #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
        window_days: i64,

        /// Force pretty-printed JSON (defaults to pretty only on a TTY)
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a single reading against a reading dump
    Validate {
        /// Readings file holding the trailing history (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// The reading to validate, as a JSON object
        #[arg(long)]
        reading: String,

        /// Force pretty-printed JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Print the presentation badge for a 0-100 score
    Describe {
        /// Score to describe
        score: f64,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one reading per line)
    Ndjson,
    /// JSON array of readings
    Json,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("No readings in input")]
    NoReadings,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{{\"error\":{}}}", serde_json::json!(e.to_string()));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Report {
            input,
            input_format,
            user,
            window_days,
            pretty,
        } => cmd_report(&input, input_format, &user, window_days, pretty),

        Commands::Validate {
            input,
            input_format,
            reading,
            pretty,
        } => cmd_validate(&input, input_format, &reading, pretty),

        Commands::Describe { score } => {
            let badge = vitalgauge::describe_score(score);
            println!("{}", serde_json::to_string_pretty(&badge)?);
            Ok(())
        }
    }
}

fn cmd_report(
    input: &Path,
    input_format: InputFormat,
    user: &str,
    window_days: i64,
    pretty: bool,
) -> Result<(), CliError> {
    let readings = read_readings(input, input_format)?;

    // Anchor the window at the newest reading so a dump scores the same
    // no matter when the command runs
    let end = readings
        .iter()
        .map(|r| r.timestamp)
        .max()
        .ok_or(CliError::NoReadings)?;
    let window = AnalysisWindow::ending_at(end + chrono::Duration::seconds(1), window_days);

    let engine = QualityEngine::new(MemoryStore::from_readings(readings));
    let report = engine.report_for_window(user, window)?;

    print_json(&report, pretty)?;
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    reading_json: &str,
    pretty: bool,
) -> Result<(), CliError> {
    let readings = read_readings(input, input_format)?;
    let reading: Reading = serde_json::from_str(reading_json)?;

    let engine = QualityEngine::new(MemoryStore::from_readings(readings));
    let validation = engine.validate_reading(&reading)?;

    print_json(&validation, pretty)?;
    Ok(())
}

fn read_readings(input: &Path, format: InputFormat) -> Result<Vec<Reading>, CliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let readings = match format {
        InputFormat::Ndjson => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<Reading>, _>>()?,
        InputFormat::Json => serde_json::from_str(&data)?,
    };
    Ok(readings)
}

fn print_json<T: serde::Serialize>(value: &T, force_pretty: bool) -> Result<(), CliError> {
    let pretty = force_pretty || atty::is(atty::Stream::Stdout);
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}
