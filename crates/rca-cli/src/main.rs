//! thin demonstration binary: load a file of events through the
//! ingestion adapters, group them into incidents, and print the
//! analysis result as JSON. not a product CLI — just enough to drive
//! the library end-to-end from a terminal the way a smoke test would.

use clap::{Parser, ValueEnum};
use colored::Colorize;
use rca_core::config::{load_config, EngineConfig};
use rca_core::grouping::group_by_time_window;
use rca_core::ingestion::{self, Format};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Jsonl,
    Csv,
    Text,
    Syslog,
    Nginx,
    Apache,
    Generic,
}

impl From<FormatArg> for Format {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Jsonl => Format::Jsonl,
            FormatArg::Csv => Format::Csv,
            FormatArg::Text => Format::Text,
            FormatArg::Syslog => Format::Syslog,
            FormatArg::Nginx => Format::Nginx,
            FormatArg::Apache => Format::Apache,
            FormatArg::Generic => Format::Generic,
        }
    }
}

/// analyze a log file and print the root-cause analysis for each
/// incident it's grouped into.
#[derive(Debug, Parser)]
#[command(name = "rca", version, about)]
struct Cli {
    /// path to the log file (format auto-detected by extension unless --format is given)
    file: PathBuf,

    /// force a specific ingestion format instead of auto-detecting from the extension
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// optional TOML config file; falls back to EngineConfig defaults + RCA_* env overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// skip malformed records instead of failing the whole load
    #[arg(long)]
    lenient: bool,

    /// write the JSON result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> rca_core::error::Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default().apply_env_overrides(),
    };
    config.validate()?;

    let lenient = cli.lenient || config.ingestion.lenient;
    let report = ingestion::load_path(&cli.file, cli.format.map(Into::into), lenient)?;
    tracing::info!(
        path = %cli.file.display(),
        events = report.events.len(),
        skipped = report.skipped,
        "loaded events"
    );

    let window = Duration::from_secs(config.time_window_minutes * 60);
    let groups = group_by_time_window(report.events, window, 1);
    tracing::info!(incidents = groups.len(), "grouped into incidents");

    let results: Vec<_> = groups
        .iter()
        .map(rca_core::analyzer::analyze_incident)
        .collect();

    let json = serde_json::to_string_pretty(&results)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("wrote {} incident(s) to {}", results.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
