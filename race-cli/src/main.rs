//! Race Gate CLI Application
//!
//! Replays a scripted stream of gate commands against the race-state library
//! and prints the snapshots the board would transmit:
//! - Command handling (setup, racers, ready, countdown, race, finish, ...)
//! - Status transitions and finish capture
//! - Race and board snapshots as JSON lines

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod driver;

use config::AppConfig;
use driver::Driver;

/// Race Gate - Replay gate commands and print race snapshots
#[derive(Parser, Debug)]
#[command(name = "race-cli")]
#[command(about = "Replay timing gate commands and emit race snapshots", long_about = None)]
#[command(version)]
struct Args {
    /// Scenario file with one JSON command per line
    #[arg(short, long, value_name = "FILE")]
    scenario: PathBuf,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output file for snapshots (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Race Gate CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using race-state library v{}", race_state::VERSION);

    let config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };
    log::debug!("Configuration: {:?}", config);

    let scenario = File::open(&args.scenario)
        .with_context(|| format!("Failed to open scenario file: {:?}", args.scenario))?;
    let input = BufReader::new(scenario);

    let output: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let mut driver = Driver::new(&config);
    let stats = driver.replay(input, output)?;

    log::info!(
        "Replayed {} commands ({} skipped), wrote {} snapshots",
        stats.commands,
        stats.skipped,
        stats.snapshots
    );
    log::info!("Final status: {}", driver.race().status());

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    // Logs go to stderr so stdout carries only snapshots
    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
