//! Command line entry point for shortcut bridging sweeps.
//!
//! Runs the default grid (or a JSON configuration) against an external
//! simulator process, or against the seeded mock oracle with `--dry-run`.
//!
//! ```text
//! bridging-sweep --simulator amoebotsim-headless --simulator-arg=--protocol
//! bridging-sweep --config sweep.json --runs 5 --dry-run
//! ```

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use bridging_sweep::{
    FileSink, MockOracle, ProcessOracle, SweepConfig, SweepDriver, SweepReport, SweepResult,
    TerminationPolicy,
};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "bridging-sweep")]
#[command(about = "Parameter sweeps for shortcut bridging simulations", long_about = None)]
struct Args {
    /// JSON configuration file; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Summary CSV path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Prefix of the per-shape raw logs (`<prefix><shape>.txt`)
    #[arg(long)]
    raw_base: Option<PathBuf>,

    /// Repetitions per parameter combination
    #[arg(short, long)]
    runs: Option<u32>,

    /// Seconds to wait for a run to terminate
    #[arg(long, conflicts_with = "no_timeout")]
    timeout_secs: Option<u64>,

    /// Wait for every run without a deadline
    #[arg(long)]
    no_timeout: bool,

    /// Simulator program speaking the line protocol
    #[arg(long, required_unless_present_any = ["dry_run", "print_config"])]
    simulator: Option<String>,

    /// Extra argument passed to the simulator (repeatable)
    #[arg(long = "simulator-arg", allow_hyphen_values = true)]
    simulator_args: Vec<String>,

    /// Use the seeded mock oracle instead of a simulator
    #[arg(long)]
    dry_run: bool,

    /// Seed for `--dry-run`
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// Load the configuration file, then apply command line overrides.
    fn sweep_config(&self) -> SweepResult<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::load(path)?,
            None => SweepConfig::default(),
        };
        if let Some(path) = &self.summary {
            config.output.summary_path = path.clone();
        }
        if let Some(base) = &self.raw_base {
            config.output.raw_base = base.clone();
        }
        if let Some(runs) = self.runs {
            config.runs_per_experiment = runs;
        }
        if let Some(secs) = self.timeout_secs {
            config.termination = TerminationPolicy::bounded(Duration::from_secs(secs));
        }
        if self.no_timeout {
            config.termination = TerminationPolicy::unbounded();
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bridging_sweep=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = args.sweep_config()?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    match run(&args, config).await {
        Ok(report) => {
            report.eprint();
            Ok(())
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    }
}

async fn run(args: &Args, config: SweepConfig) -> SweepResult<SweepReport> {
    let driver = SweepDriver::new(config)?;
    let mut sink = FileSink::new();

    if args.dry_run {
        tracing::info!(seed = args.seed, "dry run with mock oracle");
        let mut oracle = MockOracle::seeded(args.seed);
        return driver.run(&mut oracle, &mut sink).await;
    }

    let program = args.simulator.clone().unwrap_or_default();
    let mut oracle = ProcessOracle::spawn(program, &args.simulator_args)?;
    let report = driver.run(&mut oracle, &mut sink).await?;
    oracle.shutdown().await?;
    Ok(report)
}
