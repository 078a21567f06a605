//! # Bridging Sweep
//!
//! Parameter sweeps for shortcut bridging amoebot simulations.
//!
//! The simulator itself is an external oracle: it resets, runs one system of
//! particles until the algorithm terminates and reports six metrics. This
//! crate enumerates the experiment grid, repeats each combination a fixed
//! number of times, and appends the results to text logs and a CSV summary.
//!
//! ## Core Components
//!
//! - [`SweepConfig`]: ranges, repetitions, output locations, termination policy
//! - [`SweepGrid`]: Cartesian product of the ranges, shape outermost and `c` innermost
//! - [`Oracle`]: capability trait for the simulator, with [`MockOracle`] and [`ProcessOracle`]
//! - [`ResultSink`]: append-only output, with [`FileSink`] and [`MemorySink`]
//! - [`SweepDriver`]: the run loop producing a [`SweepReport`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use bridging_sweep::{FileSink, ProcessOracle, SweepConfig, SweepDriver};
//!
//! let driver = SweepDriver::new(SweepConfig::default())?;
//! let mut oracle = ProcessOracle::spawn("amoebotsim-headless", ["--protocol"])?;
//! let report = driver.run(&mut oracle, &mut FileSink::new()).await?;
//! report.eprint();
//! ```
//!
//! ## Output
//!
//! | File | Content |
//! |------|---------|
//! | `summary.csv` | header, then one averaged row per combination |
//! | `<raw_base><shape>.txt` | one labeled block per run |

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Sweep configuration.
pub mod config;

/// Driver run loop.
pub mod driver;

/// Error types.
pub mod error;

/// Parameter grid enumeration.
pub mod grid;

/// Simulation oracles.
pub mod oracle;

/// Run and summary records.
pub mod record;

/// Sweep reports.
pub mod report;

/// Result sinks.
pub mod sink;

pub use config::{IntRange, OutputConfig, RealRange, ResetParams, SweepConfig, TerminationPolicy};
pub use driver::SweepDriver;
pub use error::{OracleError, SweepError, SweepResult};
pub use grid::{ParameterCombination, SweepGrid};
pub use oracle::{Metric, MockOracle, Oracle, OracleCall, ProcessOracle, RunResult};
pub use record::{MetricTotals, SummaryRecord, SUMMARY_HEADER};
pub use report::SweepReport;
pub use sink::{FileSink, MemorySink, ResultSink};
