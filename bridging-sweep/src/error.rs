//! Error types for the sweep driver and its oracles.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::grid::ParameterCombination;

/// Errors raised while talking to a simulation oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The simulator process could not be started.
    #[error("Failed to spawn simulator `{program}`: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the simulator failed.
    #[error("Simulator I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The simulator closed its output stream.
    #[error("Simulator closed the connection")]
    Closed,

    /// The simulator refused a request.
    #[error("Simulator rejected request: {0}")]
    Rejected(String),

    /// The simulator answered with something the protocol does not allow.
    #[error("Unexpected reply {reply:?} to request {request:?}")]
    Protocol {
        /// Request line that was sent.
        request: String,
        /// Reply line that was received.
        reply: String,
    },

    /// A metric was queried that the oracle does not know.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),
}

/// Errors that abort a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The configuration cannot be swept.
    #[error("Invalid sweep configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be read.
    #[error("Failed to read configuration {path}: {source}")]
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The oracle failed.
    #[error("Oracle failed: {0}")]
    Oracle(#[from] OracleError),

    /// Appending to an output file failed.
    #[error("Failed to append to {path}: {source}")]
    Sink {
        /// Output file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The oracle did not signal termination within the configured timeout.
    #[error("Run {run} of {combination} did not terminate within {timeout:?}")]
    TerminationTimeout {
        /// Combination being simulated.
        combination: ParameterCombination,
        /// 1-based repetition index.
        run: u32,
        /// Timeout that elapsed.
        timeout: Duration,
    },
}

/// Result type for sweep operations.
pub type SweepResult<T> = Result<T, SweepError>;
