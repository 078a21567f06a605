//! Simulation oracle capability.
//!
//! The oracle is the external simulator that executes one shortcut bridging
//! run and reports its metrics. The driver only ever talks to it through the
//! [`Oracle`] trait, one call at a time:
//!
//! 1. **Reset**: discard whatever the previous run left behind
//! 2. **Start**: configure a run for one parameter combination
//! 3. **Await**: block until the simulator reports termination
//! 4. **Query**: read the six metrics
//!
//! Two implementations ship with the crate:
//!
//! - [`MockOracle`]: deterministic, scripted or seeded, used by tests and dry runs
//! - [`ProcessOracle`]: drives a real simulator over a line protocol

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::grid::ParameterCombination;

pub mod mock;
pub mod process;

pub use mock::{MockOracle, OracleCall};
pub use process::ProcessOracle;

/// The six metrics reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Number of asynchronous rounds until termination.
    Rounds,
    /// Number of particle activations.
    Activations,
    /// Number of particle movements.
    Moves,
    /// Perimeter of the particle system.
    Perimeter,
    /// Perimeter across the gap being bridged.
    GapPerimeter,
    /// Weighted combination of perimeter and gap perimeter.
    WeightedMeasure,
}

impl Metric {
    /// Every metric, in reporting order.
    pub const ALL: [Metric; 6] = [
        Metric::Rounds,
        Metric::Activations,
        Metric::Moves,
        Metric::Perimeter,
        Metric::GapPerimeter,
        Metric::WeightedMeasure,
    ];

    /// Name the simulator registers the metric under.
    pub fn host_name(self) -> &'static str {
        match self {
            Metric::Rounds => "# Rounds",
            Metric::Activations => "# Activations",
            Metric::Moves => "# Moves",
            Metric::Perimeter => "Perimeter",
            Metric::GapPerimeter => "Gap Perimeter",
            Metric::WeightedMeasure => "Weighted measure",
        }
    }

    /// Label used in the raw run log.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Rounds => "rounds",
            Metric::Activations => "activations",
            Metric::Moves => "moves",
            Metric::Perimeter => "perimeter",
            Metric::GapPerimeter => "gap perimeter",
            Metric::WeightedMeasure => "weighted measure",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_name())
    }
}

impl FromStr for Metric {
    type Err = OracleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.host_name() == s)
            .ok_or_else(|| OracleError::UnknownMetric(s.to_string()))
    }
}

/// Metrics of one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// `# Rounds`
    pub rounds: f64,
    /// `# Activations`
    pub activations: f64,
    /// `# Moves`
    pub moves: f64,
    /// `Perimeter`
    pub perimeter: f64,
    /// `Gap Perimeter`
    pub gap_perimeter: f64,
    /// `Weighted measure`
    pub weighted_measure: f64,
}

impl RunResult {
    /// Value of `metric`.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Rounds => self.rounds,
            Metric::Activations => self.activations,
            Metric::Moves => self.moves,
            Metric::Perimeter => self.perimeter,
            Metric::GapPerimeter => self.gap_perimeter,
            Metric::WeightedMeasure => self.weighted_measure,
        }
    }

    /// Set the value of `metric`.
    pub fn set(&mut self, metric: Metric, value: f64) {
        match metric {
            Metric::Rounds => self.rounds = value,
            Metric::Activations => self.activations = value,
            Metric::Moves => self.moves = value,
            Metric::Perimeter => self.perimeter = value,
            Metric::GapPerimeter => self.gap_perimeter = value,
            Metric::WeightedMeasure => self.weighted_measure = value,
        }
    }
}

/// Access to an external shortcut bridging simulator.
///
/// Calls are issued strictly in sequence by a single driver; implementations
/// may hold global simulator state and need not be `Send`.
#[async_trait(?Send)]
pub trait Oracle {
    /// Name for logs and reports.
    fn name(&self) -> &str;

    /// Reset the simulator, discarding the previous run's state.
    async fn reset(&mut self, aux_a: i64, aux_b: i64) -> Result<(), OracleError>;

    /// Configure and start a run for `params`.
    async fn start_run(&mut self, params: &ParameterCombination) -> Result<(), OracleError>;

    /// Wait until the current run terminates.
    ///
    /// The driver bounds this wait with its termination policy; dropping the
    /// future must leave the oracle safe to drop.
    async fn await_termination(&mut self) -> Result<(), OracleError>;

    /// Read one metric of the terminated run.
    async fn query_metric(&mut self, metric: Metric) -> Result<f64, OracleError>;

    /// Read all six metrics of the terminated run.
    async fn collect(&mut self) -> Result<RunResult, OracleError> {
        let mut result = RunResult::default();
        for metric in Metric::ALL {
            let value = self.query_metric(metric).await?;
            result.set(metric, value);
        }
        Ok(result)
    }
}
