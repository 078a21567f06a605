//! # Sweep Configuration
//!
//! Immutable description of one parameter sweep: the ranges to enumerate, how
//! often to repeat each combination, how to reset the oracle, where to write
//! results and how long to wait for a run to terminate.
//!
//! ## Defaults
//!
//! | Parameter | Config Field | Default |
//! |-----------|--------------|---------|
//! | Particle count | `particles` | 20..=100 step 10 |
//! | Bias | `lambda` | 3.0..=5.0 step 0.5 |
//! | Shortcut constant | `c` | 1.1..=1.5 step 0.05 |
//! | Shape | `shapes` | 0..=0 step 1 |
//! | Repetitions | `runs_per_experiment` | 1 |
//! | Reset parameters | `reset` | (10, 3) |
//! | Raw log base | `output.raw_base` | `runs/shortcutbridging/raw/shape` |
//! | Summary CSV | `output.summary_path` | `runs/shortcutbridging/summary.csv` |
//! | Termination timeout | `termination.timeout_ms` | 600,000 |
//!
//! The shape range deliberately stops at 0 even though the simulator knows
//! shapes 0 to 6; widen `shapes` to sweep them.
//!
//! ## Loading
//!
//! Every field carries a serde default, so a JSON file only needs the fields it
//! overrides:
//!
//! ```rust
//! use bridging_sweep::SweepConfig;
//!
//! let config = SweepConfig::from_json(r#"{ "runs_per_experiment": 5 }"#)?;
//! assert_eq!(config.runs_per_experiment, 5);
//! assert_eq!(config.particles.low, 20);
//! # Ok::<(), bridging_sweep::SweepError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SweepError, SweepResult};

/// Tolerance used when counting points on a real-valued range.
const RANGE_EPSILON: f64 = 1e-9;

/// Real-valued points are rounded to this many steps per unit.
const RANGE_SCALE: f64 = 1e9;

/// Inclusive integer range with a fixed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    /// First value.
    pub low: i64,
    /// Last value (inclusive).
    pub high: i64,
    /// Increment between values.
    pub step: i64,
}

impl IntRange {
    /// Create a range from its bounds and step.
    pub fn new(low: i64, high: i64, step: i64) -> Self {
        Self { low, high, step }
    }

    /// Range holding exactly one value.
    pub fn single(value: i64) -> Self {
        Self::new(value, value, 1)
    }

    /// Number of values on the range; zero when empty or the step is not positive.
    ///
    /// Saturates at `usize::MAX` when the count is not representable; see
    /// [`IntRange::checked_count`].
    pub fn count(&self) -> usize {
        self.checked_count().unwrap_or(usize::MAX)
    }

    /// Number of values on the range, or `None` if it does not fit in `usize`.
    pub fn checked_count(&self) -> Option<usize> {
        if self.step <= 0 || self.low > self.high {
            return Some(0);
        }
        let steps = self.high.checked_sub(self.low)? / self.step;
        usize::try_from(steps).ok()?.checked_add(1)
    }

    /// Value at `index`, counted from `low`.
    pub fn at(&self, index: usize) -> i64 {
        self.low + self.step * index as i64
    }

    /// All values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.count()).map(move |i| self.at(i))
    }
}

/// Inclusive real-valued range with a fixed step.
///
/// Points are computed as `low + i * step` and rounded to nine decimals, so a
/// sweep over `1.1..=1.5 step 0.05` yields `1.15` rather than an accumulated
/// `1.1500000000000001`, and the last point is not lost to drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RealRange {
    /// First value.
    pub low: f64,
    /// Last value (inclusive).
    pub high: f64,
    /// Increment between values.
    pub step: f64,
}

impl RealRange {
    /// Create a range from its bounds and step.
    pub fn new(low: f64, high: f64, step: f64) -> Self {
        Self { low, high, step }
    }

    /// Range holding exactly one value.
    pub fn single(value: f64) -> Self {
        Self::new(value, value, 1.0)
    }

    /// Number of values on the range; zero when empty or the step is not positive.
    ///
    /// Saturates at `usize::MAX` when the count is not representable; see
    /// [`RealRange::checked_count`].
    pub fn count(&self) -> usize {
        self.checked_count().unwrap_or(usize::MAX)
    }

    /// Number of values on the range, or `None` if it does not fit in `usize`.
    pub fn checked_count(&self) -> Option<usize> {
        if self.step.is_nan() || self.step <= 0.0 || self.low > self.high {
            return Some(0);
        }
        let steps = ((self.high - self.low) / self.step + RANGE_EPSILON).floor();
        // usize::MAX as f64 is 2^64; anything below it casts exactly
        if !steps.is_finite() || steps >= usize::MAX as f64 {
            return None;
        }
        (steps as usize).checked_add(1)
    }

    /// Value at `index`, counted from `low`.
    pub fn at(&self, index: usize) -> f64 {
        let raw = self.low + self.step * index as f64;
        (raw * RANGE_SCALE).round() / RANGE_SCALE
    }

    /// All values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.count()).map(move |i| self.at(i))
    }
}

/// Auxiliary parameters passed to the oracle's reset primitive before every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetParams {
    /// First auxiliary parameter.
    pub aux_a: i64,
    /// Second auxiliary parameter.
    pub aux_b: i64,
}

impl Default for ResetParams {
    fn default() -> Self {
        Self { aux_a: 10, aux_b: 3 }
    }
}

/// Where results are appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix of the per-shape raw logs; `<raw_base><shape>.txt` is written.
    pub raw_base: PathBuf,
    /// Summary CSV receiving one row per combination.
    pub summary_path: PathBuf,
}

impl OutputConfig {
    /// Raw log location for `shape`.
    pub fn raw_path(&self, shape: i64) -> PathBuf {
        let mut name = self.raw_base.clone().into_os_string();
        name.push(format!("{shape}.txt"));
        PathBuf::from(name)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            raw_base: Path::new("runs")
                .join("shortcutbridging")
                .join("raw")
                .join("shape"),
            summary_path: Path::new("runs")
                .join("shortcutbridging")
                .join("summary.csv"),
        }
    }
}

/// How long the driver waits for a run to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationPolicy {
    /// Timeout in milliseconds; `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl TerminationPolicy {
    /// Wait at most `timeout` for each run.
    pub fn bounded(timeout: Duration) -> Self {
        Self {
            timeout_ms: Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    /// Wait for each run without a deadline.
    pub fn unbounded() -> Self {
        Self { timeout_ms: None }
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self::bounded(Duration::from_secs(600))
    }
}

/// Complete description of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Particle counts.
    pub particles: IntRange,
    /// Bias parameter values.
    pub lambda: RealRange,
    /// Shortcut constant values.
    pub c: RealRange,
    /// Shape selectors.
    pub shapes: IntRange,
    /// Repetitions per combination.
    pub runs_per_experiment: u32,
    /// Parameters for the oracle reset.
    pub reset: ResetParams,
    /// Output locations.
    pub output: OutputConfig,
    /// Termination wait policy.
    pub termination: TerminationPolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            particles: IntRange::new(20, 100, 10),
            lambda: RealRange::new(3.0, 5.0, 0.5),
            c: RealRange::new(1.1, 1.5, 0.05),
            shapes: IntRange::single(0),
            runs_per_experiment: 1,
            reset: ResetParams::default(),
            output: OutputConfig::default(),
            termination: TerminationPolicy::default(),
        }
    }
}

impl SweepConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> SweepResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> SweepResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SweepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check that the configuration can be swept.
    ///
    /// Empty ranges are accepted and simply produce no combinations.
    pub fn validate(&self) -> SweepResult<()> {
        if self.runs_per_experiment == 0 {
            return Err(SweepError::InvalidConfig(
                "runs_per_experiment must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("lambda.low", self.lambda.low),
            ("lambda.high", self.lambda.high),
            ("lambda.step", self.lambda.step),
            ("c.low", self.c.low),
            ("c.high", self.c.high),
            ("c.step", self.c.step),
        ] {
            if !value.is_finite() {
                return Err(SweepError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.termination.timeout_ms == Some(0) {
            return Err(SweepError::InvalidConfig(
                "termination timeout must be positive".to_string(),
            ));
        }
        if self.checked_combination_count().is_none() {
            return Err(SweepError::InvalidConfig(
                "parameter grid has more combinations than can be counted".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of parameter combinations the sweep enumerates.
    ///
    /// Saturates at `usize::MAX`; validated configurations never reach it.
    pub fn combination_count(&self) -> usize {
        self.checked_combination_count().unwrap_or(usize::MAX)
    }

    /// Number of parameter combinations, or `None` if it overflows `usize`.
    pub fn checked_combination_count(&self) -> Option<usize> {
        grid_size(&self.shapes, &self.particles, &self.lambda, &self.c)
    }
}

/// Product of the four range counts, or `None` on overflow.
pub(crate) fn grid_size(
    shapes: &IntRange,
    particles: &IntRange,
    lambda: &RealRange,
    c: &RealRange,
) -> Option<usize> {
    shapes
        .checked_count()?
        .checked_mul(particles.checked_count()?)?
        .checked_mul(lambda.checked_count()?)?
        .checked_mul(c.checked_count()?)
}
