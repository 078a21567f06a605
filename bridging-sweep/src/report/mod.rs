//! Sweep outcome reporting.
//!
//! [`SweepReport`] is returned by the driver once every combination has been
//! simulated. It implements `Display` for plain output; [`SweepReport::eprint`]
//! renders a colored version on terminals.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::record::SummaryRecord;

pub mod display;

/// Outcome of a completed sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Oracle the sweep ran against.
    pub oracle: String,
    /// Parameter combinations simulated.
    pub combinations: usize,
    /// Repetitions per combination.
    pub runs_per_experiment: u32,
    /// Runs executed in total.
    pub total_runs: usize,
    /// Wall-clock time of the whole sweep.
    pub wall_time: Duration,
    /// Summary with the lowest average weighted measure seen so far.
    pub best: Option<SummaryRecord>,
    /// Summary CSV that was written.
    pub summary_path: PathBuf,
    /// Raw logs that were written, one per shape.
    pub raw_paths: Vec<PathBuf>,
}

impl SweepReport {
    /// Account for one finished combination.
    ///
    /// Only counters and the best summary are kept; rows live in the summary
    /// file.
    pub fn record(&mut self, summary: &SummaryRecord) {
        self.combinations += 1;
        self.total_runs += summary.runs as usize;
        let better = match &self.best {
            Some(best) => summary
                .averages
                .weighted_measure
                .total_cmp(&best.averages.weighted_measure)
                .is_lt(),
            None => true,
        };
        if better {
            self.best = Some(*summary);
        }
    }

    /// Average wall time per run.
    pub fn average_run_time(&self) -> Duration {
        if self.total_runs == 0 {
            return Duration::ZERO;
        }
        let nanos = self.wall_time.as_nanos() / self.total_runs as u128;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Summary with the smallest average weighted measure.
    pub fn best_weighted(&self) -> Option<&SummaryRecord> {
        self.best.as_ref()
    }

    /// Print the report to stderr, with colors when supported.
    pub fn eprint(&self) {
        display::eprint_report(self);
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sweep Report ===")?;
        writeln!(f, "Oracle: {}", self.oracle)?;
        writeln!(f, "Combinations: {}", self.combinations)?;
        writeln!(f, "Runs per combination: {}", self.runs_per_experiment)?;
        writeln!(f, "Total runs: {}", self.total_runs)?;
        writeln!(f)?;
        writeln!(f, "Wall Time: {:?}", self.wall_time)?;
        writeln!(f, "Average Run Time: {:?}", self.average_run_time())?;

        if let Some(best) = self.best_weighted() {
            writeln!(f)?;
            writeln!(
                f,
                "Lowest weighted measure: {} at {}",
                best.averages.weighted_measure, best.params
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Summary: {}", self.summary_path.display())?;
        for path in &self.raw_paths {
            writeln!(f, "Raw log: {}", path.display())?;
        }

        Ok(())
    }
}
