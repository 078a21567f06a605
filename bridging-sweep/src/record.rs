//! Per-run and per-combination records and their text formats.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::grid::ParameterCombination;
use crate::oracle::{Metric, RunResult};

/// Header line of the summary CSV.
pub const SUMMARY_HEADER: &str = "runs,numParticles,lambda,c,shape,Avg rounds,Avg activations,Avg moves,Avg perimeter,Avg gap perimeter,Avg weighted measure";

/// Running sums of the six metrics for one combination.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricTotals {
    sum: RunResult,
    runs: u32,
}

impl MetricTotals {
    /// Empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one run into the totals.
    pub fn add(&mut self, result: &RunResult) {
        for metric in Metric::ALL {
            self.sum.set(metric, self.sum.get(metric) + result.get(metric));
        }
        self.runs += 1;
    }

    /// Number of runs folded in.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Metric sums.
    pub fn sum(&self) -> &RunResult {
        &self.sum
    }

    /// Arithmetic mean of every metric, `None` before the first run.
    pub fn mean(&self) -> Option<RunResult> {
        if self.runs == 0 {
            return None;
        }
        let n = f64::from(self.runs);
        let mut mean = RunResult::default();
        for metric in Metric::ALL {
            mean.set(metric, self.sum.get(metric) / n);
        }
        Some(mean)
    }
}

/// Averaged outcome of one parameter combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Repetitions averaged.
    pub runs: u32,
    /// Combination that was simulated.
    pub params: ParameterCombination,
    /// Mean of each metric over `runs` repetitions.
    pub averages: RunResult,
}

impl SummaryRecord {
    /// Close `totals` into a record; `None` if no run was folded in.
    pub fn from_totals(params: ParameterCombination, totals: &MetricTotals) -> Option<Self> {
        Some(Self {
            runs: totals.runs(),
            params,
            averages: totals.mean()?,
        })
    }

    /// CSV row matching [`SUMMARY_HEADER`], without the line terminator.
    ///
    /// Numbers use the shortest round-trip decimal form and never switch to
    /// exponent notation; non-finite values print as `inf`, `-inf` or `NaN`.
    pub fn csv_row(&self) -> String {
        let p = &self.params;
        let mut row = format!(
            "{},{},{},{},{}",
            self.runs, p.particle_count, p.lambda, p.c, p.shape
        );
        for metric in Metric::ALL {
            let _ = write!(row, ",{}", self.averages.get(metric));
        }
        row
    }
}

/// Raw log block for run number `run` of `params`.
///
/// The block ends with a blank line so consecutive runs stay visually apart.
pub fn raw_block(run: u32, params: &ParameterCombination, result: &RunResult) -> String {
    let mut block = String::new();
    let _ = writeln!(block, "Run {run} with");
    let _ = writeln!(block, "    numParticles: {}", params.particle_count);
    let _ = writeln!(block, "    lambda: {}", params.lambda);
    let _ = writeln!(block, "    c: {}", params.c);
    let _ = writeln!(block, "    shape: {}", params.shape);
    let _ = writeln!(block, "results:");
    for metric in Metric::ALL {
        let _ = writeln!(block, "    {}: {}", metric.label(), result.get(metric));
    }
    block.push('\n');
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParameterCombination {
        ParameterCombination {
            particle_count: 20,
            lambda: 3.0,
            c: 1.1,
            shape: 0,
        }
    }

    fn sample() -> RunResult {
        RunResult {
            rounds: 5.0,
            activations: 12.0,
            moves: 30.0,
            perimeter: 8.0,
            gap_perimeter: 2.0,
            weighted_measure: 1.5,
        }
    }

    #[test]
    fn test_single_run_row() {
        let mut totals = MetricTotals::new();
        totals.add(&sample());
        let record = SummaryRecord::from_totals(params(), &totals).expect("one run");
        assert_eq!(record.csv_row(), "1,20,3,1.1,0,5,12,30,8,2,1.5");
    }

    #[test]
    fn test_mean_matches_arithmetic_mean() {
        for n in 1..=5u32 {
            let mut totals = MetricTotals::new();
            let mut expected_rounds = 0.0;
            for i in 0..n {
                let r = RunResult {
                    rounds: f64::from(i * 3 + 1),
                    activations: f64::from(i * 7),
                    moves: f64::from(100 - i),
                    perimeter: 8.0,
                    gap_perimeter: f64::from(i % 2),
                    weighted_measure: f64::from(i * i),
                };
                expected_rounds += r.rounds;
                totals.add(&r);
            }
            let mean = totals.mean().expect("runs folded");
            assert_eq!(totals.runs(), n);
            assert_eq!(mean.rounds, expected_rounds / f64::from(n));
            assert_eq!(mean.perimeter, 8.0);
        }
    }

    #[test]
    fn test_empty_totals_have_no_mean() {
        let totals = MetricTotals::new();
        assert_eq!(totals.mean(), None);
        assert_eq!(SummaryRecord::from_totals(params(), &totals), None);
    }

    #[test]
    fn test_header_has_one_column_per_field() {
        let mut totals = MetricTotals::new();
        totals.add(&sample());
        let record = SummaryRecord::from_totals(params(), &totals).expect("one run");
        assert_eq!(
            SUMMARY_HEADER.split(',').count(),
            record.csv_row().split(',').count()
        );
    }

    #[test]
    fn test_extreme_values_stay_positional() {
        let mut totals = MetricTotals::new();
        totals.add(&RunResult {
            rounds: 1e21,
            activations: 1e-7,
            moves: f64::INFINITY,
            ..sample()
        });
        let record = SummaryRecord::from_totals(params(), &totals).expect("one run");
        assert_eq!(
            record.csv_row(),
            "1,20,3,1.1,0,1000000000000000000000,0.0000001,inf,8,2,1.5"
        );
    }

    #[test]
    fn test_raw_block_layout() {
        let block = raw_block(2, &params(), &sample());
        let expected = "Run 2 with\n\
            \x20   numParticles: 20\n\
            \x20   lambda: 3\n\
            \x20   c: 1.1\n\
            \x20   shape: 0\n\
            results:\n\
            \x20   rounds: 5\n\
            \x20   activations: 12\n\
            \x20   moves: 30\n\
            \x20   perimeter: 8\n\
            \x20   gap perimeter: 2\n\
            \x20   weighted measure: 1.5\n\
            \n";
        assert_eq!(block, expected);
    }
}
