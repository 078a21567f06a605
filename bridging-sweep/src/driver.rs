//! The sweep driver.
//!
//! For every combination of the grid the driver performs
//! `runs_per_experiment` repetitions of reset → start → await → query, logs
//! each run to the raw log of its shape and finally appends the averaged row
//! to the summary CSV. Oracle calls are strictly sequential.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::config::SweepConfig;
use crate::error::{SweepError, SweepResult};
use crate::grid::{ParameterCombination, SweepGrid};
use crate::oracle::{Oracle, RunResult};
use crate::record::{raw_block, MetricTotals, SummaryRecord, SUMMARY_HEADER};
use crate::report::SweepReport;
use crate::sink::ResultSink;

/// Runs a configured sweep against an oracle.
#[derive(Debug, Clone)]
pub struct SweepDriver {
    config: SweepConfig,
}

impl SweepDriver {
    /// Create a driver, rejecting configurations that cannot be swept.
    pub fn new(config: SweepConfig) -> SweepResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Run the whole sweep.
    ///
    /// The summary header is appended first, then one row per combination in
    /// grid order. The first oracle or sink failure aborts the sweep; rows
    /// already appended stay in place.
    #[instrument(skip_all, fields(oracle = oracle.name()))]
    pub async fn run<O, S>(&self, oracle: &mut O, sink: &mut S) -> SweepResult<SweepReport>
    where
        O: Oracle + ?Sized,
        S: ResultSink + ?Sized,
    {
        let result = self.sweep(oracle, sink).await;
        if let Err(ref e) = result {
            error!(error = %e, "sweep aborted");
        }
        result
    }

    async fn sweep<O, S>(&self, oracle: &mut O, sink: &mut S) -> SweepResult<SweepReport>
    where
        O: Oracle + ?Sized,
        S: ResultSink + ?Sized,
    {
        let grid = SweepGrid::new(&self.config);
        let output = &self.config.output;
        let runs = self.config.runs_per_experiment;
        let start = Instant::now();

        info!(
            combinations = grid.len(),
            runs_per_experiment = runs,
            summary = %output.summary_path.display(),
            "starting sweep"
        );

        sink.append(&output.summary_path, &format!("{SUMMARY_HEADER}\n"))
            .await?;

        let mut report = SweepReport {
            oracle: oracle.name().to_string(),
            runs_per_experiment: runs,
            summary_path: output.summary_path.clone(),
            ..SweepReport::default()
        };
        let mut raw_paths = BTreeSet::new();

        for (index, params) in grid.iter().enumerate() {
            let raw_path = output.raw_path(params.shape);
            let mut totals = MetricTotals::new();

            for run in 1..=runs {
                let result = self.run_once(oracle, &params, run).await?;
                sink.append(&raw_path, &raw_block(run, &params, &result))
                    .await?;
                totals.add(&result);
            }
            raw_paths.insert(raw_path);

            let summary = SummaryRecord::from_totals(params, &totals).ok_or_else(|| {
                SweepError::InvalidConfig("combination finished without runs".to_string())
            })?;
            sink.append(&output.summary_path, &format!("{}\n", summary.csv_row()))
                .await?;

            info!(
                done = index + 1,
                total = grid.len(),
                %params,
                avg_rounds = summary.averages.rounds,
                avg_weighted = summary.averages.weighted_measure,
                "combination complete"
            );
            report.record(&summary);
        }

        report.wall_time = start.elapsed();
        report.raw_paths = raw_paths.into_iter().collect::<Vec<PathBuf>>();
        info!(
            combinations = report.combinations,
            total_runs = report.total_runs,
            wall_time = ?report.wall_time,
            "sweep completed"
        );
        Ok(report)
    }

    /// One repetition: reset, start, wait for termination, read metrics.
    async fn run_once<O>(
        &self,
        oracle: &mut O,
        params: &ParameterCombination,
        run: u32,
    ) -> SweepResult<RunResult>
    where
        O: Oracle + ?Sized,
    {
        let reset = self.config.reset;
        oracle.reset(reset.aux_a, reset.aux_b).await?;
        oracle.start_run(params).await?;

        match self.config.termination.timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, oracle.await_termination()).await
            {
                Ok(done) => done?,
                Err(_) => {
                    warn!(%params, run, ?timeout, "run did not terminate in time");
                    return Err(SweepError::TerminationTimeout {
                        combination: *params,
                        run,
                        timeout,
                    });
                }
            },
            None => oracle.await_termination().await?,
        }

        let result = oracle.collect().await?;
        debug!(%params, run, ?result, "run complete");
        Ok(result)
    }
}
