//! Deterministic in-process oracle.
//!
//! `MockOracle` stands in for the simulator in tests and dry runs. It enforces
//! the same call discipline the real simulator expects (reset before every
//! run, no metrics before termination) and records every call it receives.

use std::collections::VecDeque;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

use crate::error::OracleError;
use crate::grid::ParameterCombination;

use super::{Metric, Oracle, RunResult};

/// One call observed by a [`MockOracle`].
#[derive(Debug, Clone, PartialEq)]
pub enum OracleCall {
    /// `reset(aux_a, aux_b)`
    Reset(i64, i64),
    /// `start_run(params)`
    StartRun(ParameterCombination),
    /// `await_termination()`
    AwaitTermination,
    /// `query_metric(metric)`
    QueryMetric(Metric),
}

enum Script {
    /// Pops results in order; the last one repeats once the queue is drained.
    Queue {
        pending: VecDeque<RunResult>,
        last: RunResult,
    },
    /// Draws plausible integer-valued metrics from a seeded RNG.
    Seeded(ChaCha8Rng),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Reset,
    Running,
    Terminated,
}

/// Scripted stand-in for the simulator.
pub struct MockOracle {
    script: Script,
    hang: bool,
    phase: Phase,
    current: Option<RunResult>,
    calls: Vec<OracleCall>,
}

impl MockOracle {
    /// Oracle returning the same result for every run.
    pub fn constant(result: RunResult) -> Self {
        Self::scripted(vec![result])
    }

    /// Oracle returning `results` in order, repeating the last one afterwards.
    ///
    /// An empty script yields all-zero metrics.
    pub fn scripted(results: Vec<RunResult>) -> Self {
        let last = results.last().copied().unwrap_or_default();
        Self::with_script(Script::Queue {
            pending: results.into(),
            last,
        })
    }

    /// Oracle generating reproducible synthetic metrics from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_script(Script::Seeded(ChaCha8Rng::seed_from_u64(seed)))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            hang: false,
            phase: Phase::Idle,
            current: None,
            calls: Vec::new(),
        }
    }

    /// Never signal termination.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> &[OracleCall] {
        &self.calls
    }

    /// Number of runs started so far.
    pub fn runs_started(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, OracleCall::StartRun(_)))
            .count()
    }

    fn next_result(&mut self, params: &ParameterCombination) -> RunResult {
        match &mut self.script {
            Script::Queue { pending, last } => pending.pop_front().unwrap_or(*last),
            Script::Seeded(rng) => {
                let n = params.particle_count.max(1) as f64;
                let perimeter = (2.0 * n).sqrt().ceil() * 2.0 + rng.random_range(0..8) as f64;
                let gap_perimeter = rng.random_range(0..=(params.particle_count.max(1) / 4)) as f64;
                let activations = n * rng.random_range(500..2_000) as f64;
                RunResult {
                    rounds: (activations / n).floor(),
                    activations,
                    moves: (activations * rng.random_range(0.05..0.3)).floor(),
                    perimeter,
                    gap_perimeter,
                    weighted_measure: perimeter + params.c * gap_perimeter,
                }
            }
        }
    }

    fn expect_phase(&self, expected: Phase, request: &str) -> Result<(), OracleError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(OracleError::Rejected(format!(
                "{request} while {:?}, expected {:?}",
                self.phase, expected
            )))
        }
    }
}

#[async_trait(?Send)]
impl Oracle for MockOracle {
    fn name(&self) -> &str {
        "mock"
    }

    async fn reset(&mut self, aux_a: i64, aux_b: i64) -> Result<(), OracleError> {
        self.calls.push(OracleCall::Reset(aux_a, aux_b));
        self.phase = Phase::Reset;
        self.current = None;
        Ok(())
    }

    async fn start_run(&mut self, params: &ParameterCombination) -> Result<(), OracleError> {
        self.calls.push(OracleCall::StartRun(*params));
        self.expect_phase(Phase::Reset, "start_run")?;
        let result = self.next_result(params);
        trace!(%params, ?result, "mock run scheduled");
        self.current = Some(result);
        self.phase = Phase::Running;
        Ok(())
    }

    async fn await_termination(&mut self) -> Result<(), OracleError> {
        self.calls.push(OracleCall::AwaitTermination);
        self.expect_phase(Phase::Running, "await_termination")?;
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.phase = Phase::Terminated;
        Ok(())
    }

    async fn query_metric(&mut self, metric: Metric) -> Result<f64, OracleError> {
        self.calls.push(OracleCall::QueryMetric(metric));
        self.expect_phase(Phase::Terminated, "query_metric")?;
        self.current
            .map(|r| r.get(metric))
            .ok_or_else(|| OracleError::Rejected("no completed run".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParameterCombination {
        ParameterCombination {
            particle_count: 40,
            lambda: 4.0,
            c: 1.2,
            shape: 0,
        }
    }

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("Failed to build runtime")
            .block_on(f)
    }

    async fn one_run(oracle: &mut MockOracle) -> Result<RunResult, OracleError> {
        oracle.reset(10, 3).await?;
        oracle.start_run(&params()).await?;
        oracle.await_termination().await?;
        oracle.collect().await
    }

    #[test]
    fn test_scripted_results_in_order_then_repeat() {
        block_on(async {
            let first = RunResult {
                rounds: 4.0,
                ..RunResult::default()
            };
            let second = RunResult {
                rounds: 6.0,
                ..RunResult::default()
            };
            let mut oracle = MockOracle::scripted(vec![first, second]);
            assert_eq!(one_run(&mut oracle).await.expect("run"), first);
            assert_eq!(one_run(&mut oracle).await.expect("run"), second);
            assert_eq!(one_run(&mut oracle).await.expect("run"), second);
            assert_eq!(oracle.runs_started(), 3);
        });
    }

    #[test]
    fn test_seeded_is_reproducible() {
        block_on(async {
            let mut a = MockOracle::seeded(7);
            let mut b = MockOracle::seeded(7);
            for _ in 0..5 {
                let ra = one_run(&mut a).await.expect("run");
                let rb = one_run(&mut b).await.expect("run");
                assert_eq!(ra, rb);
                assert!(ra.rounds >= 0.0 && ra.moves <= ra.activations);
            }
        });
    }

    #[test]
    fn test_run_without_reset_is_rejected() {
        block_on(async {
            let mut oracle = MockOracle::constant(RunResult::default());
            let err = oracle.start_run(&params()).await.expect_err("expected an error");
            assert!(matches!(err, OracleError::Rejected(_)));
        });
    }

    #[test]
    fn test_query_before_termination_is_rejected() {
        block_on(async {
            let mut oracle = MockOracle::constant(RunResult::default());
            oracle.reset(10, 3).await.expect("reset");
            oracle.start_run(&params()).await.expect("start");
            assert!(oracle.query_metric(Metric::Rounds).await.is_err());
        });
    }

    #[test]
    fn test_call_log() {
        block_on(async {
            let mut oracle = MockOracle::constant(RunResult::default());
            one_run(&mut oracle).await.expect("run");
            let calls = oracle.calls();
            assert_eq!(calls[0], OracleCall::Reset(10, 3));
            assert_eq!(calls[1], OracleCall::StartRun(params()));
            assert_eq!(calls[2], OracleCall::AwaitTermination);
            assert_eq!(calls.len(), 3 + Metric::ALL.len());
        });
    }
}
