//! Tests for ProcessOracle - the line protocol against a real child process.
//!
//! The simulator is played by a small POSIX shell script, so these tests only
//! run on unix.

#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use bridging_sweep::{
    IntRange, MemorySink, Metric, Oracle, OracleError, OutputConfig, ParameterCombination,
    ProcessOracle, RealRange, SweepConfig, SweepDriver, SweepError, TerminationPolicy,
};

/// Scripted simulator: rounds echo the particle count, the other metrics are fixed.
const SIMULATOR: &str = r#"
p=0
while IFS= read -r line; do
  case "$line" in
    reset*) echo ok ;;
    run*) set -- $line; p=$2; echo ok ;;
    await) echo terminated ;;
    "metric # Rounds") echo "$p" ;;
    "metric # Activations") echo 12 ;;
    "metric # Moves") echo 30 ;;
    "metric Perimeter") echo 8 ;;
    "metric Gap Perimeter") echo 2 ;;
    "metric Weighted measure") echo 1.5 ;;
    *) echo "err unknown request: $line" ;;
  esac
done
"#;

fn local_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .expect("Failed to build runtime")
}

fn spawn_script(script: &str) -> ProcessOracle {
    ProcessOracle::spawn("sh", ["-c", script]).expect("Failed to spawn sh")
}

fn params(particle_count: i64) -> ParameterCombination {
    ParameterCombination {
        particle_count,
        lambda: 4.0,
        c: 1.2,
        shape: 0,
    }
}

fn config() -> SweepConfig {
    SweepConfig {
        particles: IntRange::new(20, 30, 10),
        lambda: RealRange::single(3.0),
        c: RealRange::single(1.1),
        shapes: IntRange::single(0),
        runs_per_experiment: 1,
        output: OutputConfig {
            raw_base: PathBuf::from("raw/shape"),
            summary_path: PathBuf::from("summary.csv"),
        },
        termination: TerminationPolicy::bounded(Duration::from_secs(10)),
        ..SweepConfig::default()
    }
}

#[test]
fn test_single_run_round_trip() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script(SIMULATOR);
        oracle.reset(10, 3).await.expect("reset");
        oracle.start_run(&params(40)).await.expect("run");
        oracle.await_termination().await.expect("await");
        let result = oracle.collect().await.expect("metrics");

        assert_eq!(result.rounds, 40.0);
        assert_eq!(result.activations, 12.0);
        assert_eq!(result.weighted_measure, 1.5);
        oracle.shutdown().await.expect("shutdown");
    });
}

#[test]
fn test_sweep_against_process() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script(SIMULATOR);
        let mut sink = MemorySink::new();
        let driver = SweepDriver::new(config()).expect("valid config");
        let report = driver.run(&mut oracle, &mut sink).await.expect("sweep");

        assert_eq!(report.combinations, 2);
        let summary = sink.contents("summary.csv");
        let rows: Vec<&str> = summary.lines().skip(1).collect();
        assert_eq!(
            rows,
            vec!["1,20,3,1.1,0,20,12,30,8,2,1.5", "1,30,3,1.1,0,30,12,30,8,2,1.5"]
        );
        oracle.shutdown().await.expect("shutdown");
    });
}

#[test]
fn test_err_reply_is_rejected() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script(
            r#"while IFS= read -r line; do echo "err simulator busy"; done"#,
        );
        let err = oracle.reset(10, 3).await.unwrap_err();
        assert!(matches!(err, OracleError::Rejected(ref m) if m == "simulator busy"));
    });
}

#[test]
fn test_unexpected_reply_is_protocol_error() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script(r#"while IFS= read -r line; do echo maybe; done"#);
        let err = oracle.await_termination().await.unwrap_err();
        match err {
            OracleError::Protocol { request, reply } => {
                assert_eq!(request, "await");
                assert_eq!(reply, "maybe");
            }
            other => panic!("expected protocol error, got {other}"),
        }
    });
}

#[test]
fn test_non_numeric_metric_is_protocol_error() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script(r#"while IFS= read -r line; do echo ok; done"#);
        let err = oracle.query_metric(Metric::Moves).await.unwrap_err();
        assert!(matches!(err, OracleError::Protocol { .. }));
    });
}

#[test]
fn test_exited_simulator_is_reported() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script("exit 0");
        let err = oracle.reset(10, 3).await.unwrap_err();
        assert!(
            matches!(err, OracleError::Closed | OracleError::Io(_)),
            "unexpected error: {err}"
        );
    });
}

#[test]
fn test_missing_program_fails_to_spawn() {
    local_runtime().block_on(async {
        let err = ProcessOracle::spawn("definitely-not-a-simulator-binary", Vec::<String>::new())
            .err()
            .expect("spawn should fail");
        assert!(matches!(err, OracleError::Spawn { .. }));
    });
}

#[test]
fn test_stuck_simulator_times_out() {
    local_runtime().block_on(async {
        let mut oracle = spawn_script(
            r#"while IFS= read -r line; do
                 case "$line" in
                   await) exec sleep 1000 ;;
                   *) echo ok ;;
                 esac
               done"#,
        );
        let mut sink = MemorySink::new();
        let config = SweepConfig {
            termination: TerminationPolicy::bounded(Duration::from_millis(200)),
            ..config()
        };
        let driver = SweepDriver::new(config).expect("valid config");
        let err = driver.run(&mut oracle, &mut sink).await.unwrap_err();

        assert!(matches!(err, SweepError::TerminationTimeout { run: 1, .. }));
        assert_eq!(sink.append_count("summary.csv"), 1);
    });
}
