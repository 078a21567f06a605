//! Oracle backed by an external simulator process.
//!
//! The simulator is spawned once and driven over a line protocol on its
//! stdin/stdout. Every request is a single line and is answered by a single
//! line:
//!
//! | Request | Reply |
//! |---------|-------|
//! | `reset <a> <b>` | `ok` |
//! | `run <particles> <lambda> <c> <shape>` | `ok` |
//! | `await` | `terminated` |
//! | `metric <name>` | decimal number |
//!
//! Any request may instead be answered with `err <message>`. The simulator's
//! stderr is inherited so its own diagnostics stay visible.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::error::OracleError;
use crate::grid::ParameterCombination;

use super::{Metric, Oracle};

/// Live oracle speaking the line protocol to a child process.
///
/// The child is killed when the oracle is dropped. A request interrupted by a
/// timeout leaves the stream mid-reply, so the oracle should be dropped rather
/// than reused after the driver gives up on it.
pub struct ProcessOracle {
    program: String,
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ProcessOracle {
    /// Spawn `program` with `args`. Must be called inside a tokio runtime.
    pub fn spawn<I, A>(program: impl Into<String>, args: I) -> Result<Self, OracleError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<std::ffi::OsStr>,
    {
        let program = program.into();
        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OracleError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(OracleError::Closed)?;
        let stdout = child.stdout.take().ok_or(OracleError::Closed)?;
        info!(program = %program, pid = ?child.id(), "simulator started");

        Ok(Self {
            program,
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    /// Send one request line and read the reply line.
    async fn request(&mut self, request: String) -> Result<String, OracleError> {
        debug!(request = %request, "oracle request");
        self.stdin.write_all(request.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let reply = self.stdout.next_line().await?.ok_or(OracleError::Closed)?;
        let reply = reply.trim().to_string();
        debug!(reply = %reply, "oracle reply");

        if let Some(message) = reply.strip_prefix("err") {
            return Err(OracleError::Rejected(message.trim().to_string()));
        }
        Ok(reply)
    }

    /// Send `request` and require `expected` as the reply.
    async fn exchange(&mut self, request: String, expected: &str) -> Result<(), OracleError> {
        let reply = self.request(request.clone()).await?;
        if reply == expected {
            Ok(())
        } else {
            Err(OracleError::Protocol { request, reply })
        }
    }

    /// Ask the simulator to exit and wait for it.
    pub async fn shutdown(mut self) -> Result<(), OracleError> {
        drop(self.stdin);
        let status = self.child.wait().await?;
        info!(program = %self.program, %status, "simulator exited");
        Ok(())
    }
}

#[async_trait(?Send)]
impl Oracle for ProcessOracle {
    fn name(&self) -> &str {
        &self.program
    }

    async fn reset(&mut self, aux_a: i64, aux_b: i64) -> Result<(), OracleError> {
        self.exchange(format!("reset {aux_a} {aux_b}"), "ok").await
    }

    async fn start_run(&mut self, params: &ParameterCombination) -> Result<(), OracleError> {
        self.exchange(
            format!(
                "run {} {} {} {}",
                params.particle_count, params.lambda, params.c, params.shape
            ),
            "ok",
        )
        .await
    }

    async fn await_termination(&mut self) -> Result<(), OracleError> {
        self.exchange("await".to_string(), "terminated").await
    }

    async fn query_metric(&mut self, metric: Metric) -> Result<f64, OracleError> {
        let request = format!("metric {}", metric.host_name());
        let reply = self.request(request.clone()).await?;
        reply
            .parse::<f64>()
            .map_err(|_| OracleError::Protocol { request, reply })
    }
}
