//! Append-only result sinks.
//!
//! The driver never rewrites output: every record is appended to the end of
//! its file. [`FileSink`] writes to the filesystem; [`MemorySink`] keeps the
//! appends in memory for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{SweepError, SweepResult};

/// Destination for raw logs and summary rows.
#[async_trait(?Send)]
pub trait ResultSink {
    /// Append `text` to the end of `path`, creating it if needed.
    async fn append(&mut self, path: &Path, text: &str) -> SweepResult<()>;
}

/// Sink appending to files on disk.
///
/// Missing parent directories are created on first use.
#[derive(Debug, Default)]
pub struct FileSink {
    prepared: HashSet<PathBuf>,
}

impl FileSink {
    /// Create a sink.
    pub fn new() -> Self {
        Self::default()
    }

    async fn prepare(&mut self, path: &Path) -> std::io::Result<()> {
        if self.prepared.contains(path) {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        self.prepared.insert(path.to_path_buf());
        Ok(())
    }
}

#[async_trait(?Send)]
impl ResultSink for FileSink {
    async fn append(&mut self, path: &Path, text: &str) -> SweepResult<()> {
        let wrap = |source: std::io::Error| SweepError::Sink {
            path: path.to_path_buf(),
            source,
        };
        self.prepare(path).await.map_err(wrap)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(wrap)?;
        file.write_all(text.as_bytes()).await.map_err(wrap)?;
        file.flush().await.map_err(wrap)?;
        debug!(path = %path.display(), bytes = text.len(), "appended");
        Ok(())
    }
}

/// Sink recording appends in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    appends: Vec<(PathBuf, String)>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every append, in order.
    pub fn appends(&self) -> &[(PathBuf, String)] {
        &self.appends
    }

    /// Number of appends made to `path`.
    pub fn append_count(&self, path: impl AsRef<Path>) -> usize {
        let path = path.as_ref();
        self.appends.iter().filter(|(p, _)| p == path).count()
    }

    /// Concatenated content appended to `path`.
    pub fn contents(&self, path: impl AsRef<Path>) -> String {
        let path = path.as_ref();
        self.appends
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

#[async_trait(?Send)]
impl ResultSink for MemorySink {
    async fn append(&mut self, path: &Path, text: &str) -> SweepResult<()> {
        self.appends.push((path.to_path_buf(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_tracks_paths() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("Failed to build runtime");
        runtime.block_on(async {
            let mut sink = MemorySink::new();
            sink.append(Path::new("a.txt"), "one\n").await.expect("append");
            sink.append(Path::new("b.txt"), "x\n").await.expect("append");
            sink.append(Path::new("a.txt"), "two\n").await.expect("append");

            assert_eq!(sink.append_count("a.txt"), 2);
            assert_eq!(sink.contents("a.txt"), "one\ntwo\n");
            assert_eq!(sink.contents("b.txt"), "x\n");
            assert_eq!(sink.appends().len(), 3);
        });
    }
}
