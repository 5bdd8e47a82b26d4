//! Append-only JSONL output logs.
//!
//! A log holds one [`ClassificationResult`] per line. It is read once at the start
//! of a run to derive the completed-identifier snapshot, and only appended to while
//! the run is in progress.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{ClassificationResult, RecordId};

/// Identifiers already present in one or more logs.
pub type CompletedSet = BTreeSet<RecordId>;

/// Minimal view of a line: only the identifier must parse for resume to work.
#[derive(Deserialize)]
struct IdField {
    id: RecordId,
}

/// Handle on an append-only JSONL file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLog {
    path: PathBuf,
}

impl OutputLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_lines(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ThememinerError::io(
                format!("Failed to read output log {}", self.path.display()),
                e,
            )),
        }
    }

    /// Parse every well-formed entry, in file order. A missing file is an empty log.
    pub async fn read_entries(&self) -> Result<Vec<ClassificationResult>> {
        let Some(content) = self.read_lines().await? else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<ClassificationResult>(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(
                    path = %self.path.display(),
                    line = line_no + 1,
                    error = %e,
                    "Skipping unparseable output log line"
                ),
            }
        }
        Ok(entries)
    }

    /// Identifiers present in the log. Lines without a parseable `id` are ignored.
    pub async fn load_completed(&self) -> Result<CompletedSet> {
        let Some(content) = self.read_lines().await? else {
            return Ok(CompletedSet::new());
        };

        let completed: CompletedSet = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_str::<IdField>(line).ok())
            .map(|field| field.id)
            .collect();

        debug!(
            path = %self.path.display(),
            completed = completed.len(),
            "Loaded completed identifiers"
        );
        Ok(completed)
    }

    /// Open the log for appending, creating it and its parent directory if needed.
    pub async fn open_appender(&self) -> Result<LogAppender> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ThememinerError::io(
                        format!("Failed to create directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                ThememinerError::io(
                    format!("Failed to open output log {}", self.path.display()),
                    e,
                )
            })?;

        Ok(LogAppender {
            path: self.path.clone(),
            file: Mutex::new(file),
            appended: AtomicUsize::new(0),
        })
    }
}

/// Single-writer appender. Each line is written, flushed and synced under the lock
/// so concurrent tasks never interleave partial lines.
#[derive(Debug)]
pub struct LogAppender {
    path: PathBuf,
    file: Mutex<File>,
    appended: AtomicUsize,
}

impl LogAppender {
    pub async fn append(&self, result: &ClassificationResult) -> Result<()> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await.map_err(|e| {
            ThememinerError::io(format!("Failed to append to {}", self.path.display()), e)
        })?;
        file.flush().await?;
        file.sync_data().await?;
        drop(file);

        self.appended.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Lines appended through this handle.
    pub fn appended(&self) -> usize {
        self.appended.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
