//! Where results go.
//!
//! A sink knows which identifiers it already holds and appends new results durably.
//! The appender is opened on first use, so a run that appends nothing never touches
//! the filesystem.

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::OnceCell;

use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{ClassificationResult, RecordId};
use crate::io::output_log::{CompletedSet, LogAppender, OutputLog};

/// Destination for one stage's results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Identifiers already recorded. Read once per run.
    async fn completed_ids(&self) -> Result<CompletedSet>;

    /// Durably record one result. Appending an identifier twice in one run is an error.
    async fn append(&self, result: &ClassificationResult) -> Result<()>;
}

/// A single output log.
#[derive(Debug)]
pub struct LogSink {
    log: OutputLog,
    appender: OnceCell<LogAppender>,
    appended: DashSet<RecordId>,
}

impl LogSink {
    pub fn new(log: OutputLog) -> Self {
        Self {
            log,
            appender: OnceCell::new(),
            appended: DashSet::new(),
        }
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    /// Results appended through this sink so far.
    pub fn appended(&self) -> usize {
        self.appended.len()
    }
}

#[async_trait]
impl ResultSink for LogSink {
    async fn completed_ids(&self) -> Result<CompletedSet> {
        self.log.load_completed().await
    }

    async fn append(&self, result: &ClassificationResult) -> Result<()> {
        if !self.appended.insert(result.id) {
            return Err(ThememinerError::pipeline(
                "append",
                format!(
                    "record {} was already appended to {} in this run",
                    result.id,
                    self.log.path().display()
                ),
            ));
        }

        let appender = match self
            .appender
            .get_or_try_init(|| self.log.open_appender())
            .await
        {
            Ok(appender) => appender,
            Err(err) => {
                self.appended.remove(&result.id);
                return Err(err);
            }
        };
        if let Err(err) = appender.append(result).await {
            self.appended.remove(&result.id);
            return Err(err);
        }
        Ok(())
    }
}

/// Decision-stage output: accepted and rejected entries go to separate logs.
///
/// Both logs count as completed, so rejected records are never asked again.
#[derive(Debug)]
pub struct DecisionSink {
    accepted: LogSink,
    rejected: LogSink,
}

impl DecisionSink {
    pub fn new(accepted: OutputLog, rejected: OutputLog) -> Self {
        Self {
            accepted: LogSink::new(accepted),
            rejected: LogSink::new(rejected),
        }
    }

    pub fn accepted_log(&self) -> &OutputLog {
        self.accepted.log()
    }

    pub fn rejected_log(&self) -> &OutputLog {
        self.rejected.log()
    }

    pub fn accepted_count(&self) -> usize {
        self.accepted.appended()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.appended()
    }
}

#[async_trait]
impl ResultSink for DecisionSink {
    async fn completed_ids(&self) -> Result<CompletedSet> {
        let mut completed = self.accepted.completed_ids().await?;
        completed.extend(self.rejected.completed_ids().await?);
        Ok(completed)
    }

    async fn append(&self, result: &ClassificationResult) -> Result<()> {
        if result.is_rejected() {
            self.rejected.append(result).await
        } else {
            self.accepted.append(result).await
        }
    }
}
