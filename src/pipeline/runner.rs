//! Bounded-concurrency batch runner.
//!
//! A run loads the sink's completed identifiers once, plans the complement of the
//! requested range, and drives at most `concurrency` records through
//! fetch → truncate → classify → append at a time. Per-record failures are recorded
//! in the summary and never stop the batch. The rollup, when one is attached, is
//! regenerated after every run whatever its outcome.

use std::collections::BTreeMap;
use std::path::PathBuf;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::retry::RetryPolicy;
use super::scheduler::WorkPlan;
use super::sink::ResultSink;
use crate::classify::Classifier;
use crate::core::config::PipelineConfig;
use crate::core::errors::{FailureKind, Result, ThememinerError};
use crate::core::types::{ClassificationResult, IdRange, RecordId, RecordStatus};
use crate::io::rollup::RollupTarget;
use crate::source::TextSource;

/// One record that did not complete this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub id: RecordId,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Identifiers in the requested range
    pub planned: usize,
    /// Already completed before the run
    pub skipped: usize,
    pub completed: usize,
    pub failed: usize,
    /// Failures in ascending identifier order
    pub failures: Vec<ItemFailure>,
    /// Rollup written after the run, if any
    pub rollup: Option<PathBuf>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Per-record status during a run.
#[derive(Debug, Default)]
pub struct StatusBoard {
    statuses: DashMap<RecordId, RecordStatus>,
}

impl StatusBoard {
    pub fn new(pending: &[RecordId]) -> Self {
        let statuses = DashMap::with_capacity(pending.len());
        for id in pending {
            statuses.insert(*id, RecordStatus::Pending);
        }
        Self { statuses }
    }

    pub fn set(&self, id: RecordId, status: RecordStatus) {
        self.statuses.insert(id, status);
    }

    pub fn get(&self, id: RecordId) -> Option<RecordStatus> {
        self.statuses.get(&id).map(|s| *s)
    }

    /// Ordered copy of every status.
    pub fn snapshot(&self) -> BTreeMap<RecordId, RecordStatus> {
        self.statuses
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub fn count(&self, wanted: fn(&RecordStatus) -> bool) -> usize {
        self.statuses.iter().filter(|e| wanted(e.value())).count()
    }
}

/// Resumable batch runner for one stage.
#[derive(Debug, Clone)]
pub struct BatchPipeline {
    concurrency: usize,
    max_text_chars: usize,
    retry: RetryPolicy,
    show_progress: bool,
}

impl BatchPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
            max_text_chars: config.max_text_chars,
            retry: RetryPolicy::from(&config.retry),
            show_progress: false,
        }
    }

    /// Draw an indicatif progress bar while running.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Work a run over `range` would do. Reads the sink; calls and writes nothing.
    pub async fn plan(
        &self,
        range: IdRange,
        source: &dyn TextSource,
        sink: &dyn ResultSink,
    ) -> Result<WorkPlan> {
        let completed = sink.completed_ids().await?;
        let plan = WorkPlan::for_source(range, source, &completed);
        if plan.range != range {
            debug!(requested = %range, planned = %plan.range, "range bounded by source");
        }
        Ok(plan)
    }

    /// Process every not-yet-completed identifier in `range`, then regenerate `rollup`.
    pub async fn run(
        &self,
        range: IdRange,
        source: &dyn TextSource,
        classifier: &dyn Classifier,
        sink: &dyn ResultSink,
        rollup: Option<&RollupTarget>,
    ) -> Result<RunSummary> {
        let plan = self.plan(range, source, sink).await?;
        info!(
            range = %plan.range,
            pending = plan.pending.len(),
            skipped = plan.skipped,
            concurrency = self.concurrency,
            "starting batch run"
        );

        let board = StatusBoard::new(&plan.pending);
        let progress = self.progress_bar(plan.pending.len());

        let outcomes: Vec<(RecordId, Result<()>)> = stream::iter(plan.pending.iter().copied())
            .map(|id| {
                let board = &board;
                async move {
                    board.set(id, RecordStatus::InFlight);
                    let outcome = self.process(id, source, classifier, sink).await;
                    (id, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .inspect(|_| progress.inc(1))
            .collect()
            .await;
        progress.finish_and_clear();

        let mut failures = Vec::new();
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => board.set(id, RecordStatus::Done),
                Err(err) => {
                    let kind = err.kind();
                    warn!(%id, kind = %kind, error = %err, "record not completed");
                    board.set(id, RecordStatus::Failed(kind));
                    failures.push(ItemFailure {
                        id,
                        kind,
                        message: err.to_string(),
                    });
                }
            }
        }
        failures.sort_by_key(|f| f.id);

        let rollup_path = match rollup {
            Some(target) => {
                target.regenerate().await.map_err(|e| {
                    ThememinerError::pipeline(
                        "rollup",
                        format!("failed to regenerate {}: {e}", target.path.display()),
                    )
                })?;
                debug!(path = %target.path.display(), "rollup regenerated");
                Some(target.path.clone())
            }
            None => None,
        };

        let summary = RunSummary {
            planned: plan.planned(),
            skipped: plan.skipped,
            completed: board.count(|s| *s == RecordStatus::Done),
            failed: failures.len(),
            failures,
            rollup: rollup_path,
        };
        info!(
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            "batch run finished"
        );
        Ok(summary)
    }

    async fn process(
        &self,
        id: RecordId,
        source: &dyn TextSource,
        classifier: &dyn Classifier,
        sink: &dyn ResultSink,
    ) -> Result<()> {
        let record = source.fetch(id).await?.truncated(self.max_text_chars);
        let verdict = self.retry.run(|| classifier.classify(&record)).await?;
        let result = ClassificationResult::from_verdict(&record, verdict);
        sink.append(&result).await?;
        debug!(%id, "record completed");
        Ok(())
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress || len == 0 {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar
    }
}
