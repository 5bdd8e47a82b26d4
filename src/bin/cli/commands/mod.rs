//! CLI Command Implementations
//!
//! - extract: theme extraction over the conversation archive
//! - filter: refine-stage predicates over an upstream log
//! - rollup: regenerate a stage rollup
//! - status: completed / pending identifiers of a stage
//! - config: configuration management commands

pub mod config;
pub mod extract;
pub mod filter;
pub mod rollup;
pub mod status;

use anyhow::Context;
use thememiner_rs::core::config::PathsConfig;
use thememiner_rs::{
    ConversationArchive, DecisionPredicate, DecisionSink, LogSink, OutputLog, ResultSink,
    RollupKind, RollupTarget, TextSource, UpstreamLogSource,
};

use crate::cli::args::Stage;

pub use config::{init_config, print_default_config, validate_config};
pub use extract::extract_command;
pub use filter::filter_command;
pub use rollup::rollup_command;
pub use status::status_command;

/// Files a stage reads and writes.
#[derive(Debug, Clone)]
pub struct StageLayout {
    pub name: &'static str,
    /// Log of accepted (or, for themes, all) results
    pub log: OutputLog,
    /// Rejected decisions, for refine stages
    pub rejected: Option<OutputLog>,
    /// Log the stage reads its records from, for refine stages
    pub upstream: Option<OutputLog>,
    pub rollup: RollupTarget,
}

impl StageLayout {
    pub fn for_stage(stage: Stage, paths: &PathsConfig) -> Self {
        match stage {
            Stage::Themes => {
                let log = OutputLog::new(&paths.themes_log);
                Self {
                    name: "themes",
                    rollup: RollupTarget::new(&paths.themes_rollup, RollupKind::Themes, log.clone()),
                    log,
                    rejected: None,
                    upstream: None,
                }
            }
            Stage::Interesting => Self::decision(
                DecisionPredicate::Interesting,
                &paths.interesting_log,
                &paths.interesting_rejected_log,
                &paths.interesting_rollup,
                &paths.themes_log,
            ),
            Stage::Philosophical => Self::decision(
                DecisionPredicate::Philosophical,
                &paths.philosophical_log,
                &paths.philosophical_rejected_log,
                &paths.philosophical_rollup,
                &paths.interesting_log,
            ),
        }
    }

    fn decision(
        predicate: DecisionPredicate,
        log: &std::path::Path,
        rejected: &std::path::Path,
        rollup: &std::path::Path,
        upstream: &std::path::Path,
    ) -> Self {
        let log = OutputLog::new(log);
        let kind = RollupKind::Accepted {
            title: predicate.rollup_title().to_string(),
        };
        Self {
            name: predicate.as_str(),
            rollup: RollupTarget::new(rollup, kind, log.clone()),
            log,
            rejected: Some(OutputLog::new(rejected)),
            upstream: Some(OutputLog::new(upstream)),
        }
    }

    /// Records the stage classifies: the archive for themes, the upstream log otherwise.
    /// A missing upstream log reads as empty.
    pub async fn load_source(&self, paths: &PathsConfig) -> anyhow::Result<Box<dyn TextSource>> {
        match &self.upstream {
            Some(upstream) => Ok(Box::new(UpstreamLogSource::load(upstream).await?)),
            None => {
                let archive = ConversationArchive::load(&paths.conversations)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to load conversations from {}",
                            paths.conversations.display()
                        )
                    })?;
                Ok(Box::new(archive))
            }
        }
    }

    /// Sink matching the stage's log layout.
    pub fn sink(&self) -> Box<dyn ResultSink> {
        match &self.rejected {
            Some(rejected) => Box::new(DecisionSink::new(self.log.clone(), rejected.clone())),
            None => Box::new(LogSink::new(self.log.clone())),
        }
    }
}
