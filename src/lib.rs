//! # thememiner: resumable theme extraction over conversation archives
//!
//! Reads a range of records, asks a language-model provider to classify each one under
//! a concurrency cap, and appends every result to a JSONL output log the moment it is
//! produced. Re-running the same range only submits what is still missing.
//!
//! Two kinds of stage share the same runner:
//!
//! - **Extraction**: transcript → a handful of short theme tags
//! - **Refinement**: tags from an upstream log → a boolean decision, with a keyword
//!   heuristic whenever the provider is missing or answers nonsense
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Sources    │ → │  Classifiers │ → │    Sinks     │ → │    Rollup    │
//! │ • archive    │   │ • themes     │   │ • output log │   │ • themes     │
//! │ • upstream   │   │ • decision   │   │ • accepted / │   │ • accepted   │
//! │   log        │   │   + heuristic│   │   rejected   │   │              │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!                    Providers: OpenAI, Gemini
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use thememiner_rs::{
//!     build_provider, BatchPipeline, ConversationArchive, IdRange, LogSink, OutputLog,
//!     RollupKind, RollupTarget, ThemeExtractor, ThememinerConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ThememinerConfig::default();
//!     let provider = build_provider(&config.provider)?.ok_or("no API key")?;
//!     let archive = ConversationArchive::load(&config.paths.conversations).await?;
//!     let extractor = ThemeExtractor::new(provider, &config.provider);
//!     let log = OutputLog::new(&config.paths.themes_log);
//!     let rollup = RollupTarget::new(&config.paths.themes_rollup, RollupKind::Themes, log.clone());
//!
//!     let summary = BatchPipeline::new(&config.pipeline)
//!         .run(IdRange::new(1, 10), &archive, &extractor, &LogSink::new(log), Some(&rollup))
//!         .await?;
//!     println!("{} completed, {} failed", summary.completed, summary.failed);
//!     Ok(())
//! }
//! ```

#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod core {
    //! Errors, configuration and shared record types.

    pub mod config;
    pub mod errors;
    pub mod types;
}

pub mod io {
    //! Output logs, the raw-completion debug log and rollup views.

    pub mod debug_log;
    pub mod output_log;
    pub mod rollup;
}

pub mod classify;
pub mod pipeline;
pub mod provider;
pub mod source;

// Re-export primary types for convenience
pub use classify::{Classifier, DecisionClassifier, DecisionPredicate, ThemeExtractor};
pub use core::config::ThememinerConfig;
pub use core::errors::{FailureKind, Result, ThememinerError, ThememinerResultExt};
pub use core::types::{ClassificationResult, IdRange, Record, RecordId, Verdict};
pub use io::output_log::{CompletedSet, OutputLog};
pub use io::rollup::{RollupKind, RollupTarget};
pub use pipeline::{BatchPipeline, DecisionSink, LogSink, ResultSink, RunSummary, WorkPlan};
pub use provider::{build_provider, CompletionProvider};
pub use source::{ConversationArchive, TextSource, UpstreamLogSource};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
