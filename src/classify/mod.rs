//! Classifiers: record → verdict.
//!
//! - **themes**: short tag extraction over transcripts
//! - **decision**: boolean refine-stage predicates, with heuristic fallback
//! - **heuristics**: the keyword fallbacks, as pure functions

pub mod decision;
pub mod heuristics;
pub mod themes;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::types::{Record, Verdict};

pub use decision::{DecisionClassifier, DecisionPredicate};
pub use themes::ThemeExtractor;

/// Produces a verdict for one record.
///
/// Errors are per-record: the pipeline records the failure and moves on.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, record: &Record) -> Result<Verdict>;
}
