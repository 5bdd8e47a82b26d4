//! Resumable batch pipeline.

pub mod retry;
pub mod runner;
pub mod scheduler;
pub mod sink;

pub use retry::RetryPolicy;
pub use runner::{BatchPipeline, ItemFailure, RunSummary, StatusBoard};
pub use scheduler::WorkPlan;
pub use sink::{DecisionSink, LogSink, ResultSink};
