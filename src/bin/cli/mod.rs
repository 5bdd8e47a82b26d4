//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: command implementations
//! - config_layer: configuration layering (defaults → file → flags)
//! - output: plan and summary display

pub mod args;
pub mod commands;
pub mod config_layer;
pub mod output;

// Re-export commonly used items for convenience
pub use args::*;
pub use commands::*;
