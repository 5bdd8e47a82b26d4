//! CLI Argument Structures
//!
//! This module contains all CLI argument definitions and command structures
//! used by the thememiner binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thememiner_rs::core::config::ProviderKind;
use thememiner_rs::core::types::IdRange;
use thememiner_rs::DecisionPredicate;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resumable theme extraction and filtering over conversation archives
#[derive(Parser)]
#[command(name = "thememiner")]
#[command(version = VERSION)]
#[command(about = "Resumable theme extraction and filtering over conversation archives")]
#[command(long_about = "
Extract short theme tags from a conversation archive, then filter the tagged
conversations down to interesting and philosophically interesting ones.
Every command is resumable: re-running a range only processes what is missing.

Common Usage:

  # Tag conversations 1-50 with three requests in flight
  thememiner extract --start 1 --end 50 --concurrency 3

  # See what would run without calling the provider or writing anything
  thememiner extract --start 1 --end 500 --dry-run

  # Keep the interesting ones, asking the model instead of the keyword heuristic
  thememiner filter --stage interesting --start 1 --end 50 --use-model

  # Narrow those down further
  thememiner filter --stage philosophical --start 1 --end 50

  # Check progress over a range
  thememiner status --stage themes --start 1 --end 500
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to .thememiner.yml in the working directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory relative paths are resolved against
    #[arg(long, global = true)]
    pub workdir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract theme tags from conversations
    Extract(ExtractArgs),

    /// Refine tagged conversations with a yes/no predicate
    Filter(FilterArgs),

    /// Regenerate a stage rollup from its output log
    Rollup(RollupArgs),

    /// Show completed and pending identifiers for a stage
    Status(StatusArgs),

    /// Print default configuration in YAML format
    #[command(name = "print-default-config")]
    PrintDefaultConfig,

    /// Initialize a configuration file with defaults
    #[command(name = "init-config")]
    InitConfig(InitConfigArgs),

    /// Validate a thememiner configuration file
    #[command(name = "validate-config")]
    ValidateConfig(ValidateConfigArgs),
}

/// Inclusive 1-based identifier range
#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// First identifier (1-based)
    #[arg(long)]
    pub start: u64,

    /// Last identifier (inclusive)
    #[arg(long)]
    pub end: u64,
}

impl RangeArgs {
    pub fn range(&self) -> IdRange {
        IdRange::new(self.start, self.end)
    }
}

/// Options for commands that run the pipeline
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Maximum provider requests in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Classification provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name override
    #[arg(long)]
    pub model: Option<String>,

    /// Attempts per record for transient provider errors
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Show the planned work; no provider calls, no writes
    #[arg(long)]
    pub dry_run: bool,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Conversation archive to read
    #[arg(long)]
    pub conversations: Option<PathBuf>,

    /// Characters of transcript submitted per conversation
    #[arg(long)]
    pub max_text_chars: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Which predicate to apply
    #[arg(long, value_enum)]
    pub stage: FilterStage,

    #[command(flatten)]
    pub run: RunArgs,

    /// Ask the provider for the interesting stage instead of using the heuristic alone
    #[arg(long)]
    pub use_model: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RollupArgs {
    /// Stage whose rollup to regenerate
    #[arg(long, value_enum, default_value = "themes")]
    pub stage: Stage,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Stage to inspect
    #[arg(long, value_enum, default_value = "themes")]
    pub stage: Stage,

    #[command(flatten)]
    pub range: RangeArgs,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InitConfigArgs {
    /// Output configuration file name
    #[arg(short, long, default_value = ".thememiner.yml")]
    pub output: PathBuf,

    /// Overwrite existing configuration file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateConfigArgs {
    /// Configuration file to validate (defaults to --config or .thememiner.yml)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    Openai,
    Gemini,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Openai => ProviderKind::OpenAi,
            ProviderArg::Gemini => ProviderKind::Gemini,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterStage {
    Interesting,
    Philosophical,
}

impl FilterStage {
    pub fn predicate(self) -> DecisionPredicate {
        match self {
            FilterStage::Interesting => DecisionPredicate::Interesting,
            FilterStage::Philosophical => DecisionPredicate::Philosophical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Themes,
    Interesting,
    Philosophical,
}

impl From<FilterStage> for Stage {
    fn from(stage: FilterStage) -> Self {
        match stage {
            FilterStage::Interesting => Stage::Interesting,
            FilterStage::Philosophical => Stage::Philosophical,
        }
    }
}
