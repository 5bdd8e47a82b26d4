//! Configuration types and management for thememiner.
//!
//! Configuration is layered: built-in defaults, then an optional YAML file, then
//! command-line overrides (applied by the binary). Provider credentials are never
//! stored here; only the name of the environment variable that holds them.

pub mod validation;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, ThememinerError};

pub use validation::{
    validate_bounded_usize, validate_non_empty, validate_positive_u32, validate_positive_u64,
    validate_positive_usize,
};

/// Main configuration for a thememiner workspace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThememinerConfig {
    /// Scheduling and resume behavior
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Classification provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Locations of sources, output logs and rollups
    #[serde(default)]
    pub paths: PathsConfig,

    /// Refine-stage options
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Configuration construction and I/O methods for [`ThememinerConfig`].
impl ThememinerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            ThememinerError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml_file(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content).map_err(|e| {
            ThememinerError::io(
                format!("Failed to write config file: {}", path.display()),
                e,
            )
        })
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.provider.validate()?;
        self.paths.validate()?;
        Ok(())
    }
}

/// Scheduling, truncation and retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of records in flight at once
    #[serde(default = "PipelineConfig::default_concurrency")]
    pub concurrency: usize,

    /// Transcripts longer than this many characters are truncated before submission
    #[serde(default = "PipelineConfig::default_max_text_chars")]
    pub max_text_chars: usize,

    /// Automatic retry for transient provider failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: Self::default_concurrency(),
            max_text_chars: Self::default_max_text_chars(),
            retry: RetryConfig::default(),
        }
    }
}

impl PipelineConfig {
    const fn default_concurrency() -> usize {
        1
    }

    const fn default_max_text_chars() -> usize {
        2000
    }

    /// Validate pipeline settings
    pub fn validate(&self) -> Result<()> {
        validate_bounded_usize(self.concurrency, 1, 256, "pipeline.concurrency")?;
        validate_positive_usize(self.max_text_chars, "pipeline.max_text_chars")?;
        self.retry.validate()
    }
}

/// Bounded exponential backoff for transient provider errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per record, including the first (1 disables retry)
    #[serde(default = "RetryConfig::default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt
    #[serde(default = "RetryConfig::default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay
    #[serde(default = "RetryConfig::default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::default_max_attempts(),
            initial_backoff_ms: Self::default_initial_backoff_ms(),
            max_backoff_ms: Self::default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    const fn default_max_attempts() -> u32 {
        1
    }

    const fn default_initial_backoff_ms() -> u64 {
        500
    }

    const fn default_max_backoff_ms() -> u64 {
        8_000
    }

    /// Validate retry settings
    pub fn validate(&self) -> Result<()> {
        validate_positive_u32(self.max_attempts, "pipeline.retry.max_attempts")?;
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(ThememinerError::validation_field(
                "max_backoff_ms must be at least initial_backoff_ms",
                "pipeline.retry.max_backoff_ms",
            ));
        }
        Ok(())
    }
}

/// Supported classification providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Environment variable conventionally holding the key for this provider.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Gemini => "gemini-2.0-flash",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which provider API to call
    #[serde(default)]
    pub kind: ProviderKind,

    /// Model used for tag extraction (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Model used for refine-stage decisions (falls back to `model`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_model: Option<String>,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Environment variable holding the API key (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Completion budget for tag extraction
    #[serde(default = "ProviderConfig::default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f64,

    /// Per-request timeout
    #[serde(default = "ProviderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            model: None,
            decision_model: None,
            endpoint: None,
            api_key_env: None,
            max_output_tokens: Self::default_max_output_tokens(),
            temperature: 0.0,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    const fn default_max_output_tokens() -> u32 {
        80
    }

    const fn default_timeout_secs() -> u64 {
        60
    }

    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.kind.default_model().to_string())
    }

    pub fn resolved_decision_model(&self) -> String {
        self.decision_model
            .clone()
            .unwrap_or_else(|| self.resolved_model())
    }

    pub fn resolved_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.kind.default_endpoint().to_string())
    }

    pub fn resolved_api_key_env(&self) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| self.kind.default_api_key_env().to_string())
    }

    /// Read the API key from the environment, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(self.resolved_api_key_env())
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Validate provider settings
    pub fn validate(&self) -> Result<()> {
        validate_positive_u32(self.max_output_tokens, "provider.max_output_tokens")?;
        validate_positive_u64(self.timeout_secs, "provider.timeout_secs")?;
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ThememinerError::validation_field(
                "temperature must be between 0.0 and 2.0",
                "provider.temperature",
            ));
        }
        if let Some(model) = &self.model {
            validate_non_empty(model, "provider.model")?;
        }
        Ok(())
    }
}

/// Locations of sources, output logs and rollups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Conversation archive export
    #[serde(default = "PathsConfig::default_conversations")]
    pub conversations: PathBuf,

    /// Tag extraction output log
    #[serde(default = "PathsConfig::default_themes_log")]
    pub themes_log: PathBuf,

    /// Distinct-tag rollup
    #[serde(default = "PathsConfig::default_themes_rollup")]
    pub themes_rollup: PathBuf,

    /// Raw completions that failed to parse
    #[serde(default = "PathsConfig::default_debug_log")]
    pub debug_log: PathBuf,

    /// Accepted entries of the "interesting" stage
    #[serde(default = "PathsConfig::default_interesting_log")]
    pub interesting_log: PathBuf,

    /// Rejected entries of the "interesting" stage
    #[serde(default = "PathsConfig::default_interesting_rejected_log")]
    pub interesting_rejected_log: PathBuf,

    #[serde(default = "PathsConfig::default_interesting_rollup")]
    pub interesting_rollup: PathBuf,

    /// Accepted entries of the "philosophical" stage
    #[serde(default = "PathsConfig::default_philosophical_log")]
    pub philosophical_log: PathBuf,

    /// Rejected entries of the "philosophical" stage
    #[serde(default = "PathsConfig::default_philosophical_rejected_log")]
    pub philosophical_rejected_log: PathBuf,

    #[serde(default = "PathsConfig::default_philosophical_rollup")]
    pub philosophical_rollup: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            conversations: Self::default_conversations(),
            themes_log: Self::default_themes_log(),
            themes_rollup: Self::default_themes_rollup(),
            debug_log: Self::default_debug_log(),
            interesting_log: Self::default_interesting_log(),
            interesting_rejected_log: Self::default_interesting_rejected_log(),
            interesting_rollup: Self::default_interesting_rollup(),
            philosophical_log: Self::default_philosophical_log(),
            philosophical_rejected_log: Self::default_philosophical_rejected_log(),
            philosophical_rollup: Self::default_philosophical_rollup(),
        }
    }
}

const THEMES_DIR: &str = "GPTConversationAnalysis/themes";

fn themes_path(file: &str) -> PathBuf {
    PathBuf::from(THEMES_DIR).join(file)
}

impl PathsConfig {
    fn default_conversations() -> PathBuf {
        PathBuf::from("PersonalDocuments/conversations.json")
    }

    fn default_themes_log() -> PathBuf {
        themes_path("themes_per_conversation.jsonl")
    }

    fn default_themes_rollup() -> PathBuf {
        themes_path("themes_rollup.md")
    }

    fn default_debug_log() -> PathBuf {
        themes_path("raw_completion_errors.jsonl")
    }

    fn default_interesting_log() -> PathBuf {
        themes_path("interesting_conversations.jsonl")
    }

    fn default_interesting_rejected_log() -> PathBuf {
        themes_path("interesting_conversations.rejected.jsonl")
    }

    fn default_interesting_rollup() -> PathBuf {
        themes_path("interesting_rollup.md")
    }

    fn default_philosophical_log() -> PathBuf {
        themes_path("philosophically_interesting_conversations.jsonl")
    }

    fn default_philosophical_rejected_log() -> PathBuf {
        themes_path("philosophically_interesting_conversations.rejected.jsonl")
    }

    fn default_philosophical_rollup() -> PathBuf {
        themes_path("philosophical_rollup.md")
    }

    /// Re-root every relative path under `base`.
    pub fn rooted_at(mut self, base: &std::path::Path) -> Self {
        for path in self.all_mut() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    fn all_mut(&mut self) -> [&mut PathBuf; 10] {
        [
            &mut self.conversations,
            &mut self.themes_log,
            &mut self.themes_rollup,
            &mut self.debug_log,
            &mut self.interesting_log,
            &mut self.interesting_rejected_log,
            &mut self.interesting_rollup,
            &mut self.philosophical_log,
            &mut self.philosophical_rejected_log,
            &mut self.philosophical_rollup,
        ]
    }

    /// Validate path settings
    pub fn validate(&self) -> Result<()> {
        let logs = [
            ("paths.themes_log", &self.themes_log),
            ("paths.interesting_log", &self.interesting_log),
            ("paths.interesting_rejected_log", &self.interesting_rejected_log),
            ("paths.philosophical_log", &self.philosophical_log),
            (
                "paths.philosophical_rejected_log",
                &self.philosophical_rejected_log,
            ),
        ];
        for (i, (field, path)) in logs.iter().enumerate() {
            if path.as_os_str().is_empty() {
                return Err(ThememinerError::validation_field("path must not be empty", *field));
            }
            if logs[..i].iter().any(|(_, other)| other == path) {
                return Err(ThememinerError::validation_field(
                    "output logs must be distinct files",
                    *field,
                ));
            }
        }
        Ok(())
    }
}

/// Refine-stage options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Consult the provider for the "interesting" stage instead of the heuristic alone
    #[serde(default)]
    pub use_model: bool,
}
