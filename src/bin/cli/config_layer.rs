//! Configuration Layer Management
//!
//! Layers, lowest priority first: built-in defaults, the YAML file (`--config`, else
//! `.thememiner.yml` / `.thememiner.yaml` in the working directory), then CLI flags.

use std::path::{Path, PathBuf};

use anyhow::Context;
use thememiner_rs::core::config::ProviderKind;
use thememiner_rs::ThememinerConfig;

use crate::cli::args::{ExtractArgs, FilterArgs, GlobalArgs, RunArgs};

/// Config file names looked up in the working directory.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = [".thememiner.yml", ".thememiner.yaml"];

/// Trait for merging configuration layers
pub trait ConfigMerge<T> {
    /// Merge another configuration into this one, with the other taking priority
    fn merge_with(&mut self, other: T);
}

/// Convert CLI arguments to partial configuration overrides
pub trait FromCliArgs<T> {
    /// Create a partial configuration from CLI arguments
    fn from_cli_args(args: &T) -> Self;
}

/// Values given on the command line. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub concurrency: Option<usize>,
    pub max_text_chars: Option<usize>,
    pub max_attempts: Option<u32>,
    pub provider: Option<ProviderKind>,
    pub model: Option<String>,
    pub decision_model: Option<String>,
    pub conversations: Option<PathBuf>,
    pub use_model: Option<bool>,
}

fn run_overrides(args: &RunArgs) -> ConfigOverrides {
    ConfigOverrides {
        concurrency: args.concurrency,
        max_attempts: args.max_attempts,
        provider: args.provider.map(Into::into),
        ..ConfigOverrides::default()
    }
}

impl FromCliArgs<ExtractArgs> for ConfigOverrides {
    fn from_cli_args(args: &ExtractArgs) -> Self {
        Self {
            max_text_chars: args.max_text_chars,
            model: args.run.model.clone(),
            conversations: args.conversations.clone(),
            ..run_overrides(&args.run)
        }
    }
}

impl FromCliArgs<FilterArgs> for ConfigOverrides {
    fn from_cli_args(args: &FilterArgs) -> Self {
        Self {
            decision_model: args.run.model.clone(),
            use_model: args.use_model.then_some(true),
            ..run_overrides(&args.run)
        }
    }
}

impl ConfigMerge<ConfigOverrides> for ThememinerConfig {
    fn merge_with(&mut self, other: ConfigOverrides) {
        if let Some(concurrency) = other.concurrency {
            self.pipeline.concurrency = concurrency;
        }
        if let Some(max_text_chars) = other.max_text_chars {
            self.pipeline.max_text_chars = max_text_chars;
        }
        if let Some(max_attempts) = other.max_attempts {
            self.pipeline.retry.max_attempts = max_attempts;
        }
        if let Some(kind) = other.provider {
            if kind != self.provider.kind {
                // Endpoint and models from the file belong to the other provider.
                self.provider.endpoint = None;
                self.provider.model = None;
                self.provider.decision_model = None;
                self.provider.api_key_env = None;
            }
            self.provider.kind = kind;
        }
        if other.model.is_some() {
            self.provider.model = other.model;
        }
        if other.decision_model.is_some() {
            self.provider.decision_model = other.decision_model;
        }
        if let Some(conversations) = other.conversations {
            self.paths.conversations = conversations;
        }
        if let Some(use_model) = other.use_model {
            self.filter.use_model = use_model;
        }
    }
}

/// Working directory for relative paths.
pub fn workdir(global: &GlobalArgs) -> anyhow::Result<PathBuf> {
    match &global.workdir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}

/// The config file in effect: explicit, else the first default name that exists.
/// A relative explicit path is taken from the working directory.
pub fn resolve_config_path(explicit: Option<&Path>, workdir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(workdir.join(path));
    }
    DEFAULT_CONFIG_FILES
        .iter()
        .map(|name| workdir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Defaults, overlaid with the config file when there is one. Not yet validated.
pub fn load_file_layer(global: &GlobalArgs) -> anyhow::Result<ThememinerConfig> {
    let dir = workdir(global)?;
    match resolve_config_path(global.config.as_deref(), &dir) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration file");
            ThememinerConfig::from_yaml_file(&path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))
        }
        None => Ok(ThememinerConfig::default()),
    }
}

/// Full configuration for a command: file layer, CLI overrides, rooted paths, validated.
pub fn build_layered_config(
    global: &GlobalArgs,
    overrides: ConfigOverrides,
) -> anyhow::Result<ThememinerConfig> {
    let mut config = load_file_layer(global)?;
    config.merge_with(overrides);
    config.paths = config.paths.rooted_at(&workdir(global)?);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{ProviderArg, RangeArgs};

    fn run_args() -> RunArgs {
        RunArgs {
            range: RangeArgs { start: 1, end: 5 },
            concurrency: Some(4),
            provider: None,
            model: Some("small-model".into()),
            max_attempts: None,
            dry_run: false,
            no_progress: true,
        }
    }

    #[test]
    fn extract_flags_override_the_file_layer() {
        let args = ExtractArgs {
            run: run_args(),
            conversations: Some(PathBuf::from("export.json")),
            max_text_chars: Some(500),
        };
        let mut config = ThememinerConfig::default();
        config.merge_with(ConfigOverrides::from_cli_args(&args));

        assert_eq!(config.pipeline.concurrency, 4);
        assert_eq!(config.pipeline.max_text_chars, 500);
        assert_eq!(config.provider.model.as_deref(), Some("small-model"));
        assert_eq!(config.provider.decision_model, None);
        assert_eq!(config.paths.conversations, PathBuf::from("export.json"));
        assert_eq!(config.pipeline.retry.max_attempts, 1);
    }

    #[test]
    fn filter_model_flag_targets_the_decision_model() {
        let args = FilterArgs {
            stage: crate::cli::args::FilterStage::Interesting,
            run: run_args(),
            use_model: true,
        };
        let mut config = ThememinerConfig::default();
        config.merge_with(ConfigOverrides::from_cli_args(&args));

        assert_eq!(config.provider.model, None);
        assert_eq!(config.provider.decision_model.as_deref(), Some("small-model"));
        assert!(config.filter.use_model);
    }

    #[test]
    fn switching_provider_drops_provider_specific_settings() {
        let mut config = ThememinerConfig::default();
        config.provider.endpoint = Some("https://proxy.example.test/v1".into());
        let mut args = run_args();
        args.provider = Some(ProviderArg::Gemini);
        args.model = None;
        config.merge_with(ConfigOverrides::from_cli_args(&ExtractArgs {
            run: args,
            conversations: None,
            max_text_chars: None,
        }));

        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.provider.endpoint, None);
    }

    #[test]
    fn default_config_file_is_found_in_the_workdir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_config_path(None, dir.path()), None);

        std::fs::write(dir.path().join(".thememiner.yaml"), "pipeline:\n  concurrency: 2\n").unwrap();
        assert_eq!(
            resolve_config_path(None, dir.path()),
            Some(dir.path().join(".thememiner.yaml"))
        );

        let relative = PathBuf::from("conf/other.yml");
        assert_eq!(
            resolve_config_path(Some(&relative), dir.path()),
            Some(dir.path().join("conf/other.yml"))
        );

        let absolute = dir.path().join("abs.yml");
        assert_eq!(
            resolve_config_path(Some(&absolute), Path::new("/elsewhere")),
            Some(absolute)
        );
    }

    #[test]
    fn relative_config_flag_is_read_from_the_workdir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("run.yml"), "pipeline:\n  concurrency: 3\n").unwrap();
        let global = GlobalArgs {
            config: Some(PathBuf::from("run.yml")),
            workdir: Some(dir.path().to_path_buf()),
            ..GlobalArgs::default()
        };

        let config = build_layered_config(&global, ConfigOverrides::default()).unwrap();
        assert_eq!(config.pipeline.concurrency, 3);
    }

    #[test]
    fn layered_config_roots_paths_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".thememiner.yml"), "pipeline:\n  concurrency: 2\n").unwrap();
        let global = GlobalArgs {
            workdir: Some(dir.path().to_path_buf()),
            ..GlobalArgs::default()
        };

        let config = build_layered_config(&global, ConfigOverrides::default()).unwrap();
        assert_eq!(config.pipeline.concurrency, 2);
        assert!(config.paths.themes_log.starts_with(dir.path()));

        let bad = ConfigOverrides {
            concurrency: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(build_layered_config(&global, bad).is_err());
    }
}
