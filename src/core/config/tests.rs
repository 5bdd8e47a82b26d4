use super::*;
use crate::core::errors::ThememinerError;
use std::path::Path;
use tempfile::tempdir;

fn expect_validation_error<T: std::fmt::Debug>(result: Result<T>) -> ThememinerError {
    result.expect_err("expected validation failure")
}

#[test]
fn default_configs_validate_successfully() {
    ThememinerConfig::default()
        .validate()
        .expect("thememiner default");
    PipelineConfig::default()
        .validate()
        .expect("pipeline default");
    ProviderConfig::default()
        .validate()
        .expect("provider default");
    PathsConfig::default().validate().expect("paths default");
}

#[test]
fn pipeline_config_rejects_zero_concurrency() {
    let mut config = PipelineConfig::default();
    config.concurrency = 0;
    let err = expect_validation_error(config.validate());
    assert!(matches!(err, ThememinerError::Validation { .. }));
    assert!(
        format!("{err}").contains("concurrency"),
        "unexpected error message: {err}"
    );
}

#[test]
fn pipeline_config_rejects_zero_text_cap() {
    let mut config = PipelineConfig::default();
    config.max_text_chars = 0;
    let err = expect_validation_error(config.validate());
    assert!(format!("{err}").contains("max_text_chars"));
}

#[test]
fn retry_config_requires_ordered_backoff() {
    let mut config = RetryConfig::default();
    config.initial_backoff_ms = 10_000;
    config.max_backoff_ms = 100;
    let err = expect_validation_error(config.validate());
    assert!(matches!(
        err,
        ThememinerError::Validation { field: Some(ref f), .. } if f == "pipeline.retry.max_backoff_ms"
    ));

    config.max_attempts = 0;
    config.max_backoff_ms = 20_000;
    let err = expect_validation_error(config.validate());
    assert!(format!("{err}").contains("max_attempts"));
}

#[test]
fn provider_config_rejects_out_of_range_temperature() {
    let mut config = ProviderConfig::default();
    config.temperature = 3.5;
    let err = expect_validation_error(config.validate());
    assert!(format!("{err}").contains("temperature"));
}

#[test]
fn provider_defaults_follow_kind() {
    let mut config = ProviderConfig::default();
    assert_eq!(config.resolved_api_key_env(), "OPENAI_API_KEY");
    assert_eq!(config.resolved_model(), "gpt-4o-mini");

    config.kind = ProviderKind::Gemini;
    assert_eq!(config.resolved_api_key_env(), "GEMINI_API_KEY");
    assert!(config.resolved_endpoint().contains("generativelanguage"));

    config.model = Some("gemini-custom".into());
    assert_eq!(config.resolved_decision_model(), "gemini-custom");
    config.decision_model = Some("gemini-nano".into());
    assert_eq!(config.resolved_decision_model(), "gemini-nano");
}

#[test]
fn paths_config_rejects_shared_log_files() {
    let mut config = PathsConfig::default();
    config.interesting_rejected_log = config.interesting_log.clone();
    let err = expect_validation_error(config.validate());
    assert!(format!("{err}").contains("distinct"));
}

#[test]
fn paths_can_be_rooted_in_a_workspace() {
    let config = PathsConfig::default().rooted_at(Path::new("/work"));
    assert!(config.themes_log.starts_with("/work"));
    assert!(config.conversations.ends_with("conversations.json"));

    let mut absolute = PathsConfig::default();
    absolute.themes_log = "/elsewhere/themes.jsonl".into();
    let rooted = absolute.rooted_at(Path::new("/work"));
    assert_eq!(rooted.themes_log, Path::new("/elsewhere/themes.jsonl"));
}

#[test]
fn partial_yaml_fills_defaults() {
    let yaml = r#"
pipeline:
  concurrency: 4
provider:
  kind: gemini
"#;
    let config: ThememinerConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    assert_eq!(config.pipeline.concurrency, 4);
    assert_eq!(config.pipeline.max_text_chars, 2000);
    assert_eq!(config.provider.kind, ProviderKind::Gemini);
    assert_eq!(config.provider.max_output_tokens, 80);
    assert!(!config.filter.use_model);
    config.validate().expect("partial config validates");
}

#[test]
fn yaml_file_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(".thememiner.yml");

    let mut config = ThememinerConfig::default();
    config.pipeline.concurrency = 3;
    config.filter.use_model = true;
    config.to_yaml_file(&path).expect("write config");

    let loaded = ThememinerConfig::from_yaml_file(&path).expect("read config");
    assert_eq!(loaded.pipeline.concurrency, 3);
    assert!(loaded.filter.use_model);
}

#[test]
fn missing_config_file_is_an_io_error() {
    let err = ThememinerConfig::from_yaml_file("/definitely/not/here.yml").unwrap_err();
    assert!(matches!(err, ThememinerError::Io { .. }));
}
