//! Completion providers.
//!
//! A provider turns a [`CompletionRequest`] into raw completion text. Parsing the text is
//! the classifier's job, so a provider never judges whether the answer is well formed.

pub mod gemini;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::config::{ProviderConfig, ProviderKind};
use crate::core::errors::{Result, ThememinerError, ThememinerResultExt};

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Output format requested from the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    /// Any JSON object
    JsonObject,
    /// JSON constrained by a strict schema
    JsonSchema { name: String, schema: Value },
}

/// One prompt sent to a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub shape: ResponseShape,
}

/// A remote model able to complete a prompt.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &str;

    /// Send the request and return the raw completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Build the configured provider. Returns `None` when no API key is available.
pub fn build_provider(config: &ProviderConfig) -> Result<Option<Arc<dyn CompletionProvider>>> {
    let Some(api_key) = config.api_key() else {
        tracing::info!(
            "{} not set; no {} provider available",
            config.resolved_api_key_env(),
            config.kind
        );
        return Ok(None);
    };

    let client = http_client(config.timeout_secs)?;
    let endpoint = config.resolved_endpoint();
    let provider: Arc<dyn CompletionProvider> = match config.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(client, endpoint, api_key)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(client, endpoint, api_key)),
    };
    Ok(Some(provider))
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_generic_err("building HTTP client")
}

/// Turn a non-success response into a service error classified by status.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ThememinerError::service_status(
        status.as_u16(),
        format!("{provider} API error {status}: {}", body.trim()),
    ))
}

/// Error for a response envelope that carries no completion text.
pub(crate) fn empty_completion(provider: &str, what: &str) -> ThememinerError {
    ThememinerError::malformed(format!("{provider} response has no {what}"), "")
}
