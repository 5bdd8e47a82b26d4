//! Gemini API request and response types, and the `generateContent` client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_status, empty_completion, CompletionProvider, CompletionRequest, ResponseShape};
use crate::core::errors::{Result, ThememinerResultExt};

/// Gemini API request structure
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    #[serde(rename = "systemInstruction")]
    pub system_instruction: GeminiContent,
    pub contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GeminiGenerationConfig,
}

/// Content block for a Gemini API request.
#[derive(Debug, Serialize)]
pub struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<GeminiPart>,
}

/// Text part within a Gemini content block.
#[derive(Debug, Serialize)]
pub struct GeminiPart {
    pub text: String,
}

/// Generation configuration for Gemini API requests.
#[derive(Debug, Serialize)]
pub struct GeminiGenerationConfig {
    pub temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

/// Response from the Gemini API.
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// Candidate response from Gemini.
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    pub content: GeminiResponseContent,
}

/// Content within a Gemini response candidate.
#[derive(Debug, Deserialize)]
pub struct GeminiResponseContent {
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

/// Text part within a Gemini response.
#[derive(Debug, Deserialize)]
pub struct GeminiResponsePart {
    #[serde(default)]
    pub text: String,
}

impl GeminiRequest {
    pub fn from_completion(request: &CompletionRequest) -> Self {
        let response_schema = match &request.shape {
            ResponseShape::JsonObject => None,
            ResponseShape::JsonSchema { schema, .. } => Some(openapi_schema(schema)),
        };
        Self {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: request.system.clone(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.user.clone(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                response_mime_type: "application/json".to_string(),
                response_schema,
            },
        }
    }
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    pub fn into_text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| empty_completion("Gemini", "candidates"))?;
        if candidate.content.parts.is_empty() {
            return Err(empty_completion("Gemini", "parts"));
        }
        Ok(candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<String>())
    }
}

/// Gemini accepts an OpenAPI subset that rejects `additionalProperties`.
fn openapi_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| key.as_str() != "additionalProperties")
                .map(|(key, value)| (key.clone(), openapi_schema(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Provider backed by `POST {endpoint}/{model}:generateContent`.
pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = GeminiRequest::from_completion(request);
        let response = self
            .client
            .post(self.url(&request.model))
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status("Gemini", response).await?;

        let text = response.text().await?;
        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_json_err("Gemini API response")?;
        parsed.into_text()
    }
}
