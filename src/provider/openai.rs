//! OpenAI chat-completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_status, empty_completion, CompletionProvider, CompletionRequest, ResponseShape};
use crate::core::errors::{Result, ThememinerResultExt};

/// Chat completions request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: Value,
    pub max_completion_tokens: u32,
    pub temperature: f64,
}

/// One chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatRequest {
    pub fn from_completion(request: &CompletionRequest) -> Self {
        let response_format = match &request.shape {
            ResponseShape::JsonObject => json!({"type": "json_object"}),
            ResponseShape::JsonSchema { name, schema } => json!({
                "type": "json_schema",
                "json_schema": {"name": name, "schema": schema, "strict": true}
            }),
        };
        Self {
            model: request.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(request.system.clone()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(request.user.clone()),
                },
            ],
            response_format,
            max_completion_tokens: request.max_output_tokens,
            temperature: request.temperature,
        }
    }
}

impl ChatResponse {
    /// Text of the first choice.
    pub fn into_text(self) -> Result<String> {
        self.choices
            .into_iter()
            .next()
            .ok_or_else(|| empty_completion("OpenAI", "choices"))?
            .message
            .content
            .ok_or_else(|| empty_completion("OpenAI", "message content"))
    }
}

/// Provider backed by `POST {endpoint}/chat/completions`.
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest::from_completion(request);
        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = check_status("OpenAI", response).await?;

        let text = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_json_err("OpenAI chat completion response")?;
        parsed.into_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ThememinerError;

    fn request(shape: ResponseShape) -> CompletionRequest {
        CompletionRequest {
            system: "sys".into(),
            user: "usr".into(),
            model: "gpt-4o-mini".into(),
            max_output_tokens: 80,
            temperature: 0.0,
            shape,
        }
    }

    #[test]
    fn json_object_requests_use_response_format() {
        let body = serde_json::to_value(ChatRequest::from_completion(&request(
            ResponseShape::JsonObject,
        )))
        .unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"], json!({"type": "json_object"}));
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["max_completion_tokens"], 80);
    }

    #[test]
    fn schema_requests_are_strict() {
        let schema = json!({"type": "object"});
        let body = serde_json::to_value(ChatRequest::from_completion(&request(
            ResponseShape::JsonSchema {
                name: "Decision".into(),
                schema: schema.clone(),
            },
        )))
        .unwrap();
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
        assert_eq!(body["response_format"]["json_schema"]["schema"], schema);
    }

    #[test]
    fn response_text_comes_from_first_choice() {
        let parsed: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"themes\":[]}"}}]
        }))
        .unwrap();
        assert_eq!(parsed.into_text().unwrap(), "{\"themes\":[]}");

        let empty: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            empty.into_text().unwrap_err(),
            ThememinerError::MalformedResult { .. }
        ));
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        let provider = OpenAiProvider::new(
            reqwest::Client::new(),
            "https://api.example.test/v1/",
            "k".into(),
        );
        assert_eq!(provider.url(), "https://api.example.test/v1/chat/completions");
    }
}
