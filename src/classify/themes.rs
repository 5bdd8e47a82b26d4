//! Theme tag extraction.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::Classifier;
use crate::core::config::ProviderConfig;
use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{Record, Verdict};
use crate::io::debug_log::{DebugLog, RawCompletionEntry};
use crate::provider::{CompletionProvider, CompletionRequest, ResponseShape};

pub const SYSTEM_PROMPT: &str = "You are a concise tagger. Extract 3-7 very short theme tags \
(1-3 words each) that capture the main topics. Return strict JSON: \
{\"themes\":[\"tag1\",\"tag2\",...]} with no other keys, no summary, no extra text.";

pub const USER_PROMPT_HEADER: &str =
    "Transcript follows. Return ONLY JSON with a 'themes' array.\n\nTRANSCRIPT:\n";

/// Longest tag kept, in characters.
pub const MAX_TAG_CHARS: usize = 40;
/// Most tags kept per record.
pub const MAX_TAGS: usize = 7;

/// Extracts a handful of short theme tags from a transcript.
pub struct ThemeExtractor {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    max_output_tokens: u32,
    temperature: f64,
    debug_log: Option<Arc<DebugLog>>,
}

impl ThemeExtractor {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &ProviderConfig) -> Self {
        Self {
            provider,
            model: config.resolved_model(),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            debug_log: None,
        }
    }

    /// Keep raw completions that fail to parse.
    pub fn with_debug_log(mut self, debug_log: Arc<DebugLog>) -> Self {
        self.debug_log = Some(debug_log);
        self
    }

    fn request(&self, transcript: &str) -> CompletionRequest {
        CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            user: format!("{USER_PROMPT_HEADER}{transcript}"),
            model: self.model.clone(),
            max_output_tokens: self.max_output_tokens,
            temperature: self.temperature,
            shape: ResponseShape::JsonObject,
        }
    }
}

#[async_trait]
impl Classifier for ThemeExtractor {
    async fn classify(&self, record: &Record) -> Result<Verdict> {
        if record.content.is_blank() {
            debug!(id = %record.id, "blank transcript, recording no themes");
            return Ok(Verdict::Tags(Vec::new()));
        }

        let transcript = record.content.as_text();
        let raw = self.provider.complete(&self.request(&transcript)).await?;

        match parse_theme_completion(&raw) {
            Ok(tags) => Ok(Verdict::Tags(tags)),
            Err(err) => {
                if let Some(debug_log) = &self.debug_log {
                    let entry = RawCompletionEntry::new(record.id, raw.as_str(), &transcript);
                    if let Err(log_err) = debug_log.record(&entry).await {
                        warn!(id = %record.id, error = %log_err, "failed to write debug log");
                    }
                }
                Err(err)
            }
        }
    }
}

/// Parse `{"themes": [...]}` and normalize the tags.
///
/// Anything else, including an object whose tags all normalize away, is malformed.
pub fn parse_theme_completion(raw: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ThememinerError::malformed(format!("completion is not JSON: {e}"), raw))?;

    let Some(Value::Array(items)) = value.get("themes") else {
        return Err(ThememinerError::malformed(
            "completion has no 'themes' array",
            raw,
        ));
    };

    let tags = normalize_tags(items.iter().map(|item| match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }));
    if tags.is_empty() {
        return Err(ThememinerError::malformed("completion has no usable themes", raw));
    }
    Ok(tags)
}

/// Trim, drop empties, cap length, drop case-insensitive duplicates, keep at most seven.
pub fn normalize_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .filter_map(|tag| {
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                return None;
            }
            let capped: String = trimmed.chars().take(MAX_TAG_CHARS).collect();
            let capped = capped.trim_end().to_string();
            seen.insert(capped.to_lowercase()).then_some(capped)
        })
        .take(MAX_TAGS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RecordId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct CannedProvider {
        reply: String,
        calls: AtomicUsize,
        last_user: Mutex<Option<String>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                last_user: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user.lock().unwrap() = Some(request.user.clone());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn tags_are_normalized() {
        let long = "x".repeat(60);
        let tags = parse_theme_completion(&format!(
            r#"{{"themes": [" Geometry ", "", "geometry", "{long}", 42, "a", "b", "c", "d", "e"]}}"#
        ))
        .unwrap();
        assert_eq!(tags.len(), 7);
        assert_eq!(tags[0], "Geometry");
        assert_eq!(tags[1].chars().count(), 40);
        assert_eq!(tags[2], "42");
    }

    #[test]
    fn malformed_completions_are_rejected() {
        for raw in ["not json", r#"{"tags": ["a"]}"#, r#"{"themes": "a"}"#, r#"{"themes": ["  "]}"#] {
            let err = parse_theme_completion(raw).unwrap_err();
            assert!(
                matches!(err, ThememinerError::MalformedResult { .. }),
                "{raw} gave {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn blank_transcripts_skip_the_provider() {
        let provider = CannedProvider::new(r#"{"themes": ["x"]}"#);
        let extractor = ThemeExtractor::new(provider.clone(), &ProviderConfig::default());

        let verdict = extractor
            .classify(&Record::transcript(RecordId(1), "   \n"))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Tags(Vec::new()));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transcript_is_sent_after_the_header() {
        let provider = CannedProvider::new(r#"{"themes": ["torus", "ritual"]}"#);
        let extractor = ThemeExtractor::new(provider.clone(), &ProviderConfig::default());

        let verdict = extractor
            .classify(&Record::transcript(RecordId(1), "user: donuts"))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Tags(vec!["torus".into(), "ritual".into()]));
        let sent = provider.last_user.lock().unwrap().clone().unwrap();
        assert!(sent.starts_with(USER_PROMPT_HEADER));
        assert!(sent.ends_with("user: donuts"));
    }

    #[tokio::test]
    async fn unparseable_completions_are_kept_in_the_debug_log() {
        let dir = tempfile::tempdir().unwrap();
        let debug_log = Arc::new(DebugLog::new(dir.path().join("raw.jsonl")));
        let provider = CannedProvider::new("Sure! Here are some themes: geometry");
        let extractor = ThemeExtractor::new(provider, &ProviderConfig::default())
            .with_debug_log(debug_log.clone());

        let err = extractor
            .classify(&Record::transcript(RecordId(4), "user: shapes"))
            .await
            .unwrap_err();
        assert!(matches!(err, ThememinerError::MalformedResult { .. }));

        let logged = std::fs::read_to_string(debug_log.path()).unwrap();
        let entry: RawCompletionEntry = serde_json::from_str(logged.trim()).unwrap();
        assert_eq!(entry.id, RecordId(4));
        assert_eq!(entry.raw, "Sure! Here are some themes: geometry");
    }
}
