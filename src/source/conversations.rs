//! Conversation archive source.
//!
//! Reads a chat export that is either a JSON array of conversations or an object
//! with a `conversations` array. Record `n` is the n-th conversation (1-based).
//! Transcripts are flattened to `role: text` lines; three layouts are understood:
//! a `messages`/`history` list, a `mapping` tree of message nodes, or a bare value.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::core::errors::{Result, ThememinerError, ThememinerResultExt};
use crate::core::types::{Record, RecordId};
use crate::source::TextSource;

/// In-memory conversation export.
#[derive(Debug, Clone)]
pub struct ConversationArchive {
    conversations: Vec<Value>,
}

impl ConversationArchive {
    /// Load an export from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ThememinerError::io(
                format!("Failed to read conversation archive {}", path.display()),
                e,
            )
        })?;
        let value: Value = serde_json::from_str(&content).map_json_err("conversation archive")?;
        Self::from_value(value)
    }

    /// Build from an already-parsed export.
    pub fn from_value(value: Value) -> Result<Self> {
        let conversations = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("conversations") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ThememinerError::validation(
                        "Unsupported conversation archive structure: expected an array or a `conversations` array",
                    ))
                }
            },
            _ => {
                return Err(ThememinerError::validation(
                    "Unsupported conversation archive structure",
                ))
            }
        };
        Ok(Self { conversations })
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    fn get(&self, id: RecordId) -> Option<&Value> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.conversations.get(index)
    }
}

#[async_trait]
impl TextSource for ConversationArchive {
    async fn fetch(&self, id: RecordId) -> Result<Record> {
        let conversation = self
            .get(id)
            .ok_or_else(|| ThememinerError::not_found(id))?;
        Ok(Record::transcript(id, extract_transcript(conversation))
            .with_conversation_id(conversation_id(conversation, id)))
    }

    fn max_id(&self) -> Option<RecordId> {
        Some(RecordId(self.conversations.len() as u64))
    }
}

/// External id of a conversation, or a positional fallback like `conv-00042`.
pub fn conversation_id(conversation: &Value, id: RecordId) -> String {
    ["id", "conversation_id"]
        .iter()
        .filter_map(|key| conversation.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("conv-{:05}", id.get()))
}

/// Flatten a conversation to transcript text. No length cap is applied here.
pub fn extract_transcript(conversation: &Value) -> String {
    if let Some(obj) = conversation.as_object() {
        let listed = obj
            .get("messages")
            .filter(|v| is_present(v))
            .or_else(|| obj.get("history").filter(|v| is_present(v)));
        if let Some(messages) = listed {
            return messages_to_text(messages);
        }
        if let Some(Value::Object(mapping)) = obj.get("mapping") {
            return mapping_to_text(mapping);
        }
    }
    messages_to_text(conversation)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

fn messages_to_text(messages: &Value) -> String {
    let entries: Vec<&Value> = match messages {
        Value::Object(obj) if obj.contains_key("messages") => match &obj["messages"] {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        },
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    entries
        .into_iter()
        .map(|entry| match entry {
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                let role = first_str(obj, &["role", "speaker"]).unwrap_or_default();
                let content = obj
                    .get("content")
                    .filter(|v| is_present(v))
                    .or_else(|| obj.get("text"))
                    .map(stringify_content)
                    .unwrap_or_default();
                with_role(role, &content)
            }
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn mapping_to_text(mapping: &Map<String, Value>) -> String {
    let mut lines = Vec::new();
    let mut visited = HashSet::new();

    // Walk from the roots along `children`, so messages come out in thread order.
    let roots: Vec<&String> = mapping
        .iter()
        .filter(|(_, node)| {
            node.get("parent")
                .and_then(Value::as_str)
                .map_or(true, |parent| !mapping.contains_key(parent))
        })
        .map(|(key, _)| key)
        .collect();

    let mut stack: Vec<&str> = roots.iter().rev().map(|k| k.as_str()).collect();
    while let Some(key) = stack.pop() {
        if !visited.insert(key) {
            continue;
        }
        let Some(node) = mapping.get(key) else {
            continue;
        };
        if let Some(line) = node_line(node) {
            lines.push(line);
        }
        if let Some(Value::Array(children)) = node.get("children") {
            for child in children.iter().rev().filter_map(Value::as_str) {
                stack.push(child);
            }
        }
    }

    lines.join("\n")
}

fn node_line(node: &Value) -> Option<String> {
    let message = node.get("message")?.as_object()?;
    let role = message
        .get("author")
        .and_then(Value::as_object)
        .and_then(|author| first_str(author, &["role", "name"]))
        .unwrap_or_default();
    let text = message.get("content").map(stringify_content).unwrap_or_default();
    if text.is_empty() {
        None
    } else {
        Some(with_role(role, &text))
    }
}

fn with_role(role: &str, content: &str) -> String {
    if role.is_empty() {
        content.to_string()
    } else {
        format!("{role}: {content}")
    }
}

fn first_str<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

fn join_parts(parts: &[Value]) -> String {
    parts
        .iter()
        .map(|p| match p {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Flatten a message `content` field to plain text.
pub fn stringify_content(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => {
                    if let Some(text) = first_str(obj, &["text", "value"]) {
                        Some(text.to_string())
                    } else if let Some(Value::Array(parts)) = obj.get("parts") {
                        Some(join_parts(parts))
                    } else {
                        None
                    }
                }
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(obj) => {
            if let Some(Value::Array(parts)) = obj.get("parts") {
                let joined = join_parts(parts);
                if !joined.is_empty() {
                    return joined;
                }
                return first_str(obj, &["text"]).unwrap_or_default().to_string();
            }
            match first_str(obj, &["text", "content"]) {
                Some(text) => text.to_string(),
                None => content.to_string(),
            }
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RecordContent;
    use serde_json::json;

    #[test]
    fn messages_layout_is_role_prefixed() {
        let conv = json!({
            "id": "abc",
            "messages": [
                {"role": "user", "content": "What is a torus?"},
                {"role": "assistant", "content": [{"type": "text", "text": "A donut."}]},
                "bare line"
            ]
        });
        assert_eq!(
            extract_transcript(&conv),
            "user: What is a torus?\nassistant: A donut.\nbare line"
        );
    }

    #[test]
    fn mapping_layout_follows_thread_order() {
        let conv = json!({
            "mapping": {
                "z-root": {"message": null, "parent": null, "children": ["b-first"]},
                "b-first": {
                    "parent": "z-root",
                    "children": ["a-second"],
                    "message": {"author": {"role": "user"}, "content": {"parts": ["hello"]}}
                },
                "a-second": {
                    "parent": "b-first",
                    "children": [],
                    "message": {"author": {"role": "assistant"}, "content": {"parts": ["hi", "there"]}}
                }
            }
        });
        assert_eq!(extract_transcript(&conv), "user: hello\nassistant: hi there");
    }

    #[test]
    fn content_shapes_are_flattened() {
        assert_eq!(stringify_content(&json!(null)), "");
        assert_eq!(stringify_content(&json!("plain")), "plain");
        assert_eq!(
            stringify_content(&json!([{"value": "v"}, {"parts": ["p1", "p2"]}, 3])),
            "v p1 p2"
        );
        assert_eq!(stringify_content(&json!({"content": "inner"})), "inner");
        assert_eq!(stringify_content(&json!({"other": 1})), r#"{"other":1}"#);
    }

    #[test]
    fn conversation_ids_fall_back_to_position() {
        assert_eq!(conversation_id(&json!({"id": "x1"}), RecordId(1)), "x1");
        assert_eq!(
            conversation_id(&json!({"conversation_id": 77}), RecordId(1)),
            "77"
        );
        assert_eq!(conversation_id(&json!({}), RecordId(42)), "conv-00042");
    }

    #[test]
    fn archive_accepts_wrapped_exports() {
        let archive = ConversationArchive::from_value(json!({
            "conversations": [{"messages": ["one"]}, {"messages": ["two"]}]
        }))
        .unwrap();
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.max_id(), Some(RecordId(2)));

        assert!(ConversationArchive::from_value(json!({"nope": []})).is_err());
        assert!(ConversationArchive::from_value(json!("text")).is_err());
    }

    #[tokio::test]
    async fn fetch_is_one_based_and_reports_missing_records() {
        let archive = ConversationArchive::from_value(json!([
            {"id": "first", "messages": [{"role": "user", "content": "a"}]},
            {"messages": [{"role": "user", "content": "b"}]}
        ]))
        .unwrap();

        let record = archive.fetch(RecordId(1)).await.unwrap();
        assert_eq!(record.conversation_id.as_deref(), Some("first"));
        assert_eq!(record.content, RecordContent::Transcript("user: a".into()));

        let record = archive.fetch(RecordId(2)).await.unwrap();
        assert_eq!(record.conversation_id.as_deref(), Some("conv-00002"));

        for missing in [0, 3] {
            let err = archive.fetch(RecordId(missing)).await.unwrap_err();
            assert!(matches!(err, ThememinerError::NotFound { .. }));
        }
    }
}
