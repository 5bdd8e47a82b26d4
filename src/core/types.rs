//! Record and result types shared by every pipeline stage.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::FailureKind;

/// Identifier of one unit of input work: a 1-based index into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Raw index value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Inclusive identifier range `[start, end]`. Empty when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    pub start: RecordId,
    pub end: RecordId,
}

impl IdRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start: RecordId(start),
            end: RecordId(end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end.0 - self.start.0).saturating_add(1)
        }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.start <= id && id <= self.end
    }

    /// Identifiers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RecordId> {
        (self.start.0..=self.end.0).map(RecordId)
    }

    /// Raise the lower bound to 1; identifiers are 1-based.
    pub fn one_based(self) -> Self {
        Self {
            start: RecordId(self.start.0.max(1)),
            end: self.end,
        }
    }

    /// Clamp the upper bound to `max` (e.g. the size of the source).
    pub fn clamp_end(self, max: u64) -> Self {
        Self {
            start: self.start,
            end: RecordId(self.end.0.min(max)),
        }
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// What a record carries into classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordContent {
    /// Raw transcript text, truncated before submission
    Transcript(String),
    /// Tags produced by an upstream stage
    Tags(Vec<String>),
}

impl RecordContent {
    /// Text form used for prompts and heuristics.
    pub fn as_text(&self) -> String {
        match self {
            Self::Transcript(text) => text.clone(),
            Self::Tags(tags) => tags.join(", "),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Transcript(text) => text.trim().is_empty(),
            Self::Tags(tags) => tags.iter().all(|t| t.trim().is_empty()),
        }
    }
}

/// One unit of input work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    /// Identifier assigned by the upstream document store, when it has one
    pub conversation_id: Option<String>,
    pub content: RecordContent,
}

impl Record {
    pub fn transcript(id: RecordId, text: impl Into<String>) -> Self {
        Self {
            id,
            conversation_id: None,
            content: RecordContent::Transcript(text.into()),
        }
    }

    pub fn tagged(id: RecordId, tags: Vec<String>) -> Self {
        Self {
            id,
            conversation_id: None,
            content: RecordContent::Tags(tags),
        }
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Apply the length cap to transcript content. Tags pass through untouched.
    pub fn truncated(mut self, max_chars: usize) -> Self {
        if let RecordContent::Transcript(text) = &mut self.content {
            let cut = truncate_chars(text, max_chars).len();
            text.truncate(cut);
        }
        self
    }

    /// Tags carried by the record, if it came from an upstream stage.
    pub fn tags(&self) -> &[String] {
        match &self.content {
            RecordContent::Tags(tags) => tags,
            RecordContent::Transcript(_) => &[],
        }
    }
}

/// Processing state of a record within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum RecordStatus {
    Pending,
    InFlight,
    Done,
    Failed(FailureKind),
}

/// Who made a boolean decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Provider,
    Heuristic,
}

/// Boolean outcome of a refine-stage predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub accepted: bool,
    pub source: DecisionSource,
}

/// Output of a classifier for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Tags(Vec<String>),
    Decision {
        decision: Decision,
        rationale: Option<String>,
    },
}

/// One line of an output log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(rename = "themes", default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl ClassificationResult {
    pub fn with_tags(id: RecordId, tags: Vec<String>) -> Self {
        Self {
            id,
            conversation_id: None,
            tags,
            decision: None,
            rationale: None,
        }
    }

    /// Combine a record with its verdict. Decisions keep the record's upstream tags.
    pub fn from_verdict(record: &Record, verdict: Verdict) -> Self {
        let (tags, decision, rationale) = match verdict {
            Verdict::Tags(tags) => (tags, None, None),
            Verdict::Decision {
                decision,
                rationale,
            } => (record.tags().to_vec(), Some(decision), rationale),
        };
        Self {
            id: record.id,
            conversation_id: record.conversation_id.clone(),
            tags,
            decision,
            rationale,
        }
    }

    /// True for decision results that were rejected.
    pub fn is_rejected(&self) -> bool {
        self.decision.map(|d| !d.accepted).unwrap_or(false)
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_inclusive_and_ordered() {
        let range = IdRange::new(2, 5);
        let ids: Vec<u64> = range.iter().map(RecordId::get).collect();
        assert_eq!(ids, vec![2, 3, 4, 5]);
        assert_eq!(range.len(), 4);
        assert!(range.contains(RecordId(5)));
        assert!(!range.contains(RecordId(6)));
    }

    #[test]
    fn range_edges_do_not_overflow() {
        assert_eq!(IdRange::new(0, u64::MAX).len(), u64::MAX);
        assert_eq!(IdRange::new(1, u64::MAX).len(), u64::MAX);

        let range = IdRange::new(0, 2).one_based();
        assert_eq!(range.start, RecordId(1));
        assert_eq!(range.len(), 2);
        assert!(IdRange::new(0, 0).one_based().is_empty());
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = IdRange::new(5, 1);
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.iter().count(), 0);
    }

    #[test]
    fn clamp_end_can_empty_a_range() {
        assert_eq!(IdRange::new(1, 100).clamp_end(10), IdRange::new(1, 10));
        assert!(IdRange::new(20, 30).clamp_end(10).is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("σ-algebra", 2), "σ-");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn record_truncation_only_touches_transcripts() {
        let record = Record::transcript(RecordId(1), "abcdef").truncated(3);
        assert_eq!(record.content, RecordContent::Transcript("abc".into()));

        let tags = vec!["a very long tag indeed".to_string()];
        let record = Record::tagged(RecordId(2), tags.clone()).truncated(3);
        assert_eq!(record.content, RecordContent::Tags(tags));
    }

    #[test]
    fn result_line_shape() {
        let result = ClassificationResult::with_tags(RecordId(3), vec!["geometry".into()]);
        let line = serde_json::to_string(&result).unwrap();
        assert_eq!(line, r#"{"id":3,"themes":["geometry"]}"#);

        let parsed: ClassificationResult = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn decision_results_keep_upstream_tags() {
        let record = Record::tagged(RecordId(4), vec!["torus".into(), "topology".into()])
            .with_conversation_id("c-4");
        let result = ClassificationResult::from_verdict(
            &record,
            Verdict::Decision {
                decision: Decision {
                    accepted: false,
                    source: DecisionSource::Heuristic,
                },
                rationale: Some("no signal".into()),
            },
        );
        assert_eq!(result.tags, vec!["torus", "topology"]);
        assert_eq!(result.conversation_id.as_deref(), Some("c-4"));
        assert!(result.is_rejected());
    }
}
