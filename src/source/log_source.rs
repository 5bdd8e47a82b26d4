//! Output log used as the text source of a downstream stage.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{ClassificationResult, IdRange, Record, RecordId};
use crate::io::output_log::OutputLog;
use crate::source::TextSource;

/// Snapshot of an upstream log, keyed by identifier.
///
/// Rejected decision entries are not served; the first entry for an identifier wins.
#[derive(Debug, Clone, Default)]
pub struct UpstreamLogSource {
    entries: BTreeMap<RecordId, ClassificationResult>,
}

impl UpstreamLogSource {
    pub async fn load(log: &OutputLog) -> Result<Self> {
        Ok(Self::from_entries(log.read_entries().await?))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = ClassificationResult>) -> Self {
        let mut map = BTreeMap::new();
        for entry in entries.into_iter().filter(|e| !e.is_rejected()) {
            map.entry(entry.id).or_insert(entry);
        }
        Self { entries: map }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.entries.keys().copied()
    }
}

#[async_trait]
impl TextSource for UpstreamLogSource {
    async fn fetch(&self, id: RecordId) -> Result<Record> {
        let entry = self
            .entries
            .get(&id)
            .ok_or_else(|| ThememinerError::not_found(id))?;
        let record = Record::tagged(id, entry.tags.clone());
        Ok(match &entry.conversation_id {
            Some(conversation_id) => record.with_conversation_id(conversation_id.clone()),
            None => record,
        })
    }

    fn max_id(&self) -> Option<RecordId> {
        self.entries.keys().next_back().copied()
    }

    fn ids_in(&self, range: IdRange) -> Option<Vec<RecordId>> {
        if range.is_empty() {
            return Some(Vec::new());
        }
        Some(self.entries.range(range.start..=range.end).map(|(id, _)| *id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Decision, DecisionSource, RecordContent};

    #[tokio::test]
    async fn serves_tags_and_skips_rejected_entries() {
        let mut first = ClassificationResult::with_tags(RecordId(2), vec!["torus".into()]);
        first.conversation_id = Some("c2".into());
        let duplicate = ClassificationResult::with_tags(RecordId(2), vec!["later".into()]);
        let mut rejected = ClassificationResult::with_tags(RecordId(5), vec!["printer".into()]);
        rejected.decision = Some(Decision {
            accepted: false,
            source: DecisionSource::Heuristic,
        });

        let source = UpstreamLogSource::from_entries(vec![first, duplicate, rejected]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.max_id(), Some(RecordId(2)));

        let record = source.fetch(RecordId(2)).await.unwrap();
        assert_eq!(record.content, RecordContent::Tags(vec!["torus".into()]));
        assert_eq!(record.conversation_id.as_deref(), Some("c2"));

        let err = source.fetch(RecordId(5)).await.unwrap_err();
        assert!(matches!(err, ThememinerError::NotFound { .. }));
    }

    #[test]
    fn holds_only_the_ids_it_was_given() {
        let source = UpstreamLogSource::from_entries(
            [1, 3, 8]
                .into_iter()
                .map(|id| ClassificationResult::with_tags(RecordId(id), vec!["lattice".into()])),
        );
        assert_eq!(
            source.ids_in(IdRange::new(1, 5)),
            Some(vec![RecordId(1), RecordId(3)])
        );
        assert_eq!(source.ids_in(IdRange::new(4, 7)), Some(Vec::new()));
        assert_eq!(source.ids_in(IdRange::new(9, 2)), Some(Vec::new()));
    }
}
