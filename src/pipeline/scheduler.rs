//! Work planning against an immutable completed snapshot.

use serde::Serialize;

use crate::core::types::{IdRange, RecordId};
use crate::io::output_log::CompletedSet;
use crate::source::TextSource;

/// Which identifiers of a range still need work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkPlan {
    pub range: IdRange,
    /// Ascending identifiers to submit
    pub pending: Vec<RecordId>,
    /// Identifiers in range already present in the log
    pub skipped: usize,
}

impl WorkPlan {
    /// Complement of `completed` within `range`. `completed` is never consulted again.
    pub fn build(range: IdRange, completed: &CompletedSet) -> Self {
        Self::from_candidates(range, range.iter(), completed)
    }

    /// Plan against what `source` can serve: the range starts at 1, ends at the
    /// source's last identifier, and covers only the identifiers a sparse source holds.
    pub fn for_source(range: IdRange, source: &dyn TextSource, completed: &CompletedSet) -> Self {
        let mut range = range.one_based();
        if let Some(max) = source.max_id() {
            range = range.clamp_end(max.get());
        }
        match source.ids_in(range) {
            Some(ids) => Self::from_candidates(range, ids, completed),
            None => Self::build(range, completed),
        }
    }

    fn from_candidates(
        range: IdRange,
        candidates: impl IntoIterator<Item = RecordId>,
        completed: &CompletedSet,
    ) -> Self {
        let mut pending = Vec::new();
        let mut skipped = 0;
        for id in candidates {
            if completed.contains(&id) {
                skipped += 1;
            } else {
                pending.push(id);
            }
        }
        Self {
            range,
            pending,
            skipped,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Identifiers in range, whether pending or skipped.
    pub fn planned(&self) -> usize {
        self.pending.len() + self.skipped
    }
}
