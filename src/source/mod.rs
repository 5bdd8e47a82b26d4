//! Text sources: where record content comes from.
//!
//! - **conversations**: a chat-archive export (`conversations.json`)
//! - **log_source**: an upstream output log, feeding the refine stages

pub mod conversations;
pub mod log_source;

use async_trait::async_trait;

use crate::core::errors::Result;
use crate::core::types::{IdRange, Record, RecordId};

pub use conversations::ConversationArchive;
pub use log_source::UpstreamLogSource;

/// Identifier → record lookup.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch the record for `id`. Fails with `NotFound` when the source has none.
    async fn fetch(&self, id: RecordId) -> Result<Record>;

    /// Highest identifier the source can serve, when it knows its extent.
    fn max_id(&self) -> Option<RecordId> {
        None
    }

    /// Identifiers the source actually holds within `range`, for sparse sources.
    /// `None` means every identifier up to `max_id` is served.
    fn ids_in(&self, _range: IdRange) -> Option<Vec<RecordId>> {
        None
    }
}
