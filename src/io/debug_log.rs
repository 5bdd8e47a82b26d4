//! Raw-completion debug log.
//!
//! When a provider answers with text that cannot be parsed into the expected shape,
//! the raw completion is kept here alongside a fingerprint of the submitted text so
//! prompts can be tuned later.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{truncate_chars, RecordId};

const EXCERPT_CHARS: usize = 400;

/// One malformed completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCompletionEntry {
    pub id: RecordId,
    pub raw: String,
    pub transcript_sha256: String,
    pub transcript_excerpt: String,
    pub logged_at: DateTime<Utc>,
}

impl RawCompletionEntry {
    pub fn new(id: RecordId, raw: impl Into<String>, transcript: &str) -> Self {
        Self {
            id,
            raw: raw.into(),
            transcript_sha256: sha256_hex(transcript),
            transcript_excerpt: truncate_chars(transcript, EXCERPT_CHARS).to_string(),
            logged_at: Utc::now(),
        }
    }
}

/// Hex-encoded SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Append-only sink for [`RawCompletionEntry`] lines.
#[derive(Debug)]
pub struct DebugLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DebugLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, entry: &RawCompletionEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.lock.lock().await;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                ThememinerError::io(
                    format!("Failed to open debug log {}", self.path.display()),
                    e,
                )
            })?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
