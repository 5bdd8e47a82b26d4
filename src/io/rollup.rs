//! Rollup views derived from output logs.
//!
//! A rollup is regenerated wholesale from its log every time; it is never patched.
//! [`render_rollup`] is pure, so two renders of the same log are byte-identical.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, ThememinerError};
use crate::core::types::{ClassificationResult, RecordId};
use crate::io::output_log::OutputLog;

/// Which summary to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollupKind {
    /// Sorted set of every distinct tag
    Themes,
    /// Accepted entries of a decision stage, by identifier
    Accepted { title: String },
}

/// Render a rollup from log entries.
pub fn render_rollup(kind: &RollupKind, entries: &[ClassificationResult]) -> String {
    match kind {
        RollupKind::Themes => render_themes(entries),
        RollupKind::Accepted { title } => render_accepted(title, entries),
    }
}

fn render_themes(entries: &[ClassificationResult]) -> String {
    let unique: BTreeSet<&str> = entries
        .iter()
        .flat_map(|entry| entry.tags.iter())
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect();

    let mut out = String::from("# Conversation Themes Rollup\n\n");
    for tag in unique {
        out.push_str("- ");
        out.push_str(tag);
        out.push('\n');
    }
    out
}

fn render_accepted(title: &str, entries: &[ClassificationResult]) -> String {
    // First entry per identifier wins, matching append order.
    let mut by_id: BTreeMap<RecordId, &ClassificationResult> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.is_rejected()) {
        by_id.entry(entry.id).or_insert(entry);
    }

    let mut out = format!("# {title}\n\n");
    out.push_str(&format!("{} accepted\n\n", by_id.len()));
    for (id, entry) in by_id {
        out.push_str(&format!("- {id}"));
        if let Some(conversation_id) = &entry.conversation_id {
            out.push_str(&format!(" ({conversation_id})"));
        }
        if !entry.tags.is_empty() {
            out.push_str(": ");
            out.push_str(&entry.tags.join(", "));
        }
        out.push('\n');
    }
    out
}

/// Regenerate `target` from the full contents of `log`. Returns the rendered text.
pub async fn write_rollup(target: &Path, kind: &RollupKind, log: &OutputLog) -> Result<String> {
    let entries = log.read_entries().await?;
    let rendered = render_rollup(kind, &entries);

    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(target, &rendered).await.map_err(|e| {
        ThememinerError::io(format!("Failed to write rollup {}", target.display()), e)
    })?;
    Ok(rendered)
}

/// A rollup file bound to the log it summarizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupTarget {
    pub path: PathBuf,
    pub kind: RollupKind,
    pub log: OutputLog,
}

impl RollupTarget {
    pub fn new(path: impl Into<PathBuf>, kind: RollupKind, log: OutputLog) -> Self {
        Self {
            path: path.into(),
            kind,
            log,
        }
    }

    /// Overwrite the rollup from the log's current contents.
    pub async fn regenerate(&self) -> Result<String> {
        write_rollup(&self.path, &self.kind, &self.log).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Decision, DecisionSource};

    fn tagged(id: u64, tags: &[&str]) -> ClassificationResult {
        ClassificationResult::with_tags(RecordId(id), tags.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn themes_rollup_is_sorted_and_distinct() {
        let entries = vec![
            tagged(2, &["topology", "geometry"]),
            tagged(1, &["geometry", "  ", " ritual "]),
        ];
        let rendered = render_rollup(&RollupKind::Themes, &entries);
        assert_eq!(
            rendered,
            "# Conversation Themes Rollup\n\n- geometry\n- ritual\n- topology\n"
        );
    }

    #[test]
    fn themes_rollup_ignores_entry_order() {
        let a = vec![tagged(1, &["b"]), tagged(2, &["a"])];
        let b = vec![tagged(2, &["a"]), tagged(1, &["b"])];
        assert_eq!(
            render_rollup(&RollupKind::Themes, &a),
            render_rollup(&RollupKind::Themes, &b)
        );
    }

    #[test]
    fn accepted_rollup_lists_entries_by_id() {
        let mut accepted = tagged(7, &["torus"]);
        accepted.conversation_id = Some("abc".into());
        accepted.decision = Some(Decision {
            accepted: true,
            source: DecisionSource::Provider,
        });
        let mut rejected = tagged(3, &["printer"]);
        rejected.decision = Some(Decision {
            accepted: false,
            source: DecisionSource::Heuristic,
        });

        let kind = RollupKind::Accepted {
            title: "Interesting Conversations".into(),
        };
        let rendered = render_rollup(&kind, &[accepted, rejected, tagged(5, &[])]);
        assert_eq!(
            rendered,
            "# Interesting Conversations\n\n2 accepted\n\n- 5\n- 7 (abc): torus\n"
        );
    }

    #[tokio::test]
    async fn write_rollup_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let log = OutputLog::new(dir.path().join("themes.jsonl"));
        let target = dir.path().join("out/rollup.md");
        std::fs::create_dir_all(dir.path().join("out")).unwrap();
        std::fs::write(&target, "stale content that is much longer than the new rollup").unwrap();

        let appender = log.open_appender().await.unwrap();
        appender.append(&tagged(1, &["geometry"])).await.unwrap();

        let first = write_rollup(&target, &RollupKind::Themes, &log).await.unwrap();
        let on_disk = std::fs::read_to_string(&target).unwrap();
        assert_eq!(first, on_disk);
        assert!(!on_disk.contains("stale"));

        let second = write_rollup(&target, &RollupKind::Themes, &log).await.unwrap();
        assert_eq!(first, second);
    }
}
