//! In-memory sources and classifiers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use thememiner_rs::core::types::{Record, RecordId, Verdict};
use thememiner_rs::{Classifier, Result, TextSource, ThememinerError};

/// Serves `transcript {id}` for ids `1..=len`.
pub struct MemorySource {
    pub len: u64,
}

#[async_trait]
impl TextSource for MemorySource {
    async fn fetch(&self, id: RecordId) -> Result<Record> {
        if id.get() == 0 || id.get() > self.len {
            return Err(ThememinerError::not_found(id));
        }
        Ok(Record::transcript(id, format!("transcript {id}")))
    }

    fn max_id(&self) -> Option<RecordId> {
        Some(RecordId(self.len))
    }
}

/// Answers with fixed tags, failing for a chosen set of ids. Records every call.
pub struct ScriptedClassifier {
    tags: Vec<String>,
    failing: Mutex<BTreeSet<RecordId>>,
    calls: Mutex<Vec<RecordId>>,
    transient: bool,
}

impl ScriptedClassifier {
    pub fn tagging(tags: &[&str]) -> Self {
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            failing: Mutex::new(BTreeSet::new()),
            calls: Mutex::new(Vec::new()),
            transient: false,
        }
    }

    pub fn failing_on(self, ids: impl IntoIterator<Item = u64>) -> Self {
        *self.failing.lock().unwrap() = ids.into_iter().map(RecordId).collect();
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn recover(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Every call in id order, repeats included.
    pub fn calls(&self) -> Vec<RecordId> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, record: &Record) -> Result<Verdict> {
        self.calls.lock().unwrap().push(record.id);
        tokio::task::yield_now().await;
        let failed = {
            let mut failing = self.failing.lock().unwrap();
            // Transient failures clear after one attempt.
            if self.transient {
                failing.remove(&record.id)
            } else {
                failing.contains(&record.id)
            }
        };
        if failed {
            return Err(if self.transient {
                ThememinerError::service_transient("provider overloaded")
            } else {
                ThememinerError::service_permanent("provider rejected the request")
            });
        }
        Ok(Verdict::Tags(self.tags.clone()))
    }
}

pub fn ids(values: impl IntoIterator<Item = u64>) -> Vec<RecordId> {
    values.into_iter().map(RecordId).collect()
}
