// src/sink/mod.rs
//! Import sinks: bulk insert of feedback rows, skipping rows whose dedup key
//! is already stored. A skipped duplicate is not an error.

pub mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::ingest::types::FeedbackRecord;

pub use crate::sink::sqlite::SqliteSink;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Rows dropped because their dedup key already existed.
    pub ignored: usize,
}

#[async_trait]
pub trait ImportSink: Send + Sync {
    /// Insert the batch without validation or auto-timestamps.
    async fn import_batch(&self, records: Vec<FeedbackRecord>) -> Result<ImportSummary, SinkError>;
}

/// In-memory sink keyed by dedup key. Also records every batch it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<HashMap<String, FeedbackRecord>>,
    batches: Mutex<Vec<Vec<FeedbackRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored rows, sorted by dedup key.
    pub fn rows(&self) -> Vec<FeedbackRecord> {
        let rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let mut v: Vec<_> = rows.values().cloned().collect();
        v.sort_by(|a, b| a.dedup_key().cmp(b.dedup_key()));
        v
    }

    /// Every `import_batch` call, in arrival order.
    pub fn batches(&self) -> Vec<Vec<FeedbackRecord>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ImportSink for MemorySink {
    async fn import_batch(&self, records: Vec<FeedbackRecord>) -> Result<ImportSummary, SinkError> {
        let mut summary = ImportSummary::default();
        {
            let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
            for rec in &records {
                if rows.contains_key(rec.dedup_key()) {
                    summary.ignored += 1;
                } else {
                    rows.insert(rec.dedup_key().to_string(), rec.clone());
                    summary.inserted += 1;
                }
            }
        }
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(records);
        Ok(summary)
    }
}
