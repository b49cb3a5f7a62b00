//! Persistence seam for finished sessions.
//!
//! The engine only produces [`TestResultRecord`]s; where they go is up to the
//! host. The CLI writes them to a directory, tests keep them in memory.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::report::TestResultRecord;

/// Destination for finalized result records.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Human-readable sink name (e.g. "json-dir").
    fn name(&self) -> &str;

    /// Persist a record, returning a locator for it (a path, a key, an id).
    async fn store(&self, record: &TestResultRecord) -> anyhow::Result<String>;
}

/// Keeps records in memory. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<TestResultRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far.
    pub fn records(&self) -> Vec<TestResultRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn store(&self, record: &TestResultRecord) -> anyhow::Result<String> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink lock poisoned"))?;
        records.push(record.clone());
        Ok(record.id.to_string())
    }
}
