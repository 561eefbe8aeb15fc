//! Chunk-at-a-time persistence of assembled records.

use crate::data::models::FlatRecord;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("{context}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl SinkError {
    pub(crate) fn database(context: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| SinkError::Database { context, source }
    }
}

/// Outcome of committing one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub persisted: usize,
    /// Ids of records the store refused; the rest of the chunk was kept.
    pub rejected: Vec<i32>,
}

/// Destination for assembled records.
///
/// Each call is one unit of work: every accepted record becomes visible
/// together, and a record the store refuses is dropped without affecting
/// the others.
#[async_trait::async_trait]
pub trait RecordSink: Send {
    async fn commit(&mut self, records: Vec<FlatRecord>) -> Result<CommitSummary, SinkError>;
}

/// In-memory sink used for dry runs and tests.
///
/// Applies the same rules as the `people` table: records are upserted by id
/// and a record without a name is rejected.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: BTreeMap<i32, FlatRecord>,
    commits: Vec<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored records ordered by id.
    pub fn records(&self) -> impl Iterator<Item = &FlatRecord> {
        self.records.values()
    }

    pub fn get(&self, id: i32) -> Option<&FlatRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records accepted by each commit, in commit order.
    pub fn commits(&self) -> &[usize] {
        &self.commits
    }

    pub fn into_records(self) -> Vec<FlatRecord> {
        self.records.into_values().collect()
    }
}

#[async_trait::async_trait]
impl RecordSink for MemorySink {
    async fn commit(&mut self, records: Vec<FlatRecord>) -> Result<CommitSummary, SinkError> {
        let mut summary = CommitSummary::default();
        for record in records {
            if record.name.is_none() {
                warn!(id = record.id, "record rejected: missing name");
                summary.rejected.push(record.id);
                continue;
            }
            self.records.insert(record.id, record);
            summary.persisted += 1;
        }
        self.commits.push(summary.persisted);
        Ok(summary)
    }
}
