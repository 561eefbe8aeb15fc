//! The fetch → assemble → commit loop.

use crate::data::sink::{RecordSink, SinkError};
use crate::harvest::assembler::{Assembly, RecordAssembler, SkipReason};
use crate::harvest::fetcher::{BatchFetcher, ChunkFetchError};
use crate::harvest::resolver::ReferenceResolver;
use crate::swapi::{ResourceKind, ResourceSource};
use crate::utils::fmt_duration;
use futures::StreamExt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] ChunkFetchError),
    #[error("committing chunk {chunk} failed")]
    Commit {
        chunk: usize,
        #[source]
        source: SinkError,
    },
}

/// Run parameters for one harvest.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub ids: RangeInclusive<u32>,
    pub chunk_size: usize,
    /// Upper bound on in-flight reference fetches across the whole run.
    pub reference_concurrency: usize,
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks: usize,
    pub fetched: usize,
    pub persisted: usize,
    pub not_found: usize,
    pub failed: usize,
    pub rejected: usize,
}

/// Harvests people from a resource source into a record sink.
///
/// Chunks are handled strictly one after another: the next chunk's fetches
/// are not issued until the current chunk has been committed.
pub struct Pipeline {
    fetcher: BatchFetcher,
    assembler: RecordAssembler,
    settings: HarvestSettings,
}

impl Pipeline {
    pub fn new(source: Arc<dyn ResourceSource>, settings: HarvestSettings) -> Self {
        let resolver = ReferenceResolver::new(source.clone(), settings.reference_concurrency);
        Self {
            fetcher: BatchFetcher::new(source, ResourceKind::People, settings.chunk_size),
            assembler: RecordAssembler::new(resolver),
            settings,
        }
    }

    pub async fn run(&self, sink: &mut dyn RecordSink) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();
        let chunks = self.fetcher.run(self.settings.ids.clone());
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let start = Instant::now();
            let chunk = chunk?;
            summary.chunks += 1;
            summary.fetched += chunk.payloads.len();

            let mut records = Vec::with_capacity(chunk.payloads.len());
            for assembly in self.assembler.assemble_all(chunk.payloads).await {
                match assembly {
                    Assembly::Assembled(record) => records.push(record),
                    Assembly::Skipped {
                        reason: SkipReason::NotFound,
                        ..
                    } => summary.not_found += 1,
                    Assembly::Skipped {
                        reason: SkipReason::Failed(_),
                        ..
                    } => summary.failed += 1,
                }
            }

            let assembled = records.len();
            let committed = sink.commit(records).await.map_err(|source| {
                PipelineError::Commit {
                    chunk: chunk.index,
                    source,
                }
            })?;
            summary.persisted += committed.persisted;
            summary.rejected += committed.rejected.len();

            if !committed.rejected.is_empty() {
                warn!(
                    chunk = chunk.index,
                    rejected = ?committed.rejected,
                    "records rejected by sink"
                );
            }
            info!(
                chunk = chunk.index,
                ids = ?chunk.ids,
                assembled,
                persisted = committed.persisted,
                duration = fmt_duration(start.elapsed()),
                "chunk committed"
            );
        }

        Ok(summary)
    }
}
