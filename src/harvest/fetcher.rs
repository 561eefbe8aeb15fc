//! Chunked, concurrent retrieval of primary resources.

use crate::swapi::{ClientError, RawPayload, ResourceKind, ResourceSource};
use futures::future::try_join_all;
use futures::stream::{self, Stream, StreamExt};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::debug;

/// Primary resources fetched concurrently per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 30;

/// The payloads of one contiguous slice of the id range.
#[derive(Debug)]
pub struct Chunk {
    /// Zero-based position of this chunk within the run.
    pub index: usize,
    pub ids: RangeInclusive<u32>,
    pub payloads: Vec<RawPayload>,
}

/// A chunk whose fetch failed; none of its payloads are kept.
#[derive(Debug, thiserror::Error)]
#[error("fetching chunk {index} ({ids:?}) failed")]
pub struct ChunkFetchError {
    pub index: usize,
    pub ids: RangeInclusive<u32>,
    #[source]
    pub source: ClientError,
}

/// Split an inclusive id range into contiguous slices of at most `chunk_size` ids.
pub fn chunk_ranges(range: RangeInclusive<u32>, chunk_size: usize) -> Vec<RangeInclusive<u32>> {
    let (start, end) = (*range.start(), *range.end());
    if start > end {
        return Vec::new();
    }

    let step = u32::try_from(chunk_size.max(1)).unwrap_or(u32::MAX);
    let mut ranges = Vec::new();
    let mut lo = start;
    loop {
        let hi = lo.saturating_add(step - 1).min(end);
        ranges.push(lo..=hi);
        if hi == end {
            break;
        }
        lo = hi + 1;
    }
    ranges
}

/// Fetches primary resources one chunk at a time.
pub struct BatchFetcher {
    source: Arc<dyn ResourceSource>,
    kind: ResourceKind,
    chunk_size: usize,
}

impl BatchFetcher {
    pub fn new(source: Arc<dyn ResourceSource>, kind: ResourceKind, chunk_size: usize) -> Self {
        Self {
            source,
            kind,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Fetch every id in `ids` concurrently.
    ///
    /// Completes only once all fetches have; the first transport or protocol
    /// error fails the whole chunk.
    pub async fn fetch_chunk(
        &self,
        ids: RangeInclusive<u32>,
    ) -> Result<Vec<RawPayload>, ClientError> {
        try_join_all(ids.map(|id| self.source.fetch(self.kind, id))).await
    }

    /// Lazily fetch `range` chunk by chunk.
    ///
    /// A chunk's requests are only issued when the stream is polled for it,
    /// so a consumer that finishes with chunk N before polling again gets
    /// strictly sequential chunks.
    pub fn run(
        &self,
        range: RangeInclusive<u32>,
    ) -> impl Stream<Item = Result<Chunk, ChunkFetchError>> + '_ {
        stream::iter(chunk_ranges(range, self.chunk_size).into_iter().enumerate()).then(
            move |(index, ids)| async move {
                debug!(chunk = index, ids = ?ids, "fetching chunk");
                match self.fetch_chunk(ids.clone()).await {
                    Ok(payloads) => Ok(Chunk {
                        index,
                        ids,
                        payloads,
                    }),
                    Err(source) => Err(ChunkFetchError { index, ids, source }),
                }
            },
        )
    }
}
