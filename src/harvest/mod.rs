//! Concurrent harvest of people: chunked fetch, reference resolution,
//! record assembly and per-chunk commits.

pub mod assembler;
pub mod fetcher;
pub mod pipeline;
pub mod resolver;
#[cfg(test)]
pub(crate) mod test_support;

pub use assembler::{AssembleError, Assembly, RecordAssembler, SkipReason};
pub use fetcher::{BatchFetcher, Chunk, ChunkFetchError, DEFAULT_CHUNK_SIZE, chunk_ranges};
pub use pipeline::{HarvestSettings, Pipeline, PipelineError, RunSummary};
pub use resolver::{ReferenceResolver, ResolveError};
