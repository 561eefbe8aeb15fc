//! Database models and persistence sinks.

pub mod models;
pub mod people;
pub mod sink;

pub use models::FlatRecord;
pub use people::PgSink;
pub use sink::{CommitSummary, MemorySink, RecordSink, SinkError};
