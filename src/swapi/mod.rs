//! SWAPI client: single-resource fetches and the payloads they return.

pub mod client;
pub mod errors;
pub mod json;
pub mod middleware;
pub mod models;

pub use client::SwapiClient;
pub use errors::ClientError;
pub use models::{RawPayload, ResourceKind, reference_id};

/// Source of single resources, keyed by kind and numeric id.
///
/// A "not found" answer is a successful fetch whose payload carries the
/// sentinel; only transport and protocol failures are errors.
#[async_trait::async_trait]
pub trait ResourceSource: Send + Sync {
    async fn fetch(&self, kind: ResourceKind, id: u32) -> Result<RawPayload, ClientError>;
}
