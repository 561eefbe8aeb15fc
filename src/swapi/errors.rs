//! Error types for the SWAPI client.

use crate::swapi::models::ResourceKind;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request for {kind}/{id} failed")]
    RequestFailed {
        kind: ResourceKind,
        id: u32,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("{kind}/{id} returned unexpected status {status}")]
    Status {
        kind: ResourceKind,
        id: u32,
        status: u16,
    },
    #[error("Failed to parse response")]
    ParseFailed {
        status: u16,
        url: String,
        #[source]
        source: anyhow::Error,
    },
}
