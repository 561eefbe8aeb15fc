//! Resolution of reference URLs into display names.

use crate::swapi::{ClientError, RawPayload, ResourceKind, ResourceSource, reference_id};
use futures::future::try_join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::trace;

/// Separator between resolved names of one field.
pub const NAME_DELIMITER: &str = ", ";

/// Value stored for a single-valued reference the payload does not carry.
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("malformed {kind} reference: {url}")]
    MalformedReference { kind: ResourceKind, url: String },
    #[error("referenced {kind}/{id} does not exist")]
    NotFound { kind: ResourceKind, id: u32 },
    #[error("{kind}/{id} has no '{field}' field")]
    MissingName {
        kind: ResourceKind,
        id: u32,
        field: &'static str,
    },
    #[error("reference permits closed")]
    PermitsClosed,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Turns reference URLs into display names.
///
/// All fetches made through one resolver share a single pool of permits, so
/// the number of in-flight reference requests across a whole run never
/// exceeds the configured limit, however many references a payload carries.
#[derive(Clone)]
pub struct ReferenceResolver {
    source: Arc<dyn ResourceSource>,
    permits: Arc<Semaphore>,
}

impl ReferenceResolver {
    pub fn new(source: Arc<dyn ResourceSource>, max_in_flight: usize) -> Self {
        Self {
            source,
            permits: Arc::new(Semaphore::new(
                max_in_flight.clamp(1, Semaphore::MAX_PERMITS),
            )),
        }
    }

    /// Resolve a list of references of one kind into a joined name string.
    ///
    /// Names appear in the order of `urls`, regardless of which fetch
    /// finishes first. An empty list yields an empty string without fetching.
    pub async fn resolve(
        &self,
        kind: ResourceKind,
        urls: &[String],
    ) -> Result<String, ResolveError> {
        if urls.is_empty() {
            return Ok(String::new());
        }

        let ids = urls
            .iter()
            .map(|url| parse_reference(kind, url))
            .collect::<Result<Vec<_>, _>>()?;
        trace!(%kind, ?ids, "resolving references");

        let names = try_join_all(ids.into_iter().map(|id| self.lookup(kind, id))).await?;
        Ok(names.join(NAME_DELIMITER))
    }

    /// Resolve an optional single reference.
    ///
    /// An absent or empty one is [`UNKNOWN`] and issues no fetch.
    pub async fn resolve_single(
        &self,
        kind: ResourceKind,
        url: Option<&str>,
    ) -> Result<String, ResolveError> {
        match url.filter(|url| !url.is_empty()) {
            None => Ok(UNKNOWN.to_owned()),
            Some(url) => self.lookup(kind, parse_reference(kind, url)?).await,
        }
    }

    /// Fetch one referenced resource and return its display name.
    async fn lookup(&self, kind: ResourceKind, id: u32) -> Result<String, ResolveError> {
        let payload = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| ResolveError::PermitsClosed)?;
            self.source.fetch(kind, id).await?
        };
        display_name(&payload)
    }
}

fn parse_reference(kind: ResourceKind, url: &str) -> Result<u32, ResolveError> {
    reference_id(url).ok_or_else(|| ResolveError::MalformedReference {
        kind,
        url: url.to_owned(),
    })
}

fn display_name(payload: &RawPayload) -> Result<String, ResolveError> {
    let (kind, id) = (payload.kind(), payload.id());
    if payload.is_not_found() {
        return Err(ResolveError::NotFound { kind, id });
    }
    payload
        .display_name()
        .map(str::to_owned)
        .ok_or(ResolveError::MissingName {
            kind,
            id,
            field: kind.display_field(),
        })
}
