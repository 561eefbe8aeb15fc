//! Assembly of raw person payloads into flat records.

use crate::data::models::FlatRecord;
use crate::harvest::resolver::{ReferenceResolver, ResolveError, UNKNOWN};
use crate::swapi::json::decode_value;
use crate::swapi::{RawPayload, ResourceKind};
use futures::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("id {0} does not fit a record identity")]
    IdOutOfRange(u32),
    #[error("payload has an unexpected shape")]
    Decode(#[source] anyhow::Error),
    #[error("failed to resolve {field}")]
    Resolve {
        field: &'static str,
        #[source]
        source: ResolveError,
    },
}

/// Why a payload produced no record.
#[derive(Debug)]
pub enum SkipReason {
    /// The payload carried the not-found sentinel.
    NotFound,
    Failed(AssembleError),
}

/// Result of assembling one payload.
#[derive(Debug)]
pub enum Assembly {
    Assembled(FlatRecord),
    Skipped { id: u32, reason: SkipReason },
}

impl Assembly {
    pub fn record(self) -> Option<FlatRecord> {
        match self {
            Assembly::Assembled(record) => Some(record),
            Assembly::Skipped { .. } => None,
        }
    }
}

/// The attributes of a person payload this pipeline reads.
#[derive(Debug, Deserialize)]
struct PersonFields {
    name: Option<String>,
    birth_year: Option<String>,
    eye_color: Option<String>,
    gender: Option<String>,
    hair_color: Option<String>,
    skin_color: Option<String>,
    height: Option<String>,
    mass: Option<String>,
    homeworld: Option<String>,
    #[serde(default)]
    films: Vec<String>,
    #[serde(default)]
    species: Vec<String>,
    #[serde(default)]
    starships: Vec<String>,
    #[serde(default)]
    vehicles: Vec<String>,
}

pub struct RecordAssembler {
    resolver: ReferenceResolver,
}

impl RecordAssembler {
    pub fn new(resolver: ReferenceResolver) -> Self {
        Self { resolver }
    }

    /// Assemble every payload of a chunk concurrently.
    ///
    /// Results keep the order of `payloads`; one payload's failure never
    /// affects another's.
    pub async fn assemble_all(&self, payloads: Vec<RawPayload>) -> Vec<Assembly> {
        join_all(payloads.into_iter().map(|payload| self.assemble(payload))).await
    }

    /// Assemble one payload, or explain why it was skipped.
    pub async fn assemble(&self, payload: RawPayload) -> Assembly {
        let id = payload.id();
        if payload.is_not_found() {
            debug!(id, "skipping payload: not found upstream");
            return Assembly::Skipped {
                id,
                reason: SkipReason::NotFound,
            };
        }

        match self.try_assemble(payload).await {
            Ok(record) => Assembly::Assembled(record),
            Err(e) => {
                warn!(id, error = ?e, "skipping payload: assembly failed");
                Assembly::Skipped {
                    id,
                    reason: SkipReason::Failed(e),
                }
            }
        }
    }

    async fn try_assemble(&self, payload: RawPayload) -> Result<FlatRecord, AssembleError> {
        let id = i32::try_from(payload.id())
            .map_err(|_| AssembleError::IdOutOfRange(payload.id()))?;
        let fields: PersonFields =
            decode_value(Value::Object(payload.into_fields())).map_err(AssembleError::Decode)?;

        let resolver = &self.resolver;
        let (films, species, starships, vehicles, homeworld) = tokio::join!(
            resolver.resolve(ResourceKind::Films, &fields.films),
            resolver.resolve(ResourceKind::Species, &fields.species),
            resolver.resolve(ResourceKind::Starships, &fields.starships),
            resolver.resolve(ResourceKind::Vehicles, &fields.vehicles),
            resolver.resolve_single(ResourceKind::Planets, fields.homeworld.as_deref()),
        );

        Ok(FlatRecord {
            id,
            name: fields.name,
            birth_year: fields.birth_year,
            eye_color: fields.eye_color,
            gender: fields.gender,
            hair_color: fields.hair_color,
            skin_color: fields.skin_color,
            height: fields.height.unwrap_or_else(|| UNKNOWN.to_owned()),
            mass: fields.mass.unwrap_or_else(|| UNKNOWN.to_owned()),
            homeworld: homeworld.map_err(resolve_failed("homeworld"))?,
            films: films.map_err(resolve_failed("films"))?,
            species: species.map_err(resolve_failed("species"))?,
            starships: starships.map_err(resolve_failed("starships"))?,
            vehicles: vehicles.map_err(resolve_failed("vehicles"))?,
        })
    }
}

fn resolve_failed(field: &'static str) -> impl FnOnce(ResolveError) -> AssembleError {
    move |source| AssembleError::Resolve { field, source }
}
