//! Database operations for the `people` table.

use crate::data::models::FlatRecord;
use crate::data::sink::{CommitSummary, RecordSink, SinkError};
use sqlx::{Acquire, PgConnection, PgPool};
use tracing::{debug, warn};

/// Insert or update a single person, keyed by id.
pub async fn upsert(conn: &mut PgConnection, record: &FlatRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO people (
            id, name, birth_year, eye_color, gender, hair_color, skin_color,
            height, mass, homeworld, films, species, starships, vehicles
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            birth_year = EXCLUDED.birth_year,
            eye_color = EXCLUDED.eye_color,
            gender = EXCLUDED.gender,
            hair_color = EXCLUDED.hair_color,
            skin_color = EXCLUDED.skin_color,
            height = EXCLUDED.height,
            mass = EXCLUDED.mass,
            homeworld = EXCLUDED.homeworld,
            films = EXCLUDED.films,
            species = EXCLUDED.species,
            starships = EXCLUDED.starships,
            vehicles = EXCLUDED.vehicles,
            updated_at = now()
        "#,
    )
    .bind(record.id)
    .bind(&record.name)
    .bind(&record.birth_year)
    .bind(&record.eye_color)
    .bind(&record.gender)
    .bind(&record.hair_color)
    .bind(&record.skin_color)
    .bind(&record.height)
    .bind(&record.mass)
    .bind(&record.homeworld)
    .bind(&record.films)
    .bind(&record.species)
    .bind(&record.starships)
    .bind(&record.vehicles)
    .execute(conn)
    .await?;
    Ok(())
}

/// Get all stored people ordered by id.
pub async fn get_all(pool: &PgPool) -> Result<Vec<FlatRecord>, sqlx::Error> {
    sqlx::query_as::<_, FlatRecord>(
        r#"
        SELECT id, name, birth_year, eye_color, gender, hair_color, skin_color,
               height, mass, homeworld, films, species, starships, vehicles
        FROM people
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Writes each chunk inside one transaction.
///
/// Every record gets its own savepoint, so a constraint violation rolls back
/// only that record and the transaction stays usable for the rest.
pub struct PgSink {
    pool: PgPool,
}

impl PgSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecordSink for PgSink {
    async fn commit(&mut self, records: Vec<FlatRecord>) -> Result<CommitSummary, SinkError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(SinkError::database("failed to begin transaction"))?;

        let mut summary = CommitSummary::default();
        for record in &records {
            let mut savepoint = tx
                .begin()
                .await
                .map_err(SinkError::database("failed to open savepoint"))?;

            match upsert(&mut savepoint, record).await {
                Ok(()) => {
                    savepoint
                        .commit()
                        .await
                        .map_err(SinkError::database("failed to release savepoint"))?;
                    summary.persisted += 1;
                }
                Err(e) => {
                    warn!(id = record.id, error = ?e, "record rejected by database");
                    savepoint
                        .rollback()
                        .await
                        .map_err(SinkError::database("failed to roll back savepoint"))?;
                    summary.rejected.push(record.id);
                }
            }
        }

        tx.commit()
            .await
            .map_err(SinkError::database("failed to commit transaction"))?;

        debug!(
            persisted = summary.persisted,
            rejected = summary.rejected.len(),
            "chunk committed"
        );
        Ok(summary)
    }
}
