//! `sqlx` models for the harvested tables.

use serde::Serialize;

/// A fully resolved, denormalized person ready for storage.
///
/// Reference fields hold the display names of the linked resources joined
/// with `", "`, in the order the upstream payload listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct FlatRecord {
    pub id: i32,
    pub name: Option<String>,
    pub birth_year: Option<String>,
    pub eye_color: Option<String>,
    pub gender: Option<String>,
    pub hair_color: Option<String>,
    pub skin_color: Option<String>,
    pub height: String,
    pub mass: String,
    pub homeworld: String,
    pub films: String,
    pub species: String,
    pub starships: String,
    pub vehicles: String,
}
