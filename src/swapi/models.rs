//! Resource kinds and raw payloads returned by the SWAPI client.

use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// Key whose presence marks a payload as "resource not found".
pub const NOT_FOUND_KEY: &str = "detail";

/// A SWAPI resource collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    People,
    Films,
    Species,
    Starships,
    Vehicles,
    Planets,
}

impl ResourceKind {
    /// Path segment used for this kind in resource URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::People => "people",
            ResourceKind::Films => "films",
            ResourceKind::Species => "species",
            ResourceKind::Starships => "starships",
            ResourceKind::Vehicles => "vehicles",
            ResourceKind::Planets => "planets",
        }
    }

    /// Field holding the human-readable label for resources of this kind.
    ///
    /// Films are the only collection labelled by `title`.
    pub const fn display_field(self) -> &'static str {
        match self {
            ResourceKind::Films => "title",
            ResourceKind::People
            | ResourceKind::Species
            | ResourceKind::Starships
            | ResourceKind::Vehicles
            | ResourceKind::Planets => "name",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decoded body of a single resource fetch.
///
/// Carries the kind and id it was requested with, since SWAPI bodies do not
/// include a numeric id of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    kind: ResourceKind,
    id: u32,
    fields: Map<String, Value>,
}

impl RawPayload {
    pub fn new(kind: ResourceKind, id: u32, fields: Map<String, Value>) -> Self {
        Self { kind, id, fields }
    }

    /// A payload carrying only the not-found sentinel.
    pub fn not_found(kind: ResourceKind, id: u32) -> Self {
        let mut fields = Map::new();
        fields.insert(NOT_FOUND_KEY.to_owned(), Value::from("Not found"));
        Self::new(kind, id, fields)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    pub fn is_not_found(&self) -> bool {
        self.fields.contains_key(NOT_FOUND_KEY)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns a string field, treating JSON `null` the same as an absent key.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// The label under this payload's kind-specific display field.
    pub fn display_name(&self) -> Option<&str> {
        self.str_field(self.kind.display_field())
    }
}

/// Extracts the numeric id from a resource URL.
///
/// The id is the path segment immediately before the trailing slash, so
/// `https://swapi.py4e.com/api/films/1/` yields `1`. Returns `None` for
/// unparseable URLs, a missing trailing slash, or a non-positive id.
pub fn reference_id(reference: &str) -> Option<u32> {
    let url = Url::parse(reference).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let [.., id, last] = segments.as_slice() else {
        return None;
    };
    if !last.is_empty() {
        return None;
    }
    id.parse::<u32>().ok().filter(|&id| id > 0)
}
