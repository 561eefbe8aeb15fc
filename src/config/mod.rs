//! Configuration module for the harvester.
//!
//! Values come from environment variables (after `.env` is loaded), with a
//! default for everything except the database URL.

use crate::harvest::{DEFAULT_CHUNK_SIZE, HarvestSettings};
use anyhow::{Context, Result, ensure};
use figment::{Figment, providers::Env};
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Log level for the application's own targets
    ///
    /// Overridden entirely by `RUST_LOG` when that is set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// PostgreSQL connection URL; only optional for dry runs
    pub database_url: Option<String>,
    /// Base URL of the upstream API, without the resource segment
    #[serde(default = "default_swapi_base_url")]
    pub swapi_base_url: String,
    /// First primary id to harvest (inclusive)
    #[serde(default = "default_first_id")]
    pub first_id: u32,
    /// Last primary id to harvest (inclusive)
    #[serde(default = "default_last_id")]
    pub last_id: u32,
    /// Number of primary resources fetched concurrently
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Maximum in-flight reference fetches across the whole run
    #[serde(default = "default_reference_concurrency")]
    pub reference_concurrency: usize,
    /// Per-request timeout
    ///
    /// Accepts plain seconds or a unit suffix, e.g. `30`, `30s`, `1500ms`, `1m`.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_swapi_base_url() -> String {
    "https://swapi.py4e.com/api".to_string()
}

fn default_first_id() -> u32 {
    1
}

fn default_last_id() -> u32 {
    100
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_reference_concurrency() -> usize {
    16
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(Figment::new().merge(Env::raw()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().context("Failed to load config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.first_id >= 1, "FIRST_ID must be at least 1");
        ensure!(
            self.first_id <= self.last_id,
            "FIRST_ID ({}) must not exceed LAST_ID ({})",
            self.first_id,
            self.last_id
        );
        ensure!(self.chunk_size >= 1, "CHUNK_SIZE must be at least 1");
        ensure!(
            (1..=Semaphore::MAX_PERMITS).contains(&self.reference_concurrency),
            "REFERENCE_CONCURRENCY must be between 1 and {}",
            Semaphore::MAX_PERMITS
        );
        Ok(())
    }

    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            ids: self.first_id..=self.last_id,
            chunk_size: self.chunk_size,
            reference_concurrency: self.reference_concurrency,
        }
    }
}

/// Deserialize a duration given as integer seconds or a string with a unit.
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use fundu::{DurationParser, TimeUnit};
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Seconds(u64),
        Text(String),
    }

    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawDuration::Text(text) => {
            let parser = DurationParser::with_time_units(&[
                TimeUnit::MilliSecond,
                TimeUnit::Second,
                TimeUnit::Minute,
            ]);
            let parsed = parser
                .parse(text.trim())
                .map_err(|e| D::Error::custom(format!("invalid duration '{text}': {e}")))?;
            Duration::try_from(parsed)
                .map_err(|e| D::Error::custom(format!("invalid duration '{text}': {e}")))
        }
    }
}
