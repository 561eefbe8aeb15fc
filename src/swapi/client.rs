//! HTTP client for SWAPI resources.

use crate::swapi::errors::ClientError;
use crate::swapi::json::parse_object;
use crate::swapi::middleware::TransactionLogger;
use crate::swapi::models::{NOT_FOUND_KEY, RawPayload, ResourceKind};
use crate::swapi::ResourceSource;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fetches single resources from `{base}/{kind}/{id}/`.
///
/// The underlying connection pool is shared by every concurrent fetch made
/// through one client.
pub struct SwapiClient {
    http: ClientWithMiddleware,
    base_url: String,
}

impl SwapiClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Self::with_client(base_url, http)
    }

    /// Wraps an existing `reqwest::Client`, adding request logging.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self> {
        Url::parse(base_url).with_context(|| format!("Invalid SWAPI base URL: {base_url}"))?;

        let http = ClientBuilder::new(http).with(TransactionLogger).build();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn resource_url(&self, kind: ResourceKind, id: u32) -> String {
        format!("{}/{}/{}/", self.base_url, kind, id)
    }
}

#[async_trait::async_trait]
impl ResourceSource for SwapiClient {
    async fn fetch(&self, kind: ResourceKind, id: u32) -> Result<RawPayload, ClientError> {
        let url = self.resource_url(kind, id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| ClientError::RequestFailed { kind, id, source })?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(ClientError::Status {
                kind,
                id,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::RequestFailed {
                kind,
                id,
                source: e.into(),
            })?;

        if status == StatusCode::NOT_FOUND {
            debug!(%kind, id, "resource not found upstream");
            // Keep the upstream body when it already carries the sentinel.
            return Ok(match parse_object(&body) {
                Ok(fields) if fields.contains_key(NOT_FOUND_KEY) => {
                    RawPayload::new(kind, id, fields)
                }
                _ => RawPayload::not_found(kind, id),
            });
        }

        let fields = parse_object(&body).map_err(|source| ClientError::ParseFailed {
            status: status.as_u16(),
            url,
            source,
        })?;

        Ok(RawPayload::new(kind, id, fields))
    }
}
