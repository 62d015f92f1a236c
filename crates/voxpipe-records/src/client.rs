//! Record-store REST API client.
//!
//! The store exposes Airtable-style documents: `GET /records/{id}` returns
//! `{"id": ..., "fields": {...}}` and `PATCH /records/{id}` merges
//! `{"fields": {...}}`. Authentication is a bearer token.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use voxpipe_models::RecordFields;

use crate::error::{RecordStoreError, RecordStoreResult};

/// Record-store client configuration.
#[derive(Debug, Clone)]
pub struct RecordStoreConfig {
    /// Base URL of the record-store API
    pub base_url: String,
    /// Bearer token
    pub api_token: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl RecordStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> RecordStoreResult<Self> {
        let base_url = std::env::var("RECORDS_API_URL")
            .map_err(|_| RecordStoreError::config_error("RECORDS_API_URL not set"))?;
        let api_token = std::env::var("RECORDS_API_TOKEN")
            .map_err(|_| RecordStoreError::config_error("RECORDS_API_TOKEN not set"))?;

        if base_url.is_empty() {
            return Err(RecordStoreError::config_error(
                "RECORDS_API_URL cannot be empty",
            ));
        }

        Ok(Self {
            base_url,
            api_token,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecordDocument {
    #[serde(default)]
    fields: RecordFields,
}

#[derive(Debug, Serialize)]
struct RecordPatch<'a> {
    fields: std::collections::HashMap<&'a str, &'a str>,
}

/// Record-store REST API client.
#[derive(Clone)]
pub struct RecordStoreClient {
    http: Client,
    base_url: String,
    api_token: String,
}

impl RecordStoreClient {
    /// Create a new record-store client.
    pub fn new(config: RecordStoreConfig) -> RecordStoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("voxpipe-records/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(RecordStoreError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> RecordStoreResult<Self> {
        Self::new(RecordStoreConfig::from_env()?)
    }

    fn record_url(&self, record_id: &str) -> String {
        format!("{}/records/{}", self.base_url, record_id)
    }

    /// Fetch a record's fields.
    pub async fn get_record(&self, record_id: &str) -> RecordStoreResult<RecordFields> {
        debug!("Fetching record {}", record_id);

        let response = self
            .http
            .get(self.record_url(record_id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let doc: RecordDocument = response.json().await?;
                Ok(doc.fields)
            }
            StatusCode::NOT_FOUND => Err(RecordStoreError::not_found(record_id)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RecordStoreError::PermissionDenied(format!(
                    "record store rejected credentials for {}",
                    record_id
                )))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(RecordStoreError::request_failed(format!(
                    "GET {} returned {}: {}",
                    record_id, status, body
                )))
            }
        }
    }

    /// Set a single field on a record.
    pub async fn set_field(
        &self,
        record_id: &str,
        field: &str,
        value: &str,
    ) -> RecordStoreResult<()> {
        debug!("Updating record {} field {}", record_id, field);

        let patch = RecordPatch {
            fields: std::collections::HashMap::from([(field, value)]),
        };

        let response = self
            .http
            .patch(self.record_url(record_id))
            .bearer_auth(&self.api_token)
            .json(&patch)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            StatusCode::NOT_FOUND => Err(RecordStoreError::not_found(record_id)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RecordStoreError::PermissionDenied(format!(
                    "record store rejected credentials for {}",
                    record_id
                )))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(RecordStoreError::request_failed(format!(
                    "PATCH {} returned {}: {}",
                    record_id, status, body
                )))
            }
        }
    }
}
