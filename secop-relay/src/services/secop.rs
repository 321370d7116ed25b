//! Client for the SECOP II open-data endpoint (Socrata).

use crate::config::SecopSettings;
use crate::models::ContractRecord;
use crate::services::query::QuerySpec;
use async_trait::async_trait;
use metrics::counter;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::{Duration, Instant};
use thiserror::Error;

const APP_TOKEN_HEADER: &str = "X-App-Token";

/// Why a fetch produced no records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("open-data API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    InvalidBody(String),
}

/// Source of contract records for a query.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<ContractRecord>, FetchError>;
}

/// Run `query` against `source`, turning any failure into an empty list.
///
/// Callers cannot tell "no matches" from "upstream down"; the failure is only
/// visible in the logs and the `secop_fetch_total{outcome="error"}` counter.
pub async fn fetch_records(source: &dyn RecordSource, query: &QuerySpec) -> Vec<ContractRecord> {
    match source.fetch(query).await {
        Ok(records) => {
            counter!("secop_fetch_total", "outcome" => "ok").increment(1);
            records
        }
        Err(e) => {
            counter!("secop_fetch_total", "outcome" => "error").increment(1);
            tracing::warn!(error = %e, "SECOP fetch failed, returning no records");
            Vec::new()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecopConfig {
    pub dataset_url: String,
    pub app_token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl From<&SecopSettings> for SecopConfig {
    fn from(settings: &SecopSettings) -> Self {
        Self {
            dataset_url: settings.dataset_url.clone(),
            app_token: settings.app_token.clone(),
            timeout: settings.timeout(),
        }
    }
}

/// Reads contracting processes from the SODA resource endpoint.
#[derive(Clone)]
pub struct SecopClient {
    client: Client,
    config: SecopConfig,
}

impl SecopClient {
    pub fn new(config: SecopConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn dataset_url(&self) -> &str {
        &self.config.dataset_url
    }
}

#[async_trait]
impl RecordSource for SecopClient {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<ContractRecord>, FetchError> {
        let started = Instant::now();

        let mut request = self
            .client
            .get(&self.config.dataset_url)
            .query(&query.to_params());
        if let Some(token) = &self.config.app_token {
            request = request.header(APP_TOKEN_HEADER, token.expose_secret().as_str());
        }

        tracing::debug!(
            url = %self.config.dataset_url,
            select = %query.select,
            filter = %query.where_clause,
            "Querying SECOP dataset"
        );

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let records: Vec<ContractRecord> =
            serde_json::from_str(&body).map_err(|e| FetchError::InvalidBody(e.to_string()))?;

        tracing::info!(
            count = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched SECOP records"
        );

        Ok(records)
    }
}
