// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Upstream fetcher for the lead backend.
//!
//! Wraps the backend's read-only HTTP surface: lead listings, single leads,
//! metrics, recordings, transcript exports and the health probe. Requests
//! carry a timeout and are retried a bounded number of times on transport
//! errors and 5xx responses.

use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::config::UpstreamConfig;
use crate::error::AppError;
use crate::model::{DashboardMetrics, HealthStatus, Lead, TranscriptExport};
use crate::query::{DateRange, QueryParameters};
use crate::source::{AudioStream, LeadSource};
use crate::telemetry::Telemetry;

/// HTTP client wrapper for talking to the lead backend.
#[derive(Clone)]
pub struct UpstreamClient {
    base_url: Url,
    client: Client,
    max_attempts: u32,
    retry_backoff: Duration,
    telemetry: Option<Telemetry>,
}

impl UpstreamClient {
    /// Construct a new upstream client using the provided configuration.
    pub fn try_new(config: UpstreamConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow!("Failed to build upstream client: {}", e)))?;

        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            AppError::Internal(anyhow!("Invalid upstream url {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(anyhow!(
                "Upstream url {} cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self {
            base_url,
            client,
            max_attempts: config.max_attempts.max(1),
            retry_backoff: config.retry_backoff,
            telemetry: None,
        })
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append path segments to the base url. Each segment is percent-encoded,
    /// so an id can never add path levels or a query string.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal(anyhow!("Upstream url {} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    /// Issue a GET, retrying transient failures. `Ok(None)` means 404.
    async fn get(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Option<Response>, AppError> {
        let url = self.endpoint(segments)?;
        let mut attempt = 1;

        loop {
            if let Some(telemetry) = &self.telemetry {
                telemetry.record_upstream_request();
            }
            let started = tokio::time::Instant::now();
            let outcome = self.send_once(&url, query).await;
            if let Some(telemetry) = &self.telemetry {
                telemetry.record_upstream_latency(started.elapsed().as_secs_f64());
            }

            match outcome {
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_upstream_failure();
                    }
                    tracing::warn!(%url, attempt, error = %error, "upstream request failed; retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(error) => {
                    if let Some(telemetry) = &self.telemetry {
                        telemetry.record_upstream_failure();
                    }
                    return Err(error);
                }
                Ok(response) => return Ok(response),
            }
        }
    }

    async fn send_once(&self, url: &Url, query: &[(&str, String)]) -> Result<Option<Response>, AppError> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("request to {url} failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!(%url, "Upstream returned not found");
            return Ok(None);
        }

        if status.is_server_error() {
            return Err(AppError::upstream(format!("{url} returned {status}")));
        }

        if !status.is_success() {
            return Err(AppError::Internal(anyhow!(
                "Upstream returned unexpected status {} for {}",
                status,
                url
            )));
        }

        Ok(Some(response))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Option<T>, AppError> {
        let Some(response) = self.get(segments, query).await? else {
            return Ok(None);
        };

        let payload = response
            .json::<T>()
            .await
            .map_err(|e| AppError::upstream(format!("Failed to parse upstream response: {e}")))?;

        Ok(Some(payload))
    }

    /// Backend liveness probe.
    pub async fn health(&self) -> Result<HealthStatus, AppError> {
        self.get_json(&["health"], &[])
            .await?
            .ok_or_else(|| AppError::upstream("health endpoint not found"))
    }
}

#[async_trait]
impl LeadSource for UpstreamClient {
    fn kind(&self) -> &'static str {
        "upstream"
    }

    async fn fetch_leads(&self, query: &QueryParameters) -> Result<Vec<Lead>, AppError> {
        let leads: Vec<Lead> = self
            .get_json(&["leads"], &query.to_pairs())
            .await?
            .ok_or_else(|| AppError::upstream("lead listing endpoint not found"))?;

        tracing::debug!(count = leads.len(), date_range = %query.date_range, "fetched leads from upstream");
        Ok(leads)
    }

    async fn fetch_lead(&self, id: &str) -> Result<Option<Lead>, AppError> {
        let Some(id) = path_id(id) else {
            return Ok(None);
        };
        self.get_json(&["leads", id], &[]).await
    }

    async fn fetch_metrics(&self, range: DateRange) -> Result<DashboardMetrics, AppError> {
        self.get_json(&["metrics"], &[("date_range", range.as_str().to_string())])
            .await?
            .ok_or_else(|| AppError::upstream("metrics endpoint not found"))
    }

    async fn open_audio(&self, recording_id: &str) -> Result<Option<AudioStream>, AppError> {
        let Some(recording_id) = path_id(recording_id) else {
            return Ok(None);
        };
        let Some(response) = self.get(&["audio", recording_id], &[]).await? else {
            return Ok(None);
        };

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());

        let body = response.bytes_stream().map_err(std::io::Error::other);

        Ok(Some(AudioStream {
            content_type,
            content_length,
            body: Box::pin(body),
        }))
    }

    async fn fetch_transcript(&self, lead_id: &str) -> Result<Option<TranscriptExport>, AppError> {
        let Some(lead_id) = path_id(lead_id) else {
            return Ok(None);
        };
        self.get_json(&["export", "transcript", lead_id], &[]).await
    }
}

/// Ids that cannot name a resource are treated as unknown.
fn path_id(id: &str) -> Option<&str> {
    match id {
        "" | "." | ".." => None,
        id => Some(id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalised() {
        let client = UpstreamClient::try_new(UpstreamConfig::new("http://backend:5000/api/")).unwrap();
        assert_eq!(client.base_url(), "http://backend:5000/api");
        assert_eq!(
            client.endpoint(&["leads", "abc"]).unwrap().as_str(),
            "http://backend:5000/api/leads/abc"
        );
        assert_eq!(client.kind(), "upstream");
    }

    #[test]
    fn test_ids_stay_inside_one_segment() {
        let client = UpstreamClient::try_new(UpstreamConfig::new("http://backend:5000/api")).unwrap();
        assert_eq!(
            client.endpoint(&["audio", "../leads"]).unwrap().as_str(),
            "http://backend:5000/api/audio/..%2Fleads"
        );

        let url = client.endpoint(&["leads", "abc?status=x"]).unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(url.path(), "/api/leads/abc%3Fstatus=x");
    }

    #[test]
    fn test_unnameable_ids_are_unknown() {
        let client = UpstreamClient::try_new(UpstreamConfig::new("http://127.0.0.1:9")).unwrap();
        for id in ["", ".", ".."] {
            assert!(tokio_test::block_on(client.fetch_lead(id)).unwrap().is_none());
            assert!(tokio_test::block_on(client.open_audio(id)).unwrap().is_none());
        }
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(UpstreamClient::try_new(UpstreamConfig::new("not a url")).is_err());
        assert!(UpstreamClient::try_new(UpstreamConfig::new("mailto:ops@example.com")).is_err());
    }

    #[test]
    fn test_attempts_never_zero() {
        let mut config = UpstreamConfig::new("http://backend");
        config.max_attempts = 0;
        let client = UpstreamClient::try_new(config).unwrap();
        assert_eq!(client.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_upstream_error() {
        let mut config = UpstreamConfig::new("http://127.0.0.1:9");
        config.timeout = Duration::from_millis(500);
        config.max_attempts = 2;
        config.retry_backoff = Duration::from_millis(1);
        let telemetry = Telemetry::new().unwrap();
        let client = UpstreamClient::try_new(config)
            .unwrap()
            .with_telemetry(telemetry.clone());

        let err = client
            .fetch_leads(&QueryParameters::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(telemetry.upstream_requests.get(), 2);
        assert_eq!(telemetry.upstream_failures.get(), 2);
    }
}
