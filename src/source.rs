use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use futures_util::stream::BoxStream;

use crate::aggregate::aggregate;
use crate::engine::{scope_by_date, select};
use crate::error::AppError;
use crate::model::{DashboardMetrics, Lead, TranscriptExport};
use crate::query::{DateRange, QueryParameters};

/// Recording bytes as they arrive from wherever the audio lives.
pub struct AudioStream {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

/// Trait for lead backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadSource: Send + Sync {
    fn kind(&self) -> &'static str;
    async fn fetch_leads(&self, query: &QueryParameters) -> Result<Vec<Lead>, AppError>;
    async fn fetch_lead(&self, id: &str) -> Result<Option<Lead>, AppError>;
    async fn fetch_metrics(&self, range: DateRange) -> Result<DashboardMetrics, AppError>;
    async fn open_audio(&self, recording_id: &str) -> Result<Option<AudioStream>, AppError>;
    async fn fetch_transcript(&self, lead_id: &str) -> Result<Option<TranscriptExport>, AppError>;
}

/// In-memory backend over a fixed collection.
///
/// Answers the same questions the HTTP backend does, applying the query
/// engine locally.
#[derive(Clone)]
pub struct FixtureSource {
    leads: Arc<Vec<Lead>>,
}

impl FixtureSource {
    pub fn new(leads: Vec<Lead>) -> Self {
        Self {
            leads: Arc::new(leads),
        }
    }
}

#[async_trait]
impl LeadSource for FixtureSource {
    fn kind(&self) -> &'static str {
        "fixture"
    }

    async fn fetch_leads(&self, query: &QueryParameters) -> Result<Vec<Lead>, AppError> {
        let scoped = scope_by_date(&self.leads, query.date_range, Utc::now());
        Ok(select(&scoped, query))
    }

    async fn fetch_lead(&self, id: &str) -> Result<Option<Lead>, AppError> {
        Ok(self.leads.iter().find(|lead| lead.id == id).cloned())
    }

    async fn fetch_metrics(&self, range: DateRange) -> Result<DashboardMetrics, AppError> {
        Ok(aggregate(&scope_by_date(&self.leads, range, Utc::now())))
    }

    async fn open_audio(&self, recording_id: &str) -> Result<Option<AudioStream>, AppError> {
        tracing::debug!(recording_id, "fixture mode serves no recordings");
        Ok(None)
    }

    async fn fetch_transcript(&self, lead_id: &str) -> Result<Option<TranscriptExport>, AppError> {
        Ok(self
            .leads
            .iter()
            .find(|lead| lead.id == lead_id)
            .map(|lead| TranscriptExport {
                lead_name: Some(lead.lead_name.clone()),
                company_name: Some(lead.company_name.clone()),
                transcript: lead.conversation_transcript.clone(),
                timestamp: Some(lead.call_metadata.timestamp.clone()),
            }))
    }
}

/// Shared handle over whichever backend is configured.
#[derive(Clone)]
pub struct LeadStore {
    backend: Arc<dyn LeadSource>,
}

impl LeadStore {
    pub fn new(backend: impl LeadSource + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    pub async fn fetch_leads(&self, query: &QueryParameters) -> Result<Vec<Lead>, AppError> {
        self.backend.fetch_leads(query).await
    }

    pub async fn fetch_lead(&self, id: &str) -> Result<Option<Lead>, AppError> {
        self.backend.fetch_lead(id).await
    }

    pub async fn fetch_metrics(&self, range: DateRange) -> Result<DashboardMetrics, AppError> {
        self.backend.fetch_metrics(range).await
    }

    pub async fn open_audio(&self, recording_id: &str) -> Result<Option<AudioStream>, AppError> {
        self.backend.open_audio(recording_id).await
    }

    pub async fn fetch_transcript(&self, lead_id: &str) -> Result<Option<TranscriptExport>, AppError> {
        self.backend.fetch_transcript(lead_id).await
    }
}
