// Copyright 2025 Memophor Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP API handlers for Leadboard.
//!
//! All lead routes live under `/api`:
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/leads` - Filtered, sorted lead listing
//! - `GET /api/leads/:id` - Single lead record
//! - `GET /api/leads/:id/detail` - Rendered detail panel
//! - `GET /api/metrics` - Aggregate call metrics for a date range
//! - `GET /api/audio/:recording_id` - Streamed call recording
//! - `GET /api/export/transcript/:lead_id` - Transcript download
//! - `GET /api/dashboard` - Full dashboard view for a query
//!
//! Prometheus exposition is served at `GET /metrics`.

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::model::{DashboardMetrics, Lead};
use crate::query::{QueryParameters, RawQuery};
use crate::session::{Completion, DashboardView};
use crate::source::LeadStore;
use crate::telemetry::Telemetry;
use crate::view::{attachment_disposition, transcript_filename, LeadDetail};

const EMPTY_TRANSCRIPT: &str = "No transcript available";
const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

#[derive(Clone)]
pub struct AppState {
    pub store: LeadStore,
    pub telemetry: Telemetry,
    pub api_base: String,
}

/// Build the service router with tracing and CORS applied.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/leads", get(list_leads))
        .route("/leads/:id", get(get_lead))
        .route("/leads/:id/detail", get(lead_detail))
        .route("/metrics", get(lead_metrics))
        .route("/audio/:recording_id", get(stream_audio))
        .route("/export/transcript/:lead_id", get(export_transcript))
        .route("/dashboard", get(dashboard))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn count_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.telemetry.record_request();
    next.run(request).await
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "leadboard",
        "version": env!("CARGO_PKG_VERSION"),
        "source": state.store.kind(),
    })))
}

/// Metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state.telemetry.export()
}

/// List leads matching the query string
pub async fn list_leads(
    State(state): State<AppState>,
    Query(raw): Query<RawQuery>,
) -> Result<Json<Vec<Lead>>, AppError> {
    let query = QueryParameters::try_from(raw)?;
    let leads = state.store.fetch_leads(&query).await?;

    state.telemetry.record_leads_served(leads.len());
    tracing::debug!(count = leads.len(), date_range = %query.date_range, sort = %query.sort, "listed leads");

    Ok(Json(leads))
}

/// Fetch one lead by id
pub async fn get_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Lead>, AppError> {
    let lead = find_lead(&state, &id).await?;
    state.telemetry.record_leads_served(1);
    Ok(Json(lead))
}

/// Detail panel for one lead, rendered in the server's local zone
pub async fn lead_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LeadDetail>, AppError> {
    let lead = find_lead(&state, &id).await?;
    Ok(Json(LeadDetail::new(&lead, &Local, &state.api_base)))
}

async fn find_lead(state: &AppState, id: &str) -> Result<Lead, AppError> {
    state
        .store
        .fetch_lead(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("lead {id} not found")))
}

/// Aggregate metrics; only `date_range` is honoured
pub async fn lead_metrics(
    State(state): State<AppState>,
    Query(raw): Query<RawQuery>,
) -> Result<Json<DashboardMetrics>, AppError> {
    let query = QueryParameters::try_from(raw)?;
    Ok(Json(state.store.fetch_metrics(query.date_range).await?))
}

/// Proxy a call recording as a byte stream
pub async fn stream_audio(
    State(state): State<AppState>,
    Path(recording_id): Path<String>,
) -> Result<Response, AppError> {
    let Some(audio) = state.store.open_audio(&recording_id).await? else {
        return Err(AppError::not_found(format!("recording {recording_id} not available")));
    };

    let content_type = audio
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_AUDIO_TYPE));

    let mut response = Body::from_stream(audio.body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    if let Some(length) = audio.content_length {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

/// Download a lead's transcript as a text attachment
pub async fn export_transcript(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> Result<Response, AppError> {
    let export = state
        .store
        .fetch_transcript(&lead_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("lead {lead_id} not found")))?;

    let filename = transcript_filename(export.lead_name.as_deref().unwrap_or(&lead_id));
    let body = if export.transcript.trim().is_empty() {
        EMPTY_TRANSCRIPT.to_string()
    } else {
        export.transcript
    };

    state.telemetry.record_transcript_export();
    tracing::info!(%lead_id, %filename, "transcript exported");

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, attachment_disposition(&filename)),
        ],
        body,
    )
        .into_response())
}

/// Load the dashboard for a query. Fetch failures still render, with an
/// empty list and the failure empty state.
pub async fn dashboard(
    State(state): State<AppState>,
    Query(raw): Query<RawQuery>,
) -> Result<Json<DashboardView>, AppError> {
    let query = QueryParameters::try_from(raw)?;
    let dashboard = Dashboard::new(state.store.clone(), query);

    if dashboard.load().await == Completion::Failed {
        state.telemetry.record_dashboard_fetch_failure();
    }

    let view = dashboard.view().await;
    state.telemetry.record_leads_served(view.cards.len());

    Ok(Json(view))
}
