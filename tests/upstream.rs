use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use leadboard::api::{router, AppState};
use leadboard::config::UpstreamConfig;
use leadboard::error::AppError;
use leadboard::fixture::bundled_leads;
use leadboard::model::{CallOutcome, Lead};
use leadboard::query::{DateRange, QueryParameters};
use leadboard::source::{LeadSource, LeadStore};
use leadboard::telemetry::Telemetry;
use leadboard::upstream::UpstreamClient;
use serde_json::{json, Value};
use tower::ServiceExt;

type RequestLog = Arc<Mutex<Vec<String>>>;

/// Lead API stand-in on an ephemeral port. Every request it sees is logged.
struct Backend {
    base_url: String,
    log: RequestLog,
}

impl Backend {
    async fn start() -> Self {
        let log = RequestLog::default();
        let app = Router::new()
            .route("/api/leads", get(list_leads))
            .route("/api/leads/:id", get(one_lead))
            .route("/api/metrics", get(metrics))
            .route("/api/audio/:id", get(audio))
            .route("/api/export/transcript/:id", get(transcript))
            .with_state(log.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            log,
        }
    }

    fn client(&self, max_attempts: u32) -> UpstreamClient {
        UpstreamClient::try_new(UpstreamConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
            max_attempts,
            retry_backoff: Duration::from_millis(1),
        })
        .unwrap()
    }

    fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|line| line.starts_with(prefix)).count()
    }
}

fn record(log: &RequestLog, line: String) {
    log.lock().unwrap().push(line);
}

async fn list_leads(State(log): State<RequestLog>, RawQuery(query): RawQuery) -> Json<Vec<Lead>> {
    record(&log, format!("LIST {}", query.unwrap_or_default()));
    Json(bundled_leads().unwrap())
}

async fn one_lead(
    State(log): State<RequestLog>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Lead>, StatusCode> {
    record(&log, format!("ONE {id} {}", query.unwrap_or_default()));
    bundled_leads()
        .unwrap()
        .into_iter()
        .find(|lead| lead.id == id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn metrics(State(log): State<RequestLog>) -> StatusCode {
    record(&log, "METRICS".to_string());
    StatusCode::SERVICE_UNAVAILABLE
}

async fn audio(State(log): State<RequestLog>, Path(id): Path<String>) -> Response {
    record(&log, format!("AUDIO {id}"));
    if id == "forbidden" {
        return StatusCode::FORBIDDEN.into_response();
    }
    ([(header::CONTENT_TYPE, "audio/wav")], "RIFF").into_response()
}

async fn transcript(State(log): State<RequestLog>, Path(id): Path<String>) -> Json<Value> {
    record(&log, format!("EXPORT {id}"));
    Json(json!({ "lead_name": "Rajesh Kumar", "transcript": "" }))
}

fn app_over(client: UpstreamClient) -> Router {
    router(AppState {
        store: LeadStore::new(client),
        telemetry: Telemetry::new().unwrap(),
        api_base: "/api".to_string(),
    })
}

async fn get_from(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn test_missing_lead_is_none_and_routes_to_404() {
    let backend = Backend::start().await;
    let client = backend.client(2);

    assert!(client.fetch_lead("lead-999").await.unwrap().is_none());
    let found = client.fetch_lead("lead-001").await.unwrap().unwrap();
    assert_eq!(found.lead_name, "Rajesh Kumar");

    let (status, _, body) = get_from(app_over(backend.client(2)), "/api/leads/lead-999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().unwrap().contains("lead-999"));

    // A 404 is an answer, not a transient failure.
    assert_eq!(backend.count("ONE lead-999"), 2);
}

#[tokio::test]
async fn test_server_errors_retried_up_to_max_attempts() {
    let backend = Backend::start().await;
    let telemetry = Telemetry::new().unwrap();
    let client = backend.client(3).with_telemetry(telemetry.clone());

    let result = client.fetch_metrics(DateRange::All).await;
    assert!(matches!(result, Err(AppError::Upstream(_))));

    assert_eq!(backend.count("METRICS"), 3);
    assert_eq!(telemetry.upstream_requests.get(), 3);
    assert_eq!(telemetry.upstream_failures.get(), 3);
}

#[tokio::test]
async fn test_client_errors_not_retried() {
    let backend = Backend::start().await;
    let client = backend.client(3);

    match client.open_audio("forbidden").await {
        Err(AppError::Internal(_)) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("403 must not yield a stream"),
    }
    assert_eq!(backend.count("AUDIO forbidden"), 1);
}

#[tokio::test]
async fn test_wire_query_omits_noop_filters() {
    let backend = Backend::start().await;
    let client = backend.client(1);

    client.fetch_leads(&QueryParameters::default()).await.unwrap();

    let narrowed = QueryParameters {
        date_range: DateRange::SevenDays,
        search: "steel works".into(),
        status: CallOutcome::Reschedule.into(),
        ..QueryParameters::default()
    };
    client.fetch_leads(&narrowed).await.unwrap();

    assert_eq!(
        backend.requests(),
        vec![
            "LIST date_range=all&sort=newest".to_string(),
            "LIST date_range=7days&sort=newest&status=reschedule&search=steel+works".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_ids_stay_inside_one_path_segment() {
    let backend = Backend::start().await;
    let client = backend.client(1);

    let audio = client.open_audio("../leads").await.unwrap().unwrap();
    assert_eq!(audio.content_type.as_deref(), Some("audio/wav"));

    assert!(client.fetch_lead("abc?status=x").await.unwrap().is_none());

    assert_eq!(
        backend.requests(),
        vec!["AUDIO ../leads".to_string(), "ONE abc?status=x ".to_string()]
    );
    assert_eq!(backend.count("LIST"), 0);
}

#[tokio::test]
async fn test_empty_upstream_transcript_exports_placeholder() {
    let backend = Backend::start().await;

    let (status, headers, body) =
        get_from(app_over(backend.client(1)), "/api/export/transcript/lead-001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"No transcript available");
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .starts_with("attachment; filename=\"transcript-rajesh-kumar.txt\""));
    assert_eq!(backend.requests(), vec!["EXPORT lead-001".to_string()]);
}
