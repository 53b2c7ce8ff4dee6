use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::query::ParseQueryError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::NotFound(message.into())
    }

    pub fn upstream<T: Into<String>>(message: T) -> Self {
        Self::Upstream(message.into())
    }

    /// Transport and upstream failures are worth another attempt; caller
    /// mistakes are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Upstream(_))
    }
}

impl From<ParseQueryError> for AppError {
    fn from(error: ParseQueryError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(ref error) => {
                tracing::error!(error = %format!("{error:#}"), "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::bad_request("nope"), StatusCode::BAD_REQUEST),
            (AppError::not_found("lead not found"), StatusCode::NOT_FOUND),
            (AppError::upstream("timed out"), StatusCode::BAD_GATEWAY),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_parse_error_is_bad_request() {
        let error: AppError = ParseQueryError::new("sort", "sideways").into();
        assert!(matches!(error, AppError::BadRequest(_)));
        assert_eq!(error.to_string(), "invalid sort value: \"sideways\"");
        assert!(!error.is_retryable());
        assert!(AppError::upstream("503").is_retryable());
    }
}
