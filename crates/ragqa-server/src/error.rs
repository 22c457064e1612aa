//! Mapping from library errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

use ragqa_core::Error;

/// Error returned by route handlers; renders as `{ "error": message }`.
#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    BadRequest(String),
    NotFound(String),
    Unavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(e) => status_for(e),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Core(Error::Internal(format!("Task failed: {}", e)))
    }
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::Configuration(_) | Error::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
        Error::StoreNotFound | Error::EmptyStore => StatusCode::NOT_FOUND,
        Error::StoreConflict { .. } => StatusCode::CONFLICT,
        Error::Generation(_) => StatusCode::BAD_GATEWAY,
        Error::DimensionMismatch { .. }
        | Error::StoreCorrupt(_)
        | Error::Ingest(_)
        | Error::Inference(_)
        | Error::Io(_)
        | Error::Json(_)
        | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Core(Error::StoreNotFound) => {
                "Vector store not found. Please upload documents first.".to_string()
            }
            ApiError::Core(e) => e.to_string(),
            ApiError::BadRequest(m) | ApiError::NotFound(m) | ApiError::Unavailable(m) => m,
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::Configuration("x".into()), StatusCode::BAD_REQUEST),
            (Error::UnsupportedFormat("x".into()), StatusCode::BAD_REQUEST),
            (Error::StoreNotFound, StatusCode::NOT_FOUND),
            (Error::EmptyStore, StatusCode::NOT_FOUND),
            (
                Error::StoreConflict { base: 1, current: 2 },
                StatusCode::CONFLICT,
            ),
            (
                Error::DimensionMismatch {
                    expected: 3,
                    actual: 4,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::StoreCorrupt("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Generation("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
