//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::Rejection;
use projections::ProjectionError;
use registration_service::RegistrationError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),
    /// Bad request from the client.
    #[error("{0}")]
    BadRequest(String),
    /// The accountant refused the registration.
    #[error("{0}")]
    Rejected(Rejection),
    /// Registration service error.
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    /// Attendee view error.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, mut body) = match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, serde_json::json!({})),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, serde_json::json!({})),
            ApiError::Rejected(rejection) => rejection_to_response(&rejection),
            ApiError::Registration(err) => (registration_status(&err), serde_json::json!({})),
            ApiError::Projection(err) => (projection_status(&err), serde_json::json!({})),
        };

        if status == StatusCode::SERVICE_UNAVAILABLE {
            tracing::warn!(error = %message, "storage unavailable");
        } else if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        body["error"] = serde_json::Value::String(message);
        (status, axum::Json(body)).into_response()
    }
}

fn rejection_to_response(rejection: &Rejection) -> (StatusCode, serde_json::Value) {
    let status = match rejection {
        Rejection::CapacityExceeded { .. } => StatusCode::CONFLICT,
        Rejection::InvalidPartySize { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    // Tagged as {"reason": ..., "remaining" | "requested": ...}
    let body = serde_json::to_value(rejection).unwrap_or_else(|_| serde_json::json!({}));
    (status, body)
}

fn registration_status(err: &RegistrationError) -> StatusCode {
    match err {
        RegistrationError::Validation(_) => StatusCode::BAD_REQUEST,
        RegistrationError::EventNotFound(_) => StatusCode::NOT_FOUND,
        RegistrationError::DuplicateEvent(_) => StatusCode::CONFLICT,
        RegistrationError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        RegistrationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn projection_status(err: &ProjectionError) -> StatusCode {
    match err {
        ProjectionError::EventNotFound(_) => StatusCode::NOT_FOUND,
        ProjectionError::Store(err) if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        ProjectionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
