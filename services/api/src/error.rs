//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use enrollment_core::{PortError, ServiceError};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An enrollment service failure, already tagged with its kind.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be understood (e.g., malformed JSON body).
    #[error("{0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// The JSON body of every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(err) => match err {
                ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
                ServiceError::InvalidCourseId(_) | ServiceError::InvalidProgress(_) => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::CourseNotFound(_) | ServiceError::NotEnrolled(_) => {
                    StatusCode::NOT_FOUND
                }
                ServiceError::DuplicateEnrollment(_) => StatusCode::CONFLICT,
                ServiceError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Port(PortError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn service_errors_map_to_distinct_statuses() {
        let cases = [
            (ServiceError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidCourseId("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::InvalidProgress("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::CourseNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (ServiceError::NotEnrolled(Uuid::nil()), StatusCode::NOT_FOUND),
            (ServiceError::DuplicateEnrollment(Uuid::nil()), StatusCode::CONFLICT),
            (ServiceError::StoreFailure("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn store_failure_keeps_the_underlying_message() {
        let err = ApiError::from(ServiceError::StoreFailure("connection refused".into()));
        assert_eq!(err.to_string(), "connection refused");
    }
}
