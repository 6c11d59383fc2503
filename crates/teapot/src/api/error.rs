//! API error types and HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::fleet::FleetError;
use crate::workstation::WorkstationError;

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors rendered to API clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidJson(String),

    #[error("{0}")]
    InvalidWorkstation(String),

    #[error("{0}")]
    DuplicateWorkstation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    AttachFailed(String),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub name: String,
    pub message: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_)
            | ApiError::InvalidWorkstation(_)
            | ApiError::DuplicateWorkstation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::AttachFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Type tag carried in the `name` field of the body.
    pub fn error_name(&self) -> &'static str {
        match self {
            ApiError::InvalidJson(_) => "InvalidJSON",
            ApiError::InvalidWorkstation(_) => "InvalidWorkstation",
            ApiError::DuplicateWorkstation(_) => "DuplicateWorkstation",
            ApiError::NotFound(_) => "WorkstationNotFound",
            ApiError::Upstream(_) => "UpstreamError",
            ApiError::AttachFailed(_) => "AttachFailed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(name = self.error_name(), "API error: {}", self);
        } else {
            debug!(name = self.error_name(), "API client error: {}", self);
        }

        let body = Json(ErrorResponse {
            name: self.error_name().to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<WorkstationError> for ApiError {
    fn from(err: WorkstationError) -> Self {
        let message = err.to_string();
        match err {
            WorkstationError::Validation(_) | WorkstationError::NotReady { .. } => {
                ApiError::InvalidWorkstation(message)
            }
            WorkstationError::Duplicate { .. } => ApiError::DuplicateWorkstation(message),
            WorkstationError::NotFound(_) => ApiError::NotFound(message),
            WorkstationError::Upstream(FleetError::NotFound(name)) => {
                ApiError::NotFound(WorkstationError::NotFound(name).to_string())
            }
            WorkstationError::Upstream(_) | WorkstationError::Agent(_) => {
                ApiError::Upstream(message)
            }
            WorkstationError::Connect { .. } | WorkstationError::Upgrade(_) => {
                ApiError::AttachFailed(message)
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidJson(format!("Failed to parse the request body as JSON: {err}"))
    }
}
