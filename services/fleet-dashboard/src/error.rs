//! HTTP mapping of [`FleetError`]

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleet_core::FleetError;
use serde::Serialize;
use tracing::{error, warn};

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Wraps [`FleetError`] so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub FleetError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            FleetError::AgentNotFound { .. } => StatusCode::NOT_FOUND,
            FleetError::NoContainer { .. } | FleetError::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            FleetError::RuntimeUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            FleetError::RuntimeFailure { .. }
            | FleetError::ActionFailed { .. }
            | FleetError::Io { .. }
            | FleetError::Corrupt { .. }
            | FleetError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Storage details stay in the logs.
    fn message(&self) -> String {
        match &self.0 {
            FleetError::AgentNotFound { .. } => "Agent not found".to_string(),
            FleetError::NoContainer { .. } => "Agent has no container configured".to_string(),
            FleetError::InvalidRequest { reason } => reason.clone(),
            FleetError::RuntimeUnavailable => "Docker is not available".to_string(),
            FleetError::RuntimeFailure { .. } => "Failed to fetch logs".to_string(),
            FleetError::ActionFailed { action, .. } => format!("Failed to {action} container"),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_storage() {
            error!(error = %self.0, "document store failure");
        } else if status.is_server_error() {
            error!(error = %self.0, "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }
        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}
