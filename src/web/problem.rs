use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::core::LedgerError;

pub type ApiResult<T> = Result<T, ApiFailure>;

/// Failure body: `{ statusCode, error, message }`.
///
/// `message` names where the failure originated, e.g. `found at accounts`.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    error: String,
    message: String,
}

impl ApiFailure {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiFailure {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::Validation(_) | LedgerError::NoFieldsToUpdate => StatusCode::BAD_REQUEST,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::InvalidState(_) => StatusCode::CONFLICT,
            LedgerError::Store { .. }
            | LedgerError::PartialBatch { .. }
            | LedgerError::MultiWrite { .. } => StatusCode::BAD_GATEWAY,
            LedgerError::AllocationExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::Serialization(_) | LedgerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let message = match err.collection() {
            Some(collection) => format!("found at {collection}"),
            None if status.is_client_error() => "invalid request".to_string(),
            None => "found at service".to_string(),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %err, %message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %err, "request rejected");
        }
        Self::new(status, err.to_string(), message)
    }
}

impl From<JsonRejection> for ApiFailure {
    fn from(rejection: JsonRejection) -> Self {
        let error = rejection.body_text();
        warn!(status = rejection.status().as_u16(), %error, "malformed request body");
        Self::new(StatusCode::BAD_REQUEST, error, "invalid request")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody {
    status_code: u16,
    error: String,
    message: String,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = FailureBody {
            status_code: self.status.as_u16(),
            error: self.error,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
