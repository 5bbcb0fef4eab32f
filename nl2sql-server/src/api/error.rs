//! Error envelope for failed requests.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nl2sql_core::ErrorKind;
use serde_json::json;

/// A failed request, rendered as
/// `{"success": false, "error": {"message", "type", "timestamp"}}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub kind: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, kind: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            kind,
        }
    }

    /// Map a pipeline failure to a status code.
    ///
    /// Oracle failures are the server's problem (500); SQL that fails
    /// validation or execution is the request's (400).
    pub fn from_pipeline(kind: Option<ErrorKind>, message: Option<String>) -> Self {
        let message = message.unwrap_or_else(|| "Request failed".to_string());
        match kind {
            Some(ErrorKind::Validation) => Self::new(StatusCode::BAD_REQUEST, message, "validation_error"),
            Some(ErrorKind::Execution) => Self::new(StatusCode::BAD_REQUEST, message, "execution_error"),
            Some(ErrorKind::Generation) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "generation_error")
            }
            Some(ErrorKind::Timeout) => Self::new(StatusCode::GATEWAY_TIMEOUT, message, "timeout"),
            Some(ErrorKind::Schema) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "schema_error"),
            Some(ErrorKind::Internal) | None => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, "server_error")
            }
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Endpoint not found", "not_found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": {
                "message": self.message,
                "type": self.kind,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        });
        (self.status, Json(body)).into_response()
    }
}
