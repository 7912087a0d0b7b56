//! REST API types.
//!
//! Successful report requests return the report itself (nested view JSON or
//! XLSX bytes), so only health and error payloads are modelled here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ServerError;

/// Query string of `POST /api/report`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    /// Ask for an XLSX workbook instead of JSON.
    #[serde(default)]
    pub excel: Option<String>,
}

impl ReportQuery {
    pub fn wants_excel(&self) -> bool {
        self.excel.as_deref().map(parse_bool).unwrap_or(false)
    }
}

/// Truthy form/query values: `true`, `1`, `yes`, `on`.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Payload of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Value,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok",
            service: "planpivot",
            version: env!("CARGO_PKG_VERSION"),
            endpoints: json!({
                "report": "POST /api/report (multipart 'file', optional 'excel')",
                "health": "GET /health"
            }),
        }
    }
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    /// HTTP status for this error: caller mistakes are 400, the rest 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Pipeline errors already carry a full message.
        let message = match &self {
            ServerError::Pipeline(e) => e.to_string(),
            other => other.to_string(),
        };
        (status, Json(error_response(&message))).into_response()
    }
}
