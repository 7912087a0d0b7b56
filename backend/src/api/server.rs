//! HTTP server for the planpivot API.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                                   |
//! |--------|----------------|-----------------------------------------------|
//! | GET    | `/health`      | Health check                                  |
//! | POST   | `/api/report`  | Upload CSV/XLSX, get the report (JSON / XLSX) |
//!
//! `POST /api/report` takes a multipart form with a `file` field. An
//! `excel` form field or `?excel=true` asks for a workbook instead of JSON.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, Method},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use super::types::{parse_bool, HealthResponse, ReportQuery};
use crate::config::ReportConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::labels::LabelRegistry;
use crate::parser::parse_bytes_auto;
use crate::transform::pipeline::{build_report_from_table, ExportMode, ReportOutput};

/// Uploads larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared, read-only server state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ReportConfig>,
    pub labels: Arc<LabelRegistry>,
}

impl AppState {
    /// Resolve the label registry once, up front.
    pub fn new(config: ReportConfig) -> ServerResult<Self> {
        let labels = config.load_labels().map_err(PipelineError::from)?;
        Ok(Self {
            config: Arc::new(config),
            labels: Arc::new(labels),
        })
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/report", post(create_report))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
pub async fn start_server(port: u16, config: ReportConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(AppState::new(config)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "planpivot server listening");
    info!("POST /api/report - upload CSV/XLSX, get the report");
    info!("GET  /health     - health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Upload endpoint: parse, build and render the report.
async fn create_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
    mut multipart: Multipart,
) -> Result<Response, ServerError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut excel = query.wants_excel();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "excel" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                excel = excel || parse_bool(&value);
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let mode = ExportMode::from(excel);
    info!(
        file = file_name.as_deref().unwrap_or("unknown"),
        bytes = bytes.len(),
        ?mode,
        "Report requested"
    );

    let output = tokio::task::spawn_blocking(move || render_upload(&bytes, mode, &state))
        .await
        .map_err(|e| ServerError::Internal(format!("Report task failed: {}", e)))?
        .map_err(|e| {
            error!(error = %e, "Report failed");
            ServerError::from(e)
        })?;

    Ok(into_http_response(output))
}

fn render_upload(bytes: &[u8], mode: ExportMode, state: &AppState) -> Result<ReportOutput, PipelineError> {
    let parsed = parse_bytes_auto(bytes)?;
    build_report_from_table(&parsed, &state.config, &state.labels)?.render(mode, &state.labels)
}

fn into_http_response(output: ReportOutput) -> Response {
    let content_type = output.content_type();
    match output {
        ReportOutput::Json(json) => ([(header::CONTENT_TYPE, content_type)], json).into_response(),
        ReportOutput::Spreadsheet(bytes) => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"report.xlsx\""),
            ],
            bytes,
        )
            .into_response(),
    }
}
