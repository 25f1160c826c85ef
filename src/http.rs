use crate::config::Config;
use crate::db::Db;
use crate::error::{Result, StaffloadError};
use crate::ingest::{IngestionOrchestrator, UploadedFile};
use crate::reports;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Upload and reporting endpoints
pub struct HttpServer {
    state: AppState,
    port: u16,
    max_upload_bytes: usize,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<IngestionOrchestrator>,
    db: Db,
    // One ingestion run at a time; each run holds its write transaction until it commits.
    run_lock: Arc<Mutex<()>>,
    report_year: i32,
}

#[derive(Debug, Deserialize)]
struct YearQuery {
    year: Option<i32>,
}

impl HttpServer {
    pub fn new(db: Db, config: &Config) -> Self {
        let orchestrator = IngestionOrchestrator::new(db.clone(), config.ingest_options());
        Self {
            state: AppState {
                orchestrator: Arc::new(orchestrator),
                db,
                run_lock: Arc::new(Mutex::new(())),
                report_year: config.reports.year,
            },
            port: config.http_server.port,
            max_upload_bytes: config.http_server.max_upload_bytes,
        }
    }

    /// Run the HTTP server
    pub async fn run(&self) -> Result<()> {
        let app = self.router();

        let addr = format!("127.0.0.1:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| StaffloadError::Config(format!(
                "Failed to bind to {}: {}. Set http_server.port in config.toml to use another port.",
                addr, e
            )))?;

        log::info!("Starting HTTP server on http://{}", addr);
        log::info!("Upload endpoint: http://{}/upload-csv", addr);
        let options = self.state.orchestrator.options();
        log::info!(
            "Ingestion: strategy {:?}, commit {:?}, batch size {}, up to {} file(s) per upload",
            options.strategy,
            options.commit_mode,
            options.batch_size,
            options.max_files
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| StaffloadError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP server error: {}", e)
            )))?;

        Ok(())
    }

    /// Create the axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/upload-csv", post(handle_upload))
            .route("/employees-hired-by-job-department-quarter", get(handle_hires_by_quarter))
            .route("/departments-hired-above-mean", get(handle_departments_above_mean))
            .route("/health", get(handle_health))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(DefaultBodyLimit::max(self.max_upload_bytes))
            )
            .with_state(self.state.clone())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Map a failed run to its HTTP status.
fn ingest_error_response(err: &StaffloadError) -> Response {
    match err {
        StaffloadError::Validation(msg) => error_response(StatusCode::BAD_REQUEST, msg.clone()),
        StaffloadError::Coercion { .. } => error_response(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        StaffloadError::Write { file, .. } => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to load {}", file))
        }
        other => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

/// Every multipart part carrying a filename is one uploaded file.
async fn read_uploads(mut multipart: Multipart) -> std::result::Result<Vec<UploadedFile>, String> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed multipart body: {}", e.body_text()))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| format!("failed to read {}: {}", filename, e.body_text()))?;
        files.push(UploadedFile::new(filename, bytes.to_vec()));
    }
    Ok(files)
}

async fn handle_upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let files = match read_uploads(multipart).await {
        Ok(files) => files,
        Err(msg) => {
            log::warn!("Rejected upload: {}", msg);
            return error_response(StatusCode::BAD_REQUEST, msg);
        }
    };

    let _run = state.run_lock.lock().await;
    match state.orchestrator.run(files).await {
        Ok(report) => (StatusCode::OK, Json(report.files)).into_response(),
        Err(e) => ingest_error_response(&e),
    }
}

async fn handle_hires_by_quarter(State(state): State<AppState>, Query(query): Query<YearQuery>) -> Response {
    let year = query.year.unwrap_or(state.report_year);
    match state
        .db
        .with_connection(move |conn| reports::hires_by_quarter(conn, year))
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            log::error!("Quarterly hires report failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn handle_departments_above_mean(State(state): State<AppState>, Query(query): Query<YearQuery>) -> Response {
    let year = query.year.unwrap_or(state.report_year);
    match state
        .db
        .with_connection(move |conn| reports::departments_above_mean(conn, year))
        .await
    {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => {
            log::error!("Departments above mean report failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn handle_health() -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "staffload",
            "version": env!("CARGO_PKG_VERSION")
        }))
    ).into_response()
}
