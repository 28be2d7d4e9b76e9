//! HTTP transport layer.
//!
//! Exposes the chat pipeline and document store over a JSON HTTP API with a
//! server-sent-events stream per job.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Service banner |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/api/chat` | Submit a query, returns a job id |
//! | `GET`  | `/api/chat/stream/{job_id}` | SSE stream of answer events |
//! | `GET`  | `/api/documents` | List loaded documents |
//! | `POST` | `/api/documents/reload` | Reload the corpus from disk |
//! | `GET`  | `/api/documents/{filename}` | Raw document bytes |
//!
//! # Error Contract
//!
//! Failures outside a stream use the JSON error schema:
//!
//! ```json
//! { "error": { "code": "not_found", "message": "Job not found" } }
//! ```
//!
//! Once a stream has started, failures surface as a terminal `error` event
//! inside the stream, never as a transport-level failure.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! chat clients.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::{Config, PacingConfig};
use crate::generate::{self, AnswerProvider};
use crate::jobs::JobRegistry;
use crate::pipeline;
use crate::store::DocumentStore;

/// Shared application state passed to all route handlers via Axum's `State`
/// extractor.
#[derive(Clone)]
struct AppState {
    store: Arc<DocumentStore>,
    jobs: Arc<JobRegistry>,
    provider: Arc<dyn AnswerProvider>,
    pacing: PacingConfig,
}

/// Starts the HTTP server.
///
/// Loads the document corpus, selects the answer provider once, binds to
/// the address configured in `[server].bind`, and serves until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = Arc::new(DocumentStore::open(&config.documents.dir)?);
    let provider: Arc<dyn AnswerProvider> = Arc::from(generate::create_provider(&config.generation)?);
    let jobs = Arc::new(JobRegistry::new(
        config.jobs.ttl_secs,
        config.jobs.max_pending,
    ));

    let state = AppState {
        store,
        jobs,
        provider,
        pacing: config.pacing,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .route("/api/chat/stream/{job_id}", get(handle_stream))
        .route("/api/documents", get(handle_list_documents))
        .route("/api/documents/reload", post(handle_reload_documents))
        .route("/api/documents/{filename}", get(handle_get_document))
        .layer(cors)
        .with_state(state);

    tracing::info!("docqa server listening on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Inner error detail with a machine-readable code and human-readable message.
#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

// ============ GET / and GET /health ============

#[derive(Serialize)]
struct BannerResponse {
    message: String,
    version: String,
}

async fn handle_root() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: "docqa document Q&A API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    /// Reserved for multi-turn clients; the pipeline does not use it yet.
    #[serde(default)]
    #[allow(dead_code)]
    conversation_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    job_id: String,
    message: String,
}

/// Registers a query and returns the job id for the stream endpoint.
async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    let job_id = state.jobs.submit(&request.message);
    Ok(Json(ChatResponse {
        job_id,
        message: "Job created".to_string(),
    }))
}

// ============ GET /api/chat/stream/{job_id} ============

/// Opens the SSE stream for a submitted job.
///
/// An unknown job id fails with 404 before any streaming begins. Each
/// pipeline event becomes one SSE data frame carrying the event's JSON.
async fn handle_stream(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let job = state
        .jobs
        .lookup(&job_id)
        .ok_or_else(|| not_found("Job not found"))?;
    state.jobs.mark_processing(&job_id);

    let events = pipeline::answer_events(
        state.store.clone(),
        state.provider.clone(),
        state.pacing,
        job.query,
    );

    let frames = events.map(|event| {
        let frame = Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data(r#"{"type":"error","content":"event serialization failed"}"#));
        Ok(frame)
    });

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}

// ============ GET /api/documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<String>,
}

async fn handle_list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        documents: state.store.list(),
    })
}

// ============ POST /api/documents/reload ============

#[derive(Serialize)]
struct ReloadResponse {
    message: String,
    documents: Vec<String>,
}

async fn handle_reload_documents(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let count = state.store.reload().map_err(|e| internal(e.to_string()))?;
    Ok(Json(ReloadResponse {
        message: format!("Reloaded {} documents", count),
        documents: state.store.list(),
    }))
}

// ============ GET /api/documents/{filename} ============

/// Serves raw document bytes for viewer clients.
///
/// The filename must be a bare name; anything resembling a path escape is
/// rejected before touching the filesystem.
async fn handle_get_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(bad_request("invalid document name"));
    }

    let path = state.store.path_for(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| not_found(format!("document not found: {}", filename)))?;

    let content_type = if filename.to_ascii_lowercase().ends_with(".pdf") {
        "application/pdf"
    } else {
        "text/plain; charset=utf-8"
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename={}", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
