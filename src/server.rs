//! HTTP server for the viewer.
//!
//! Serves the single-page client and a small JSON API. Every request is
//! independent: nothing is cached between requests and each handler goes
//! back to the filesystem. Filesystem work runs on the blocking pool.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Client shell (`?file=` preselects a file) |
//! | `GET`  | `/api/files` | All markdown files under the root |
//! | `GET`  | `/api/file?path=` | Raw content of one file |
//! | `GET`  | `/api/search?q=` | Case-insensitive content search |
//! | `GET`  | `/api/tags` | Tags and opened flags for the whole tree |
//! | `POST` | `/api/tag` | Add, remove, or clear a file's tags |
//! | `POST` | `/api/opened` | Mark a file as opened |
//! | `POST` | `/api/archive` | Move files into `.archive` folders |
//! | `GET`  | `/api/health` | Health check |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid path: ../x.md" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `method_not_allowed` (405), `internal` (500). Internal errors never
//! carry details; those go to the log.

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::archive_files;
use crate::config::Config;
use crate::error::ViewerError;
use crate::index::list_markdown_files;
use crate::metadata::fs::FsMetadataStore;
use crate::metadata::{collect_all, update, AllMetadata, MetadataRepository};
use crate::page::render_index;
use crate::paths::{is_markdown_file, sanitize_relative_path, secure_join, split_dir_file};
use crate::search::{search_files, SearchHit};
use crate::tags::{Tag, TagAction};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Canonical root directory every request path is resolved against.
    root: Arc<PathBuf>,
    /// Per-directory tag and opened-state storage.
    store: Arc<dyn MetadataRepository>,
}

impl AppState {
    /// `root` must already be absolute (see [`crate::config::resolve_root`]).
    pub fn new(root: PathBuf, store: Arc<dyn MetadataRepository>) -> Self {
        Self {
            root: Arc::new(root),
            store,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Builds the router with all routes and fallbacks.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/api/files", get(handle_files))
        .route("/api/file", get(handle_file))
        .route("/api/search", get(handle_search))
        .route("/api/tags", get(handle_tags))
        .route("/api/tag", post(handle_set_tag))
        .route("/api/opened", post(handle_mark_opened))
        .route("/api/archive", post(handle_archive))
        .route("/api/health", get(handle_health))
        .fallback(handle_not_found)
        .method_not_allowed_fallback(handle_method_not_allowed)
        .with_state(state)
}

/// Starts the server and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::new(config.root.clone(), Arc::new(FsMetadataStore::new()));
    let app = router(state);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!(
        "Markdown viewer running on http://{} (root: {})",
        addr,
        config.root.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============ Responses ============

/// JSON body with an explicit UTF-8 charset.
struct ApiJson<T>(T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], Json(self.0)).into_response()
    }
}

/// JSON error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    /// HTTP status of the response.
    status: StatusCode,
    /// Copied into [`ErrorDetail::code`].
    code: &'static str,
    /// Safe to show to the client; never carries server-side paths.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, ApiJson(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

/// Logs the cause and returns a detail-free 500.
fn internal(context: &str, cause: impl std::fmt::Display) -> AppError {
    log::error!("{}: {}", context, cause);
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: context.to_string(),
    }
}

impl From<ViewerError> for AppError {
    fn from(err: ViewerError) -> Self {
        match err {
            ViewerError::NotFound(_) => not_found(err.to_string()),
            e if e.is_client_error() => bad_request(e.to_string()),
            e => internal("internal error", e),
        }
    }
}

/// Runs filesystem work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, ViewerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| internal("task failed", e))?
        .map_err(AppError::from)
}

/// Decodes a JSON request body regardless of its declared content type.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| bad_request("invalid request body"))
}

/// Sanitizes a request path and insists on a markdown extension.
fn markdown_path(raw: &str) -> Result<String, AppError> {
    let rel = sanitize_relative_path(raw)?;
    if !is_markdown_file(&rel) {
        return Err(ViewerError::NotMarkdownFile(rel).into());
    }
    Ok(rel)
}

async fn handle_not_found() -> AppError {
    not_found("not found")
}

async fn handle_method_not_allowed() -> AppError {
    AppError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        code: "method_not_allowed",
        message: "method not allowed".to_string(),
    }
}

// ============ GET / ============

#[derive(Deserialize)]
struct IndexParams {
    /// File to select when the page loads.
    #[serde(default)]
    file: String,
}

async fn handle_index(
    State(state): State<AppState>,
    params: Result<Query<IndexParams>, QueryRejection>,
) -> Html<String> {
    // A malformed query only loses the initial selection; the page is still served.
    let file = match params {
        Ok(Query(params)) => params.file,
        Err(e) => {
            log::debug!("ignoring index query: {}", e);
            String::new()
        }
    };
    let initial_file = sanitize_relative_path(&file).unwrap_or_default();
    Html(render_index(state.root(), &initial_file))
}

// ============ GET /api/files ============

#[derive(Serialize)]
struct FilesResponse {
    /// Absolute root directory, for display.
    root: String,
    /// Root-relative, forward-slash paths in sorted order.
    files: Vec<String>,
}

async fn handle_files(State(state): State<AppState>) -> Result<ApiJson<FilesResponse>, AppError> {
    let root = state.root.clone();
    let files = blocking(move || list_markdown_files(&root)).await?;
    Ok(ApiJson(FilesResponse {
        root: state.root().display().to_string(),
        files,
    }))
}

// ============ GET /api/file ============

#[derive(Deserialize)]
struct FileParams {
    /// Root-relative markdown path.
    #[serde(default)]
    path: String,
}

#[derive(Serialize)]
struct FileResponse {
    /// Sanitized form of the requested path.
    path: String,
    /// Raw markdown, decoded lossily as UTF-8.
    content: String,
}

async fn handle_file(
    State(state): State<AppState>,
    Query(params): Query<FileParams>,
) -> Result<ApiJson<FileResponse>, AppError> {
    let rel = markdown_path(&params.path)?;
    let full = secure_join(state.root(), &rel)?;

    let missing = rel.clone();
    let content = blocking(move || match std::fs::read(&full) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ViewerError::NotFound(missing)),
        Err(e) => Err(e.into()),
    })
    .await?;

    Ok(ApiJson(FileResponse { path: rel, content }))
}

// ============ GET /api/search ============

#[derive(Deserialize)]
struct SearchParams {
    /// Search text; surrounding whitespace is ignored.
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
struct SearchResponse {
    /// The trimmed query that was run.
    query: String,
    results: Vec<SearchHit>,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<ApiJson<SearchResponse>, AppError> {
    let query = params.q.trim().to_string();
    if query.is_empty() {
        return Err(bad_request("missing query parameter 'q'"));
    }

    let root = state.root.clone();
    let needle = query.clone();
    let results = blocking(move || search_files(&root, &needle)).await?;
    Ok(ApiJson(SearchResponse { query, results }))
}

// ============ GET /api/tags ============

async fn handle_tags(State(state): State<AppState>) -> Result<ApiJson<AllMetadata>, AppError> {
    let root = state.root.clone();
    let store = state.store.clone();
    let all = blocking(move || collect_all(store.as_ref(), &root)).await?;
    Ok(ApiJson(all))
}

// ============ POST /api/tag ============

#[derive(Deserialize)]
struct TagRequest {
    /// Root-relative markdown path.
    #[serde(default)]
    path: String,
    /// One of the fixed tag names; ignored for `clear`.
    #[serde(default)]
    tag: String,
    /// `add` (or empty), `remove`, or `clear`.
    #[serde(default)]
    action: String,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

async fn handle_set_tag(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiJson<OkResponse>, AppError> {
    let req: TagRequest = parse_body(&body)?;
    let rel = markdown_path(&req.path)?;
    let action: TagAction = req.action.parse()?;
    let tag = if action == TagAction::Clear || req.tag.is_empty() {
        None
    } else {
        Some(req.tag.parse::<Tag>()?)
    };

    let (dir_rel, name) = split_dir_file(&rel);
    let dir = secure_join(state.root(), dir_rel)?;
    let name = name.to_string();
    log::debug!("tag {:?} {:?} on {}", action, tag, rel);

    let store = state.store.clone();
    blocking(move || {
        update(store.as_ref(), &dir, |d| d.apply_tag_action(&name, action, tag)).map(|_| ())
    })
    .await?;

    Ok(ApiJson(OkResponse { ok: true }))
}

// ============ POST /api/opened ============

#[derive(Deserialize)]
struct OpenedRequest {
    /// Root-relative markdown path.
    #[serde(default)]
    path: String,
}

async fn handle_mark_opened(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiJson<OkResponse>, AppError> {
    let req: OpenedRequest = parse_body(&body)?;
    let rel = markdown_path(&req.path)?;

    let (dir_rel, name) = split_dir_file(&rel);
    let dir = secure_join(state.root(), dir_rel)?;
    let name = name.to_string();
    log::debug!("opened {}", rel);

    let store = state.store.clone();
    blocking(move || update(store.as_ref(), &dir, |d| d.mark_opened(&name)).map(|_| ())).await?;

    Ok(ApiJson(OkResponse { ok: true }))
}

// ============ POST /api/archive ============

#[derive(Deserialize)]
struct ArchiveRequest {
    /// Root-relative markdown paths to move into `.archive`.
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Serialize)]
struct ArchiveResponse {
    /// Number of files actually moved; failures are skipped.
    moved: usize,
}

async fn handle_archive(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<ApiJson<ArchiveResponse>, AppError> {
    let req: ArchiveRequest = parse_body(&body)?;
    let requested = req.files.len();

    let root = state.root.clone();
    let store = state.store.clone();
    let moved = blocking(move || Ok(archive_files(store.as_ref(), &root, &req.files))).await?;
    log::debug!("archived {} of {} requested files", moved, requested);

    Ok(ApiJson(ArchiveResponse { moved }))
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: &'static str,
}

async fn handle_health() -> ApiJson<HealthResponse> {
    ApiJson(HealthResponse { status: "ok" })
}
