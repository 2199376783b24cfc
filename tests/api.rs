//! In-process tests for the HTTP API.
//!
//! Each test builds a fresh root directory and drives the router with
//! `tower::ServiceExt::oneshot`, so no port is bound.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use mdviewer::metadata::fs::FsMetadataStore;
use mdviewer::metadata::SIDECAR_FILE;
use mdviewer::server::{router, AppState};

fn setup() -> (TempDir, Router) {
    let tmp = TempDir::new().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();

    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(
        root.join("alpha.md"),
        "# Alpha\n\nThis is the alpha document about Rust programming.",
    )
    .unwrap();
    fs::write(
        root.join("docs/beta.markdown"),
        "# Beta\n\nPython and machine learning notes.",
    )
    .unwrap();
    fs::write(root.join("notes.txt"), "Rust in plain text").unwrap();

    let app = router(AppState::new(root, Arc::new(FsMetadataStore::new())));
    (tmp, app)
}

fn root_of(tmp: &TempDir) -> std::path::PathBuf {
    fs::canonicalize(tmp.path()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn read_sidecar(dir: &Path) -> Option<Value> {
    fs::read_to_string(dir.join(SIDECAR_FILE))
        .ok()
        .map(|s| serde_json::from_str(&s).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (_tmp, app) = setup();
    let (status, body) = get_json(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_json_content_type() {
    let (_tmp, app) = setup();
    let req = Request::builder()
        .uri("/api/files")
        .body(Body::empty())
        .unwrap();
    let (_, content_type, _) = send(&app, req).await;
    assert_eq!(content_type, "application/json; charset=utf-8");
}

#[tokio::test]
async fn test_files_lists_markdown_sorted() {
    let (tmp, app) = setup();
    let (status, body) = get_json(&app, "/api/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"], json!(["alpha.md", "docs/beta.markdown"]));
    assert_eq!(body["root"], root_of(&tmp).display().to_string());
}

#[tokio::test]
async fn test_file_content() {
    let (_tmp, app) = setup();
    let (status, body) = get_json(&app, "/api/file?path=./docs/../alpha.md").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], "alpha.md");
    assert!(body["content"].as_str().unwrap().starts_with("# Alpha"));
}

#[tokio::test]
async fn test_file_errors() {
    let (_tmp, app) = setup();

    let (status, body) = get_json(&app, "/api/file?path=../etc/passwd.md").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = get_json(&app, "/api/file?path=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&app, "/api/file?path=notes.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json(&app, "/api/file?path=missing.md").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_search() {
    let (_tmp, app) = setup();
    let (status, body) = get_json(&app, "/api/search?q=%20RUST%20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "RUST");
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["path"], "alpha.md");
    assert!(results[0]["context"].as_str().unwrap().contains("Rust"));
}

#[tokio::test]
async fn test_search_long_context_has_ellipses() {
    let (tmp, app) = setup();
    let text = format!("{} hello {}", "x".repeat(100), "y".repeat(100));
    fs::write(root_of(&tmp).join("long.md"), text).unwrap();

    let (_, body) = get_json(&app, "/api/search?q=hello").await;
    let ctx = body["results"][0]["context"].as_str().unwrap();
    assert!(ctx.starts_with('…'));
    assert!(ctx.ends_with('…'));
    assert!(ctx.contains("hello"));
}

#[tokio::test]
async fn test_search_requires_query() {
    let (_tmp, app) = setup();
    let (status, _) = get_json(&app, "/api/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_json(&app, "/api/search?q=%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tag_add_is_idempotent() {
    let (tmp, app) = setup();
    for _ in 0..2 {
        let (status, body) = post_json(
            &app,
            "/api/tag",
            json!({"path": "alpha.md", "tag": "DONE", "action": "add"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));
    }

    let sidecar = read_sidecar(&root_of(&tmp)).unwrap();
    assert_eq!(sidecar["tags"]["alpha.md"], json!(["DONE"]));

    let (_, tags) = get_json(&app, "/api/tags").await;
    assert_eq!(tags["tags"]["alpha.md"], json!(["DONE"]));
}

#[tokio::test]
async fn test_tag_default_action_and_nested_dir() {
    let (tmp, app) = setup();
    let (status, _) = post_json(
        &app,
        "/api/tag",
        json!({"path": "docs/beta.markdown", "tag": "NEXT"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let sidecar = read_sidecar(&root_of(&tmp).join("docs")).unwrap();
    assert_eq!(sidecar["tags"]["beta.markdown"], json!(["NEXT"]));

    let (_, tags) = get_json(&app, "/api/tags").await;
    assert_eq!(tags["tags"]["docs/beta.markdown"], json!(["NEXT"]));
}

#[tokio::test]
async fn test_invalid_tag_leaves_state_unchanged() {
    let (tmp, app) = setup();
    post_json(&app, "/api/tag", json!({"path": "alpha.md", "tag": "IMPORTANT"})).await;
    let before = read_sidecar(&root_of(&tmp));

    let (status, body) = post_json(
        &app,
        "/api/tag",
        json!({"path": "alpha.md", "tag": "WONTFIX", "action": "add"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(read_sidecar(&root_of(&tmp)), before);
}

#[tokio::test]
async fn test_tag_request_validation() {
    let (_tmp, app) = setup();

    let (status, _) = post_json(
        &app,
        "/api/tag",
        json!({"path": "alpha.md", "tag": "DONE", "action": "toggle"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&app, "/api/tag", json!({"path": "notes.txt", "tag": "DONE"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(&app, "/api/tag", json!({"path": "../x.md", "tag": "DONE"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/tag")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tag_remove_and_clear() {
    let (tmp, app) = setup();
    let root = root_of(&tmp);
    post_json(&app, "/api/tag", json!({"path": "alpha.md", "tag": "DONE"})).await;
    post_json(&app, "/api/tag", json!({"path": "alpha.md", "tag": "REVISIT"})).await;

    post_json(
        &app,
        "/api/tag",
        json!({"path": "alpha.md", "tag": "DONE", "action": "remove"}),
    )
    .await;
    assert_eq!(read_sidecar(&root).unwrap()["tags"]["alpha.md"], json!(["REVISIT"]));

    let (status, _) = post_json(
        &app,
        "/api/tag",
        json!({"path": "alpha.md", "tag": "not-checked", "action": "clear"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Nothing left, so the sidecar is removed.
    assert!(read_sidecar(&root).is_none());
}

#[tokio::test]
async fn test_mark_opened() {
    let (_tmp, app) = setup();
    let (status, body) = post_json(&app, "/api/opened", json!({"path": "docs/beta.markdown"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let (_, tags) = get_json(&app, "/api/tags").await;
    assert_eq!(tags["opened"], json!({"docs/beta.markdown": true}));
    assert_eq!(tags["tags"], json!({}));

    let (status, _) = post_json(&app, "/api/opened", json!({"path": "notes.txt"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tags_reads_legacy_sidecar() {
    let (tmp, app) = setup();
    fs::write(
        root_of(&tmp).join("docs").join(SIDECAR_FILE),
        r#"{"tags":{"beta.markdown":"IMPORTANT"}}"#,
    )
    .unwrap();
    let (status, tags) = get_json(&app, "/api/tags").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags["tags"]["docs/beta.markdown"], json!(["IMPORTANT"]));
}

#[tokio::test]
async fn test_archive() {
    let (tmp, app) = setup();
    let root = root_of(&tmp);
    post_json(&app, "/api/tag", json!({"path": "alpha.md", "tag": "ARCHIVE"})).await;
    post_json(&app, "/api/opened", json!({"path": "alpha.md"})).await;

    let (status, body) = post_json(
        &app,
        "/api/archive",
        json!({"files": ["alpha.md", "missing.md", "../x.md", "notes.txt"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"moved": 1}));
    assert!(!root.join("alpha.md").exists());
    assert!(root.join(".archive/alpha.md").exists());

    let (_, tags) = get_json(&app, "/api/tags").await;
    assert!(tags["tags"].get("alpha.md").is_none());
    assert!(tags["opened"].get("alpha.md").is_none());
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (_tmp, app) = setup();
    let (status, body) = get_json(&app, "/api/tag").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "method_not_allowed");

    let (status, _) = post_json(&app, "/api/files", json!({})).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (_tmp, app) = setup();
    let (status, body) = get_json(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_index_page() {
    let (tmp, app) = setup();
    let req = Request::builder()
        .uri("/?file=docs/beta.markdown")
        .body(Body::empty())
        .unwrap();
    let (status, content_type, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "text/html; charset=utf-8");
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"const INITIAL_FILE = "docs/beta.markdown";"#));
    assert!(html.contains(&root_of(&tmp).display().to_string()));

    let req = Request::builder()
        .uri("/?file=../../etc/passwd")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(&app, req).await;
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"const INITIAL_FILE = "";"#));
}

#[tokio::test]
async fn test_index_page_survives_malformed_query() {
    let (_tmp, app) = setup();
    for uri in ["/?file=a.md&file=b.md", "/?file=%ZZ", "/?file"] {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (status, content_type, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK, "uri={}", uri);
        assert_eq!(content_type, "text/html; charset=utf-8");
        let html = String::from_utf8(body).unwrap();
        assert!(html.contains("const INITIAL_FILE = "), "uri={}", uri);
    }

    let req = Request::builder()
        .uri("/?file=a.md&file=b.md")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(&app, req).await;
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains(r#"const INITIAL_FILE = "";"#));
}
