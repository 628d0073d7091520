//! HTTP API tests: the axum router driven in-process with `oneshot`, using
//! a stand-in PDF renderer so no browser is needed.
//!
//! Run with:
//!   cargo test --test server

#![cfg(feature = "server")]

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{failing_converter, fake_converter};
use edgequake_md2pdf::server::{router, AppState};
use edgequake_md2pdf::{AppConfig, Converter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "md2pdf-test-boundary";

// ── Test helpers ─────────────────────────────────────────────────────────────

struct TestApp {
    _dir: TempDir,
    state: AppState,
    public: PathBuf,
    uploads: PathBuf,
}

impl TestApp {
    fn with(converter: Converter, max_upload: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let public = dir.path().join("public");
        let uploads = dir.path().join("uploads");
        let config = AppConfig::builder()
            .public_dir(&public)
            .assets_dir(dir.path().join("assets"))
            .upload_dir(&uploads)
            .max_upload_bytes(max_upload)
            .build()
            .unwrap();
        Self {
            _dir: dir,
            state: AppState::with_converter(config, converter),
            public,
            uploads,
        }
    }

    fn new() -> Self {
        Self::with(fake_converter().0, 1024 * 1024)
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }

    fn staged_uploads(&self) -> usize {
        match std::fs::read_dir(&self.uploads) {
            Ok(rd) => rd.count(),
            Err(_) => 0,
        }
    }
}

enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn convert_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/convert")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn md_file<'a>(filename: &'a str, data: &'a [u8]) -> Part<'a> {
    Part::File {
        name: "markdown-file",
        filename,
        content_type: "text/markdown",
        data,
    }
}

fn exists(dir: &Path, name: &str) -> bool {
    dir.join(name).is_file()
}

// ── POST /convert ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_converts_and_cleans_up() {
    let t = TestApp::new();
    let req = convert_request(&[
        md_file("notes.md", b"# Notes\n\nHello"),
        Part::Text {
            name: "pageSize",
            value: "Letter",
        },
        Part::Text {
            name: "marginTop",
            value: "",
        },
    ]);
    let (status, json) = send(t.app(), req).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["filename"], "notes.md");
    assert_eq!(json["html"], "/public/notes.html");
    assert_eq!(json["pdf"], "/public/notes.pdf");

    assert!(exists(&t.public, "notes.pdf"));
    let html = std::fs::read_to_string(t.public.join("notes.html")).unwrap();
    assert!(html.contains("preview-nav"), "HTML should be the preview shell");
    assert!(html.contains("<h1>Notes</h1>"));
    assert_eq!(t.staged_uploads(), 0, "uploaded temp file must be removed");
}

#[tokio::test]
async fn test_pasted_markdown_with_filename() {
    let t = TestApp::new();
    let req = convert_request(&[
        Part::Text {
            name: "markdown",
            value: "Pasted *text*",
        },
        Part::Text {
            name: "filename",
            value: "my notes.md",
        },
    ]);
    let (status, json) = send(t.app(), req).await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["html"], "/public/my%20notes.html");
    assert!(exists(&t.public, "my notes.pdf"));
}

#[tokio::test]
async fn test_non_markdown_upload_is_rejected() {
    let t = TestApp::new();
    let req = convert_request(&[Part::File {
        name: "markdown-file",
        filename: "evil.exe",
        content_type: "application/octet-stream",
        data: b"MZ",
    }]);
    let (status, json) = send(t.app(), req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("evil.exe"));
    assert_eq!(t.staged_uploads(), 0);
}

#[tokio::test]
async fn test_missing_upload_is_bad_request() {
    let t = TestApp::new();
    let req = convert_request(&[Part::Text {
        name: "pageSize",
        value: "A4",
    }]);
    let (status, json) = send(t.app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_empty_upload_is_rejected_and_cleaned() {
    let t = TestApp::new();
    let (status, json) = send(t.app(), convert_request(&[md_file("empty.md", b"  \n")])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {json}");
    assert_eq!(t.staged_uploads(), 0);
    assert!(!exists(&t.public, "empty.html"));
}

#[tokio::test]
async fn test_invalid_option_is_bad_request() {
    let t = TestApp::new();
    let req = convert_request(&[
        md_file("a.md", b"# a"),
        Part::Text {
            name: "orientation",
            value: "diagonal",
        },
    ]);
    let (status, json) = send(t.app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("orientation"));
    assert!(!exists(&t.public, "a.html"));
}

#[tokio::test]
async fn test_render_failure_is_500_and_cleans_upload() {
    let t = TestApp::with(failing_converter(), 1024 * 1024);
    let (status, json) = send(t.app(), convert_request(&[md_file("a.md", b"# a")])).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("browser crashed"));
    assert_eq!(t.staged_uploads(), 0);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let t = TestApp::with(fake_converter().0, 64);
    let big = vec![b'a'; 100];
    let (status, _) = send(t.app(), convert_request(&[md_file("big.md", &big)])).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(t.staged_uploads(), 0);
    assert!(!exists(&t.public, "big.html"));
}

// ── GET /example ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_example_uses_query_options() {
    let t = TestApp::new();
    let (status, json) = send(
        t.app(),
        get("/example?colorBlindFriendly=true&codeTheme=monokai"),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["filename"], "example.md");
    assert_eq!(json["pdf"], "/public/example.pdf");
    let html = std::fs::read_to_string(t.public.join("example.html")).unwrap();
    assert!(html.contains("/assets/css/custom-styles-cb.css"));
    assert!(html.contains("data-code-theme=\"monokai\""));
}

#[tokio::test]
async fn test_example_missing_source_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::builder()
        .public_dir(dir.path().join("public"))
        .example_path(dir.path().join("nope.md"))
        .build()
        .unwrap();
    let app = router(AppState::with_converter(config, fake_converter().0));
    let (status, json) = send(app, get("/example")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

// ── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_files_and_details() {
    let t = TestApp::new();
    let (_, json) = send(t.app(), get("/list-files")).await;
    assert_eq!(json["files"], serde_json::json!([]), "missing dir lists nothing");

    for name in ["a.md", "b.md"] {
        let (status, _) = send(t.app(), convert_request(&[md_file(name, b"# doc")])).await;
        assert_eq!(status, StatusCode::OK);
    }
    std::fs::write(t.public.join("stray.txt"), b"x").unwrap();

    let (status, json) = send(t.app(), get("/list-files")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["files"],
        serde_json::json!(["a.html", "a.pdf", "b.html", "b.pdf"])
    );

    let (status, json) = send(t.app(), get("/public-files")).await;
    assert_eq!(status, StatusCode::OK);
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 4);
    for f in files {
        assert!(f["name"].is_string());
        assert!(f["type"] == "html" || f["type"] == "pdf");
        assert!(f["size"].as_u64().unwrap() > 0);
        assert!(f["lastModified"].is_string());
    }
}

// ── DELETE /delete-files/:basename ───────────────────────────────────────────

#[tokio::test]
async fn test_delete_removes_pair() {
    let t = TestApp::new();
    send(t.app(), convert_request(&[md_file("gone.md", b"# bye")])).await;

    let (status, json) = send(t.app(), delete("/delete-files/gone")).await;
    assert_eq!(status, StatusCode::OK, "body: {json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["deleted"], serde_json::json!(["gone.html", "gone.pdf"]));
    assert!(!exists(&t.public, "gone.html"));
    assert!(!exists(&t.public, "gone.pdf"));
}

#[tokio::test]
async fn test_delete_traversal_is_rejected() {
    let t = TestApp::new();
    std::fs::create_dir_all(&t.public).unwrap();
    let outside = t.public.parent().unwrap().join("secret.html");
    std::fs::write(&outside, b"keep").unwrap();

    let (status, json) = send(t.app(), delete("/delete-files/..%2Fsecret")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "body: {json}");
    assert_eq!(json["success"], false);
    assert!(outside.exists());

    let (status, _) = send(t.app(), delete("/delete-files/a..b")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_missing_is_404() {
    let t = TestApp::new();
    let (status, json) = send(t.app(), delete("/delete-files/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

// ── Static routes ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_index_and_public_files_are_served() {
    let t = TestApp::new();
    let res = t.app().oneshot(get("/")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("markdown-file"));

    send(t.app(), convert_request(&[md_file("served.md", b"# hi")])).await;
    let res = t.app().oneshot(get("/public/served.pdf")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(body.starts_with(b"%PDF"));
}
