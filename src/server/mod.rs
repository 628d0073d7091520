//! HTTP service (feature `server`).
//!
//! | Route | |
//! |-------|--|
//! | `GET /` | bundled index page |
//! | `POST /convert` | multipart upload (`markdown-file`) or pasted text (`markdown`) + option fields |
//! | `GET /example` | convert the example document (`colorBlindFriendly`, `codeTheme`) |
//! | `GET /list-files` | artifact names |
//! | `GET /public-files` | artifacts with type, size, lastModified (newest first) |
//! | `DELETE /delete-files/:basename` | remove `<basename>.html` and `.pdf` |
//! | `/public/*` | artifact directory |
//! | `/assets/*` | preview stylesheets |

pub mod handlers;
pub mod response;

use crate::config::AppConfig;
use crate::convert::Converter;
use crate::error::Md2PdfError;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub converter: Arc<Converter>,
}

impl AppState {
    /// State printing through headless Chromium.
    pub fn new(config: AppConfig) -> Self {
        let converter = Converter::from_config(&config);
        Self::with_converter(config, converter)
    }

    pub fn with_converter(config: AppConfig, converter: Converter) -> Self {
        Self {
            config: Arc::new(config),
            converter: Arc::new(converter),
        }
    }

    fn upload_dir(&self) -> PathBuf {
        self.config
            .upload_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    // Room for the option fields next to a maximum-size upload.
    let body_limit = state.config.max_upload_bytes.saturating_mul(2);
    let public = ServeDir::new(&state.config.public_dir);
    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route("/", get(handlers::index))
        .route("/convert", post(handlers::convert))
        .route("/example", get(handlers::example))
        .route("/list-files", get(handlers::list_files))
        .route("/public-files", get(handlers::public_files))
        .route("/delete-files/:basename", delete(handlers::delete_files))
        .nest_service("/public", public)
        .nest_service("/assets", assets)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), Md2PdfError> {
    tokio::fs::create_dir_all(&state.config.public_dir)
        .await
        .map_err(|e| Md2PdfError::write_failed(&state.config.public_dir, e))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Md2PdfError::InvalidConfig(format!("cannot bind {addr}: {e}")))?;
    info!(
        "Serving on http://{} (artifacts in {})",
        addr,
        state.config.public_dir.display()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Md2PdfError::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
