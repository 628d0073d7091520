//! # edgequake-md2pdf
//!
//! Convert Markdown documents to a styled HTML preview and a PDF, printed by
//! headless Chromium.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Validate  reject empty input and malformed options before any write
//!  ├─ 2. Render    pulldown-cmark + syntect highlighting + bare-URL links
//!  ├─ 3. Compose   base CSS → font size → custom styles → user CSS
//!  ├─ 4. Persist   <base>.html (atomic write)
//!  ├─ 5. Print     headless Chromium, one browser per conversion (spawn_blocking)
//!  └─ 6. Persist   <base>.pdf (atomic write)
//! ```
//!
//! The web service additionally re-wraps the `.html` in a preview shell
//! linking both artifacts, and exposes list/delete operations on the
//! artifact directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_md2pdf::{AppConfig, ConversionOptions, Converter};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let converter = Converter::from_config(&config);
//!     let out = converter
//!         .convert("# Hello", Path::new("out/hello"), None, &ConversionOptions::default())
//!         .await?;
//!     println!("{} / {}", out.html_path.display(), out.pdf_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP service (`server` module) |
//! | `cli`    | on      | the `md2pdf` binary (clap + anyhow + tracing-subscriber); implies `server` |
//!
//! Library-only use:
//! ```toml
//! edgequake-md2pdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Browser
//!
//! Chromium is located by the `chrome-locate` crate: an explicit path, then
//! `MD2PDF_BROWSER_PATH` / `PUPPETEER_EXECUTABLE_PATH` / `CHROME_PATH`, then
//! well-known install locations, then `PATH`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifacts;
pub mod config;
pub mod convert;
pub mod error;
pub mod page;
pub mod pipeline;
pub mod preview;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifacts::{
    delete_artifacts, list_artifacts, list_artifacts_detailed, validate_base_name, ArtifactEntry,
    DeletionReport,
};
pub use config::{AppConfig, AppConfigBuilder, ConversionDefaults, ConversionOptions, ResolvedOptions};
pub use convert::{
    artifact_paths, color_blind_variant, convert_sync, ConversionOutput, ConversionStats, Converter,
};
pub use error::{ErrorKind, Md2PdfError};
pub use page::{CssLength, FontSize, Margins, Orientation, PageFormat, PageSetup};
pub use pipeline::markdown::{render_markdown, CodeTheme, MarkdownRenderer};
pub use pipeline::pdf::{ChromeRenderer, PdfRenderer};
pub use preview::{build_preview, rewrap_artifact, PreviewOptions};
