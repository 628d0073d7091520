//! Conversion entry points: Markdown text → `<base>.html` + `<base>.pdf`.
//!
//! ## Step order
//!
//! Every check that can reject a request (empty input, bad option) runs
//! before the first filesystem write, so a rejected request leaves no
//! trace. After that the HTML is always written before the PDF is printed
//! from it, which keeps the pair derived from the same source.
//!
//! Both artifacts are written atomically (temp file in the target directory,
//! then rename): readers of the artifact directory see either the previous
//! file or the new one, never a prefix.

use crate::config::{AppConfig, ConversionDefaults, ConversionOptions};
use crate::error::Md2PdfError;
use crate::pipeline::document::{compose_document, DocumentParts};
use crate::pipeline::markdown::MarkdownRenderer;
use crate::pipeline::pdf::{render_blocking, ChromeRenderer, PdfRenderer};
use serde::Serialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Locations and timings of one finished conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub html_path: PathBuf,
    pub pdf_path: PathBuf,
    pub stats: ConversionStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub html_bytes: usize,
    pub pdf_bytes: usize,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// The conversion pipeline.
///
/// Holds the process-wide defaults and the PDF backend; cheap to share
/// behind an `Arc` across request handlers.
#[derive(Clone)]
pub struct Converter {
    defaults: ConversionDefaults,
    renderer: Arc<dyn PdfRenderer>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl Converter {
    pub fn new(defaults: ConversionDefaults, renderer: Arc<dyn PdfRenderer>) -> Self {
        Self { defaults, renderer }
    }

    /// A converter printing through headless Chromium as configured in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        let renderer = ChromeRenderer::new(
            config.browser_executable.clone(),
            Duration::from_secs(config.render_timeout_secs),
        );
        Self::new(config.defaults.clone(), Arc::new(renderer))
    }

    pub fn defaults(&self) -> &ConversionDefaults {
        &self.defaults
    }

    /// Convert `markdown` to `<output_base>.html` and `<output_base>.pdf`.
    ///
    /// `output_base` is a path without extension; its parent directory is
    /// created if needed. `custom_styles_path` is inlined after the base
    /// stylesheet when readable and silently skipped (with a warning)
    /// otherwise. With `colorBlindFriendly` set, its `-cb` sibling (see
    /// [`color_blind_variant`]) is inlined ahead of it and `<body>` gets the
    /// colour-blind class.
    ///
    /// # Errors
    /// * [`Md2PdfError::EmptyMarkdown`] / [`Md2PdfError::InvalidOption`]:
    ///   nothing was written.
    /// * [`Md2PdfError::WriteFailed`]: a directory or artifact could not be written.
    /// * [`Md2PdfError::BrowserLaunch`] / [`Md2PdfError::RenderFailed`]:
    ///   the `.html` exists but the `.pdf` was not replaced.
    pub async fn convert(
        &self,
        markdown: &str,
        output_base: &Path,
        custom_styles_path: Option<&Path>,
        options: &ConversionOptions,
    ) -> Result<ConversionOutput, Md2PdfError> {
        let total_start = Instant::now();

        // ── Step 1: Validate ─────────────────────────────────────────────
        if markdown.trim().is_empty() {
            return Err(Md2PdfError::EmptyMarkdown);
        }
        let resolved = options.resolve(&self.defaults)?;
        let (html_path, pdf_path) = artifact_paths(output_base);
        info!("Converting → {}", html_path.display());

        // ── Step 2: Ensure output directory ──────────────────────────────
        if let Some(parent) = output_base.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Md2PdfError::write_failed(parent, e))?;
        }

        // ── Step 3: Render Markdown and compose the document ─────────────
        let body = MarkdownRenderer::new(resolved.code_theme).render(markdown);
        let custom_styles = match custom_styles_path {
            Some(path) => read_custom_styles(path).await,
            None => String::new(),
        };
        let color_blind_styles = match custom_styles_path {
            Some(path) if resolved.color_blind_friendly => {
                read_custom_styles(&color_blind_variant(path)).await
            }
            _ => String::new(),
        };
        let title = output_base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let document = compose_document(&DocumentParts {
            title: &title,
            body: &body,
            font_size: &resolved.font_size,
            color_blind: resolved.color_blind_friendly,
            color_blind_styles: &color_blind_styles,
            custom_styles: &custom_styles,
            custom_css: &resolved.custom_css,
        });
        debug!(
            "Composed document: {} bytes ({} from Markdown)",
            document.len(),
            body.len()
        );

        // ── Step 4: Persist HTML ─────────────────────────────────────────
        write_atomic(&html_path, document.as_bytes()).await?;

        // ── Step 5: Print PDF ────────────────────────────────────────────
        let render_start = Instant::now();
        let pdf = render_blocking(Arc::clone(&self.renderer), &html_path, &resolved.page).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        write_atomic(&pdf_path, &pdf).await?;

        let stats = ConversionStats {
            html_bytes: document.len(),
            pdf_bytes: pdf.len(),
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Conversion complete: {} ({} bytes), render {}ms, total {}ms",
            pdf_path.display(),
            stats.pdf_bytes,
            stats.render_duration_ms,
            stats.total_duration_ms
        );

        Ok(ConversionOutput {
            html_path,
            pdf_path,
            stats,
        })
    }

    /// Read a Markdown file and convert it.
    ///
    /// A missing input is [`Md2PdfError::NotFound`]; other read failures are
    /// [`Md2PdfError::ReadFailed`].
    pub async fn convert_file(
        &self,
        input: &Path,
        output_base: &Path,
        custom_styles_path: Option<&Path>,
        options: &ConversionOptions,
    ) -> Result<ConversionOutput, Md2PdfError> {
        let markdown = read_markdown(input).await?;
        self.convert(&markdown, output_base, custom_styles_path, options)
            .await
    }
}

/// Synchronous wrapper around [`Converter::convert`].
///
/// Creates a temporary tokio runtime internally; do not call from async code.
pub fn convert_sync(
    converter: &Converter,
    markdown: &str,
    output_base: &Path,
    custom_styles_path: Option<&Path>,
    options: &ConversionOptions,
) -> Result<ConversionOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(converter.convert(markdown, output_base, custom_styles_path, options))
}

/// `(<base>.html, <base>.pdf)`. Appends rather than replacing an extension,
/// so a base like `v1.2-notes` keeps its dots.
pub fn artifact_paths(output_base: &Path) -> (PathBuf, PathBuf) {
    let with = |ext: &str| {
        let mut s: OsString = output_base.as_os_str().to_owned();
        s.push(ext);
        PathBuf::from(s)
    };
    (with(".html"), with(".pdf"))
}

/// Colour-blind counterpart of a stylesheet, next to it:
/// `css/custom-styles.css` → `css/custom-styles-cb.css`.
pub fn color_blind_variant(styles_path: &Path) -> PathBuf {
    let stem = styles_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match styles_path.extension() {
        Some(ext) => format!("{stem}-cb.{}", ext.to_string_lossy()),
        None => format!("{stem}-cb"),
    };
    styles_path.with_file_name(name)
}

/// Read a Markdown source file as UTF-8.
pub async fn read_markdown(path: &Path) -> Result<String, Md2PdfError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Md2PdfError::NotFound {
                what: format!("Markdown file '{}'", path.display()),
            }
        } else {
            Md2PdfError::read_failed(path, e)
        }
    })
}

async fn read_custom_styles(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(css) => css,
        Err(e) => {
            warn!(
                "Custom styles '{}' unavailable, continuing without: {}",
                path.display(),
                e
            );
            String::new()
        }
    }
}

/// Write `bytes` to `path` via a temp file in the same directory + rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    let target = path.to_path_buf();
    let bytes = bytes.to_vec();

    tokio::task::spawn_blocking(move || {
        let dir = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(".md2pdf-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| Md2PdfError::write_failed(&target, e))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.flush())
            .map_err(|e| Md2PdfError::write_failed(&target, e))?;
        tmp.persist(&target)
            .map_err(|e| Md2PdfError::write_failed(&target, e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| Md2PdfError::Internal(format!("Write task panicked: {}", e)))?
}
