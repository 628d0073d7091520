//! Error types for the edgequake-md2pdf library.
//!
//! Every failure surfaces as one [`Md2PdfError`]. Variants are grouped into
//! four caller-facing categories via [`Md2PdfError::kind`]:
//!
//! * [`ErrorKind::InvalidInput`]: the request itself is wrong (empty
//!   Markdown, disallowed file type, unsafe base name, malformed option).
//!   Always detected *before* any file is written.
//! * [`ErrorKind::Io`]: a filesystem read or write failed.
//! * [`ErrorKind::Render`]: the headless browser could not be launched or
//!   could not print the page.
//! * [`ErrorKind::NotFound`]: the requested artifact or source is absent.
//!
//! The HTTP layer maps these to 400 / 500 / 500 / 404. Nothing is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Caller-facing classification of an [`Md2PdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Io,
    Render,
    NotFound,
    Config,
    Internal,
}

/// All errors returned by the edgequake-md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The Markdown source is empty or whitespace only.
    #[error("Markdown content is required and must not be empty")]
    EmptyMarkdown,

    /// The uploaded file is not Markdown.
    #[error("Only Markdown (.md) files are allowed, got '{filename}'")]
    UnsupportedFileType { filename: String },

    /// A base name would escape the artifact directory or is otherwise unusable.
    #[error("Invalid file name '{name}'")]
    InvalidBaseName { name: String },

    /// A conversion option could not be parsed.
    #[error("Invalid value for '{field}': '{value}' ({hint})")]
    InvalidOption {
        field: &'static str,
        value: String,
        hint: &'static str,
    },

    /// The request is malformed in some other way (missing upload, bad multipart body).
    #[error("{0}")]
    InvalidInput(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read a source or stylesheet file.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create a directory or write an artifact.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not remove one or more artifacts.
    #[error("{0}")]
    DeleteFailed(String),

    // ── Render errors ─────────────────────────────────────────────────────
    /// The headless browser could not be started.
    #[error("Failed to launch headless browser: {0}")]
    BrowserLaunch(String),

    /// The browser started but loading or printing the document failed.
    #[error("PDF rendering failed: {0}")]
    RenderFailed(String),

    // ── Lookup errors ─────────────────────────────────────────────────────
    /// A requested artifact or source document does not exist.
    #[error("{what} not found")]
    NotFound { what: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or environment validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// Classify this error for callers that only care about the category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Md2PdfError::EmptyMarkdown
            | Md2PdfError::UnsupportedFileType { .. }
            | Md2PdfError::InvalidBaseName { .. }
            | Md2PdfError::InvalidOption { .. }
            | Md2PdfError::InvalidInput(_) => ErrorKind::InvalidInput,
            Md2PdfError::ReadFailed { .. }
            | Md2PdfError::WriteFailed { .. }
            | Md2PdfError::DeleteFailed(_) => ErrorKind::Io,
            Md2PdfError::BrowserLaunch(_) | Md2PdfError::RenderFailed(_) => ErrorKind::Render,
            Md2PdfError::NotFound { .. } => ErrorKind::NotFound,
            Md2PdfError::InvalidConfig(_) => ErrorKind::Config,
            Md2PdfError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Md2PdfError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Md2PdfError::ReadFailed {
            path: path.into(),
            source,
        }
    }
}
