//! JSON bodies and error mapping for the HTTP API.
//!
//! Every response carries `success`. Failures are `{success:false, error}`
//! with the status taken from [`ErrorKind`]: 400 for bad input, 404 for
//! missing artifacts, 500 for everything else.

use crate::artifacts::ArtifactEntry;
use crate::error::{ErrorKind, Md2PdfError};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    /// Display name of the source document.
    pub filename: String,
    /// Public URL of the HTML preview.
    pub html: String,
    /// Public URL of the PDF.
    pub pdf: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse<T: Serialize> {
    pub success: bool,
    pub files: Vec<T>,
}

pub type NameList = FileListResponse<String>;
pub type DetailedList = FileListResponse<ArtifactEntry>;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// An [`Md2PdfError`] on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub Md2PdfError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Io | ErrorKind::Render | ErrorKind::Config | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<Md2PdfError> for ApiError {
    fn from(e: Md2PdfError) -> Self {
        ApiError(e)
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError(Md2PdfError::InvalidInput(format!("Malformed upload: {}", e.body_text())))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{} → {}", status, self.0);
        } else {
            warn!("{} → {}", status, self.0);
        }
        let body = ErrorBody {
            success: false,
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
