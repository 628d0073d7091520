//! Request handlers.

use super::response::{ApiError, ConvertResponse, DeleteResponse, DetailedList, NameList};
use super::AppState;
use crate::artifacts::{self, validate_base_name};
use crate::config::{parse_flag, ConversionOptions};
use crate::convert::read_markdown;
use crate::error::Md2PdfError;
use crate::pipeline::markdown::CodeTheme;
use crate::preview::{artifact_url, base_name_of, rewrap_artifact, PreviewOptions};
use axum::extract::{Multipart, Path, Query, State};
use axum::response::Html;
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path as FsPath;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Multipart field carrying an uploaded file.
pub const FILE_FIELD: &str = "markdown-file";
/// Multipart field carrying pasted Markdown text.
pub const TEXT_FIELD: &str = "markdown";
/// Optional display name for pasted text.
pub const NAME_FIELD: &str = "filename";

const BUNDLED_INDEX: &str = include_str!("../../assets/index.html");
const BUNDLED_EXAMPLE: &str = include_str!("../../assets/example.md");
const EXAMPLE_NAME: &str = "example.md";
const PASTED_NAME: &str = "document.md";

pub async fn index() -> Html<&'static str> {
    Html(BUNDLED_INDEX)
}

/// An uploaded file staged on disk; removed when dropped, whatever happens
/// to the conversion.
struct StagedUpload {
    file_name: String,
    file: NamedTempFile,
}

/// `POST /convert`
pub async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut upload: Option<StagedUpload> = None;
    let mut pasted: Option<String> = None;
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field
                    .file_name()
                    .map(|n| base_file_name(n))
                    .unwrap_or_default();
                if file_name.is_empty() {
                    continue;
                }
                if !is_markdown_upload(&file_name, field.content_type()) {
                    return Err(Md2PdfError::UnsupportedFileType {
                        filename: file_name,
                    }
                    .into());
                }
                let file = stage_upload(&state, &mut field).await?;
                debug!("Staged upload '{}' at {}", file_name, file.path().display());
                upload = Some(StagedUpload { file_name, file });
            }
            TEXT_FIELD => pasted = Some(field.text().await?),
            _ => {
                let value = field.text().await?;
                fields.insert(name, value);
            }
        }
    }

    let (display_name, markdown) = match (&upload, pasted) {
        (Some(staged), _) => (staged.file_name.clone(), read_upload(staged).await?),
        (None, Some(text)) => {
            let name = fields
                .get(NAME_FIELD)
                .map(|n| base_file_name(n))
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| PASTED_NAME.to_string());
            (name, text)
        }
        (None, None) => {
            return Err(Md2PdfError::InvalidInput("No Markdown file was uploaded".into()).into())
        }
    };

    let options = ConversionOptions::from_fields(&fields);
    let response = convert_and_preview(&state, &display_name, &markdown, &options).await;
    // `upload` (and its temp file) is dropped here on both paths.
    drop(upload);
    response.map(Json)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleQuery {
    pub color_blind_friendly: Option<String>,
    pub code_theme: Option<String>,
}

/// `GET /example`
pub async fn example(
    State(state): State<AppState>,
    Query(query): Query<ExampleQuery>,
) -> Result<Json<ConvertResponse>, ApiError> {
    let markdown = match &state.config.example_path {
        Some(path) => read_markdown(path).await?,
        None => BUNDLED_EXAMPLE.to_string(),
    };
    let options = ConversionOptions {
        code_theme: query.code_theme.filter(|t| !t.trim().is_empty()),
        color_blind_friendly: query
            .color_blind_friendly
            .as_deref()
            .map(parse_flag)
            .unwrap_or(false),
        ..Default::default()
    };
    convert_and_preview(&state, EXAMPLE_NAME, &markdown, &options)
        .await
        .map(Json)
}

/// `GET /list-files`
pub async fn list_files(State(state): State<AppState>) -> Result<Json<NameList>, ApiError> {
    let files = artifacts::list_artifacts(&state.config.public_dir).await?;
    Ok(Json(NameList {
        success: true,
        files,
    }))
}

/// `GET /public-files`
pub async fn public_files(State(state): State<AppState>) -> Result<Json<DetailedList>, ApiError> {
    let files = artifacts::list_artifacts_detailed(&state.config.public_dir).await?;
    Ok(Json(DetailedList {
        success: true,
        files,
    }))
}

/// `DELETE /delete-files/:basename`
pub async fn delete_files(
    State(state): State<AppState>,
    Path(base_name): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let report = artifacts::delete_artifacts(&state.config.public_dir, &base_name).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: report.message(),
        deleted: report.deleted,
    }))
}

// ── Helpers ──────────────────────────────────────────────────────────────

async fn convert_and_preview(
    state: &AppState,
    display_name: &str,
    markdown: &str,
    options: &ConversionOptions,
) -> Result<ConvertResponse, ApiError> {
    let base = base_name_of(display_name);
    validate_base_name(&base)?;

    let output_base = state.config.public_dir.join(&base);
    let custom_styles = state.config.custom_styles();
    let output = state
        .converter
        .convert(markdown, &output_base, Some(&custom_styles), options)
        .await?;

    let preview = PreviewOptions {
        color_blind_friendly: options.color_blind_friendly,
        code_theme: CodeTheme::from_name(options.code_theme.as_deref().unwrap_or_default()),
    };
    rewrap_artifact(&output.html_path, display_name, &preview).await?;

    Ok(ConvertResponse {
        success: true,
        filename: display_name.to_string(),
        html: artifact_url(&base, "html"),
        pdf: artifact_url(&base, "pdf"),
    })
}

/// Last path component of a client-supplied file name (`C:\a\b.md` → `b.md`).
fn base_file_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or_default().trim().to_string()
}

fn is_markdown_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let lower = file_name.to_ascii_lowercase();
    let by_extension = lower.ends_with(".md") || lower.ends_with(".markdown");
    let by_type = content_type
        .map(|t| {
            let t = t.to_ascii_lowercase();
            t.starts_with("text/markdown") || t.starts_with("text/x-markdown")
        })
        .unwrap_or(false);
    by_extension || by_type
}

/// Stream one file field into a temp file, enforcing the upload limit.
async fn stage_upload(
    state: &AppState,
    field: &mut axum::extract::multipart::Field<'_>,
) -> Result<NamedTempFile, ApiError> {
    let dir = state.upload_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| Md2PdfError::write_failed(&dir, e))?;
    let staged = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".md")
        .tempfile_in(&dir)
        .map_err(|e| Md2PdfError::write_failed(&dir, e))?;
    let std_file = staged
        .reopen()
        .map_err(|e| Md2PdfError::write_failed(staged.path(), e))?;
    let mut out = tokio::fs::File::from_std(std_file);

    let limit = state.config.max_upload_bytes;
    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len();
        if written > limit {
            return Err(Md2PdfError::InvalidInput(format!(
                "Upload exceeds the {limit} byte limit"
            ))
            .into());
        }
        out.write_all(&chunk)
            .await
            .map_err(|e| Md2PdfError::write_failed(staged.path(), e))?;
    }
    out.flush()
        .await
        .map_err(|e| Md2PdfError::write_failed(staged.path(), e))?;
    Ok(staged)
}

async fn read_upload(staged: &StagedUpload) -> Result<String, ApiError> {
    let path: &FsPath = staged.file.path();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Md2PdfError::read_failed(path, e))?;
    String::from_utf8(bytes).map_err(|_| {
        Md2PdfError::InvalidInput(format!("'{}' is not valid UTF-8 text", staged.file_name)).into()
    })
}
