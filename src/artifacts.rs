//! Operations on the flat artifact directory.
//!
//! The directory holds `<base>.html` / `<base>.pdf` pairs and nothing is
//! tracked beyond the filesystem itself: names, sizes and mtimes are read
//! straight from directory entries.

use crate::error::Md2PdfError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

const EXTENSIONS: [&str; 2] = ["html", "pdf"];

/// One artifact with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub name: String,
    /// `html` or `pdf`, lower-cased.
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Outcome of [`delete_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    /// File names actually removed.
    pub deleted: Vec<String>,
}

impl DeletionReport {
    /// Only one half of the pair existed.
    pub fn is_partial(&self) -> bool {
        self.deleted.len() < EXTENSIONS.len()
    }

    pub fn message(&self) -> String {
        format!("Deleted files: {}", self.deleted.join(", "))
    }
}

fn artifact_kind(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reject base names that could address anything outside the directory.
pub fn validate_base_name(name: &str) -> Result<(), Md2PdfError> {
    let bad = name.trim().is_empty()
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if bad {
        Err(Md2PdfError::InvalidBaseName {
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Names of all `.html`/`.pdf` files in `dir`, sorted by name.
///
/// A directory that does not exist yet simply has no artifacts.
pub async fn list_artifacts(dir: &Path) -> Result<Vec<String>, Md2PdfError> {
    let mut names: Vec<String> = list_artifacts_detailed(dir)
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort();
    Ok(names)
}

/// All artifacts in `dir` with size and mtime, newest first.
pub async fn list_artifacts_detailed(dir: &Path) -> Result<Vec<ArtifactEntry>, Md2PdfError> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Artifact directory {} does not exist yet", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(Md2PdfError::read_failed(dir, e)),
    };

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|e| Md2PdfError::read_failed(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(kind) = artifact_kind(&name) else {
            continue;
        };
        let meta = match entry.metadata().await {
            Ok(m) if m.is_file() => m,
            Ok(_) => continue,
            // Removed between listing and stat.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(Md2PdfError::read_failed(entry.path(), e)),
        };
        let last_modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();
        entries.push(ArtifactEntry {
            name,
            kind,
            size: meta.len(),
            last_modified,
        });
    }

    entries.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(entries)
}

/// Delete `<base>.html` and `<base>.pdf` from `dir`.
///
/// The name is validated before the filesystem is touched. Missing halves
/// are skipped; if neither existed the result is [`Md2PdfError::NotFound`].
/// Any removal failure is reported as [`Md2PdfError::DeleteFailed`].
pub async fn delete_artifacts(dir: &Path, base_name: &str) -> Result<DeletionReport, Md2PdfError> {
    validate_base_name(base_name)?;

    let mut deleted = Vec::new();
    let mut failures = Vec::new();
    for ext in EXTENSIONS {
        let name = format!("{base_name}.{ext}");
        match tokio::fs::remove_file(dir.join(&name)).await {
            Ok(()) => deleted.push(name),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => failures.push(format!("{name}: {e}")),
        }
    }

    if !failures.is_empty() {
        return Err(Md2PdfError::DeleteFailed(format!(
            "Failed to delete {}",
            failures.join("; ")
        )));
    }
    if deleted.is_empty() {
        return Err(Md2PdfError::NotFound {
            what: format!("Artifacts for '{base_name}'"),
        });
    }

    info!("Deleted {}", deleted.join(", "));
    Ok(DeletionReport { deleted })
}
