//! Preview shell for browsing a converted document.
//!
//! After the PDF has been printed, the `.html` artifact is re-wrapped with a
//! small navigation bar linking to both artifacts. The document's own inline
//! styles are kept, so the preview looks like the PDF; the shared preview
//! stylesheet under `/assets/css/` is linked on top.

use crate::convert::write_atomic;
use crate::error::Md2PdfError;
use crate::pipeline::document::CONTAINER_CLASS;
use crate::pipeline::markdown::{escape_html, CodeTheme};
use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::path::Path;

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("valid style regex"));
static RE_BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").expect("valid body regex"));

const PREVIEW_CSS: &str = r#"
.preview-nav {
  display: flex;
  gap: 1em;
  align-items: center;
  margin-bottom: 24px;
  padding: 10px 16px;
  border: 1px solid #d1d9e0;
  border-radius: 6px;
  background: #f6f8fa;
  font-size: 14px;
}
.preview-nav .preview-title { flex: 1; font-weight: 600; }
.preview-nav a { color: #0969da; text-decoration: none; }
@media print { .preview-nav { display: none; } }
"#;

/// Cosmetic preview settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Link the colour-blind-friendly stylesheet instead of the default one.
    pub color_blind_friendly: bool,
    pub code_theme: CodeTheme,
}

/// Base name the artifacts of `display_name` live under: `notes.md` → `notes`.
pub fn base_name_of(display_name: &str) -> String {
    let file = Path::new(display_name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| display_name.to_string());
    match Path::new(&file).file_stem() {
        Some(stem) if !stem.is_empty() => stem.to_string_lossy().into_owned(),
        _ => file,
    }
}

/// Public URL of an artifact, with the base name percent-encoded.
pub fn artifact_url(base_name: &str, extension: &str) -> String {
    format!(
        "/public/{}.{}",
        utf8_percent_encode(base_name, COMPONENT),
        extension
    )
}

/// Wrap `content` (a fragment or a complete document) in the preview shell.
///
/// For a complete document the `<style>` blocks and the `<body>` contents
/// are lifted out; anything else is treated as a fragment and wrapped in
/// the Markdown container.
pub fn build_preview(display_name: &str, content: &str, options: &PreviewOptions) -> String {
    let base = base_name_of(display_name);
    let pdf_url = artifact_url(&base, "pdf");
    let html_url = artifact_url(&base, "html");
    let title = escape_html(display_name);

    let (styles, body) = match RE_BODY.captures(content) {
        Some(caps) => {
            // Only the head; `<style>` inside the body travels with the body.
            let head_end = caps.get(0).map(|m| m.start()).unwrap_or_default();
            let styles: String = RE_STYLE
                .find_iter(&content[..head_end])
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            (styles, inner.to_string())
        }
        None => (
            String::new(),
            format!("<article class=\"{CONTAINER_CLASS}\">\n{content}\n</article>"),
        ),
    };

    let stylesheet = if options.color_blind_friendly {
        "/assets/css/custom-styles-cb.css"
    } else {
        "/assets/css/custom-styles.css"
    };
    let body_class = if options.color_blind_friendly {
        " class=\"color-blind-mode\""
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Preview: {title}</title>
{styles}
<link rel="stylesheet" href="{stylesheet}">
<style>{PREVIEW_CSS}</style>
</head>
<body{body_class} data-code-theme="{theme}">
<nav class="preview-nav">
<span class="preview-title">{title}</span>
<a href="{pdf_url}" target="_blank" rel="noopener">Download PDF</a>
<a href="{html_url}" target="_blank" rel="noopener">Open HTML</a>
</nav>
{body}
</body>
</html>
"#,
        theme = options.code_theme.as_str(),
    )
}

/// Replace the `.html` artifact at `html_path` with its preview.
pub async fn rewrap_artifact(
    html_path: &Path,
    display_name: &str,
    options: &PreviewOptions,
) -> Result<(), Md2PdfError> {
    let document = tokio::fs::read_to_string(html_path)
        .await
        .map_err(|e| Md2PdfError::read_failed(html_path, e))?;
    let preview = build_preview(display_name, &document, options);
    write_atomic(html_path, preview.as_bytes()).await
}
