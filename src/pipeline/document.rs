//! Styled-document composition.
//!
//! The generated `.html` is self-contained: every stylesheet is inlined in a
//! single `<style>` block so the PDF step needs no network access. Sources
//! are concatenated in cascade order, later ones winning:
//!
//! ```text
//! BASE_CSS ─▶ font-size rule ─▶ colour-blind file ─▶ custom-styles file ─▶ user customCSS
//! ```
//!
//! The colour-blind stylesheet targets `body.color-blind-mode`; the class is
//! set on `<body>` whenever the colour-blind variant is requested.

use crate::page::FontSize;
use crate::pipeline::markdown::escape_html;

/// Class of the element wrapping the rendered Markdown.
pub const CONTAINER_CLASS: &str = "markdown-body";
/// `<body>` class enabling the colour-blind-friendly rules.
pub const COLOR_BLIND_CLASS: &str = "color-blind-mode";

/// Fixed stylesheet: typography, tables, blockquotes, code and a responsive
/// max-width column.
pub const BASE_CSS: &str = r#"
*, *::before, *::after { box-sizing: border-box; }
html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }
body {
  margin: 0 auto;
  padding: 45px;
  min-width: 200px;
  max-width: 980px;
  color: #1f2328;
  background: #ffffff;
  font-family: -apple-system, "Segoe UI", "Noto Sans", Helvetica, Arial, sans-serif;
}
.markdown-body { line-height: 1.6; word-wrap: break-word; }
.markdown-body > *:first-child { margin-top: 0 !important; }
.markdown-body h1, .markdown-body h2, .markdown-body h3,
.markdown-body h4, .markdown-body h5, .markdown-body h6 {
  margin-top: 24px;
  margin-bottom: 16px;
  font-weight: 600;
  line-height: 1.25;
  page-break-after: avoid;
}
.markdown-body h1 { font-size: 2em; padding-bottom: .3em; border-bottom: 1px solid #d1d9e0; }
.markdown-body h2 { font-size: 1.5em; padding-bottom: .3em; border-bottom: 1px solid #d1d9e0; }
.markdown-body h3 { font-size: 1.25em; }
.markdown-body h4 { font-size: 1em; }
.markdown-body h5 { font-size: .875em; }
.markdown-body h6 { font-size: .85em; color: #59636e; }
.markdown-body p, .markdown-body ul, .markdown-body ol,
.markdown-body dl, .markdown-body table, .markdown-body pre,
.markdown-body blockquote { margin-top: 0; margin-bottom: 16px; }
.markdown-body ul, .markdown-body ol { padding-left: 2em; }
.markdown-body li + li { margin-top: .25em; }
.markdown-body a { color: #0969da; text-decoration: none; }
.markdown-body a:hover { text-decoration: underline; }
.markdown-body img { max-width: 100%; }
.markdown-body hr { height: .25em; margin: 24px 0; padding: 0; border: 0; background: #d1d9e0; }
.markdown-body blockquote {
  margin-left: 0;
  padding: 0 1em;
  color: #59636e;
  border-left: .25em solid #d1d9e0;
}
.markdown-body table {
  display: block;
  width: max-content;
  max-width: 100%;
  overflow: auto;
  border-spacing: 0;
  border-collapse: collapse;
  page-break-inside: avoid;
}
.markdown-body th { font-weight: 600; }
.markdown-body th, .markdown-body td { padding: 6px 13px; border: 1px solid #d1d9e0; }
.markdown-body tr:nth-child(2n) { background-color: #f6f8fa; }
.markdown-body code {
  padding: .2em .4em;
  font-size: 85%;
  background-color: rgba(129, 139, 152, .12);
  border-radius: 6px;
}
.markdown-body code, .markdown-body pre {
  font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, "Liberation Mono", monospace;
}
.markdown-body pre {
  padding: 16px;
  overflow: auto;
  font-size: 85%;
  line-height: 1.45;
  background-color: #f6f8fa;
  border-radius: 6px;
  page-break-inside: avoid;
}
.markdown-body pre code { padding: 0; font-size: 100%; background: transparent; white-space: pre-wrap; }
.markdown-body .footnote-definition { font-size: .85em; color: #59636e; }
.markdown-body .footnote-definition p { display: inline; }
.markdown-body input[type="checkbox"] { margin-right: .4em; }
@media (max-width: 767px) {
  body { padding: 15px; }
}
"#;

/// Inputs for [`compose_document`].
#[derive(Debug, Clone, Copy)]
pub struct DocumentParts<'a> {
    /// Document `<title>`; escaped before use.
    pub title: &'a str,
    /// Rendered Markdown fragment.
    pub body: &'a str,
    pub font_size: &'a FontSize,
    /// Mark `<body>` with [`COLOR_BLIND_CLASS`].
    pub color_blind: bool,
    /// Contents of the colour-blind stylesheet (may be empty).
    pub color_blind_styles: &'a str,
    /// Contents of the custom-styles file (may be empty).
    pub custom_styles: &'a str,
    /// Request-supplied CSS (may be empty).
    pub custom_css: &'a str,
}

/// Build the complete standalone HTML document.
pub fn compose_document(parts: &DocumentParts<'_>) -> String {
    let mut css = String::with_capacity(
        BASE_CSS.len()
            + parts.color_blind_styles.len()
            + parts.custom_styles.len()
            + parts.custom_css.len()
            + 64,
    );
    css.push_str(BASE_CSS);
    css.push_str(&format!(
        ".{CONTAINER_CLASS} {{ font-size: {}; }}\n",
        parts.font_size
    ));
    if parts.color_blind && !parts.color_blind_styles.trim().is_empty() {
        css.push_str("/* colour-blind styles */\n");
        css.push_str(parts.color_blind_styles);
        css.push('\n');
    }
    if !parts.custom_styles.trim().is_empty() {
        css.push_str("/* custom styles */\n");
        css.push_str(parts.custom_styles);
        css.push('\n');
    }
    if !parts.custom_css.trim().is_empty() {
        css.push_str("/* user css */\n");
        css.push_str(parts.custom_css);
        css.push('\n');
    }

    let body_class = if parts.color_blind {
        format!(" class=\"{COLOR_BLIND_CLASS}\"")
    } else {
        String::new()
    };

    format!(
        "<!DOCTYPE html>\n\
<html lang=\"en\">\n\
<head>\n\
<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>{title}</title>\n\
<style>\n{css}</style>\n\
</head>\n\
<body{body_class}>\n\
<article class=\"{CONTAINER_CLASS}\">\n{body}</article>\n\
</body>\n\
</html>\n",
        title = escape_html(parts.title),
        body = parts.body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compose(custom_styles: &str, custom_css: &str) -> String {
        compose_with(false, "", custom_styles, custom_css)
    }

    fn compose_with(
        color_blind: bool,
        color_blind_styles: &str,
        custom_styles: &str,
        custom_css: &str,
    ) -> String {
        let size = FontSize::parse("16px").unwrap();
        compose_document(&DocumentParts {
            title: "Notes <draft>",
            body: "<h1>Hello</h1>\n",
            font_size: &size,
            color_blind,
            color_blind_styles,
            custom_styles,
            custom_css,
        })
    }

    #[test]
    fn cascade_order_puts_user_css_last() {
        let doc = compose(".from-file { color: blue; }", "body{color:red}");
        let base = doc.find("print-color-adjust").unwrap();
        let font = doc.find("font-size: 16px; }").unwrap();
        let file = doc.find(".from-file").unwrap();
        let user = doc.find("body{color:red}").unwrap();
        assert!(base < font && font < file && file < user, "got: {doc}");
        assert!(user < doc.find("</style>").unwrap());
    }

    #[test]
    fn body_is_wrapped_and_title_escaped() {
        let doc = compose("", "");
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<article class=\"markdown-body\">\n<h1>Hello</h1>"));
        assert!(doc.contains("<title>Notes &lt;draft&gt;</title>"));
        assert!(!doc.contains("/* user css */"));
    }

    #[test]
    fn color_blind_styles_precede_custom_styles() {
        let doc = compose_with(true, "body.color-blind-mode a { color: #0072b2; }", ".from-file {}", "");
        assert!(doc.contains("<body class=\"color-blind-mode\">"), "got: {doc}");
        let cb = doc.find("#0072b2").unwrap();
        let file = doc.find(".from-file").unwrap();
        assert!(cb < file);
    }

    #[test]
    fn color_blind_styles_ignored_when_not_requested() {
        let doc = compose_with(false, "body.color-blind-mode a { color: #0072b2; }", "", "");
        assert!(doc.contains("<body>\n"));
        assert!(!doc.contains("#0072b2"));
    }
}
