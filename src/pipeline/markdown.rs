//! Markdown → HTML fragment.
//!
//! Wraps `pulldown-cmark` with a fixed dialect and runs the event stream
//! through two rewrites before serialising:
//!
//! * fenced code blocks with a recognised language tag are highlighted by
//!   `syntect` (inline styles, so the PDF needs no extra stylesheet);
//!   unknown or missing tags fall back to escaped plain text;
//! * bare `http(s)://` and `www.` URLs in running text become links.
//!
//! Raw HTML passes through untouched, soft line breaks become `<br />`,
//! and quotes/dashes get typographic substitution. The output depends only
//! on the input text and the chosen [`CodeTheme`].

use once_cell::sync::Lazy;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::debug;

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

static RE_BARE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:https?://|www\.)[^\s<>"'`]+"#).expect("valid URL regex")
});

// ── Code themes ──────────────────────────────────────────────────────────

/// Palette used for highlighted code blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeTheme {
    #[default]
    Github,
    Monokai,
    SolarizedDark,
    SolarizedLight,
    Ocean,
    Eighties,
    Mocha,
}

impl CodeTheme {
    /// Map a user-facing theme name onto a palette. Unknown names get the
    /// default light palette rather than an error: the theme is cosmetic.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "monokai" | "dark" => CodeTheme::Monokai,
            "ocean" => CodeTheme::Ocean,
            "solarized-dark" => CodeTheme::SolarizedDark,
            "solarized-light" => CodeTheme::SolarizedLight,
            "eighties" => CodeTheme::Eighties,
            "mocha" => CodeTheme::Mocha,
            _ => CodeTheme::Github,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CodeTheme::Github => "github",
            CodeTheme::Monokai => "monokai",
            CodeTheme::SolarizedDark => "solarized-dark",
            CodeTheme::SolarizedLight => "solarized-light",
            CodeTheme::Ocean => "ocean",
            CodeTheme::Eighties => "eighties",
            CodeTheme::Mocha => "mocha",
        }
    }

    fn syntect_name(self) -> &'static str {
        match self {
            CodeTheme::Github => "InspiredGitHub",
            // no Monokai ships with syntect's defaults; mocha is the nearest
            CodeTheme::Monokai => "base16-mocha.dark",
            CodeTheme::SolarizedDark => "Solarized (dark)",
            CodeTheme::SolarizedLight => "Solarized (light)",
            CodeTheme::Ocean => "base16-ocean.dark",
            CodeTheme::Eighties => "base16-eighties.dark",
            CodeTheme::Mocha => "base16-mocha.dark",
        }
    }

    fn theme(self) -> Option<&'static Theme> {
        THEMES.themes.get(self.syntect_name())
    }
}

// ── Renderer ─────────────────────────────────────────────────────────────

/// Converts Markdown text to an HTML fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    theme: CodeTheme,
}

impl MarkdownRenderer {
    pub fn new(theme: CodeTheme) -> Self {
        Self { theme }
    }

    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
    }

    /// Render `markdown` to HTML. Never fails; malformed Markdown is
    /// rendered the way CommonMark says it should be.
    pub fn render(&self, markdown: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(markdown, Self::options()));

        let mut events: Vec<Event<'_>> = Vec::new();
        let mut code: Option<(String, String)> = None; // (language, body)
        let mut link_depth = 0usize;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => language_token(&info).to_string(),
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((lang, String::new()));
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, body)) = code.take() {
                        events.push(Event::Html(CowStr::from(self.code_block(&lang, &body))));
                    }
                }
                Event::Text(text) if code.is_some() => {
                    if let Some((_, body)) = code.as_mut() {
                        body.push_str(&text);
                    }
                }
                Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                    link_depth += 1;
                    events.push(Event::Start(tag));
                }
                Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(Event::End(end));
                }
                Event::InlineHtml(raw) => {
                    match anchor_tag(&raw) {
                        Some(AnchorTag::Open) => link_depth += 1,
                        Some(AnchorTag::Close) => link_depth = link_depth.saturating_sub(1),
                        None => {}
                    }
                    events.push(Event::InlineHtml(raw));
                }
                Event::Text(text) if link_depth == 0 && RE_BARE_URL.is_match(&text) => {
                    events.extend(linkify(&text));
                }
                Event::SoftBreak => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        let mut out = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn code_block(&self, lang: &str, body: &str) -> String {
        let syntax = (!lang.is_empty())
            .then(|| SYNTAXES.find_syntax_by_token(lang))
            .flatten();

        if let (Some(syntax), Some(theme)) = (syntax, self.theme.theme()) {
            let mut highlighter = HighlightLines::new(syntax, theme);
            let mut html = format!(
                "<pre class=\"hljs\"><code class=\"language-{}\">",
                escape_html(lang)
            );
            let mut ok = true;
            for line in LinesWithEndings::from(body) {
                let styled = highlighter
                    .highlight_line(line, &SYNTAXES)
                    .and_then(|regions| {
                        styled_line_to_highlighted_html(&regions[..], IncludeBackground::No)
                    });
                match styled {
                    Ok(s) => html.push_str(&s),
                    Err(e) => {
                        debug!("highlighting {lang} failed, using plain text: {e}");
                        ok = false;
                        break;
                    }
                }
            }
            if ok {
                html.push_str("</code></pre>\n");
                return html;
            }
        }

        format!(
            "<pre class=\"hljs\"><code>{}</code></pre>\n",
            escape_html(body)
        )
    }
}

/// Render with a given theme; shorthand for `MarkdownRenderer::new(theme).render(..)`.
pub fn render_markdown(markdown: &str, theme: CodeTheme) -> String {
    MarkdownRenderer::new(theme).render(markdown)
}

/// First word of a fence info string: ` ```rust,ignore ` → `rust`.
fn language_token(info: &str) -> &str {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .unwrap_or("")
}

enum AnchorTag {
    Open,
    Close,
}

/// Classify a raw inline tag as `<a ...>` or `</a>`.
fn anchor_tag(raw: &str) -> Option<AnchorTag> {
    let tag = raw.trim_start();
    let (close, rest) = match tag.strip_prefix("</") {
        Some(rest) => (true, rest),
        None => (false, tag.strip_prefix('<')?),
    };
    let mut chars = rest.chars();
    if !matches!(chars.next(), Some('a' | 'A')) {
        return None;
    }
    match chars.next() {
        Some(c) if c == '>' || c == '/' || c.is_whitespace() => {}
        _ => return None,
    }
    if close {
        Some(AnchorTag::Close)
    } else if rest.trim_end().ends_with("/>") {
        None
    } else {
        Some(AnchorTag::Open)
    }
}

/// Drop trailing punctuation from a URL match. A closing bracket is only
/// dropped when the URL has no opening bracket left to pair it with.
fn trim_url(candidate: &str) -> &str {
    let mut url = candidate;
    while let Some(last) = url.chars().last() {
        let strip = match last {
            '.' | ',' | ';' | ':' | '!' | '?' => true,
            ')' => url.matches('(').count() < url.matches(')').count(),
            ']' => url.matches('[').count() < url.matches(']').count(),
            _ => false,
        };
        if !strip {
            break;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
    url
}

fn linkify(text: &str) -> Vec<Event<'static>> {
    let mut out = Vec::new();
    let mut last = 0;
    for m in RE_BARE_URL.find_iter(text) {
        let url = trim_url(m.as_str());
        if url.is_empty() {
            continue;
        }
        let start = m.start();
        let end = start + url.len();
        if start > last {
            out.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        let href = if url.starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::InlineHtml(CowStr::from(format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&href),
            escape_html(url)
        ))));
        last = end;
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
    out
}

/// Escape text for use in HTML content and double-quoted attributes.
pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
