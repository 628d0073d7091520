//! Configuration types for Markdown-to-PDF conversion.
//!
//! Three layers, from longest- to shortest-lived:
//!
//! * [`AppConfig`]: built once at process start (directories, browser,
//!   limits) via [`AppConfig::builder()`].
//! * [`ConversionDefaults`]: the process-wide fallback for every page
//!   option, read from `DEFAULT_*` environment variables or the literals
//!   A4 / portrait / 20mm / 16px.
//! * [`ConversionOptions`]: one request's overrides, every field optional.
//!   [`ConversionOptions::resolve`] merges them field by field over the
//!   defaults into a fully-typed [`ResolvedOptions`].
//!
//! Nothing here reads the environment ad hoc during a conversion: the
//! defaults object is constructed once and passed down.

use crate::error::Md2PdfError;
use crate::page::{CssLength, FontSize, Margins, Orientation, PageFormat, PageSetup};
use crate::pipeline::markdown::CodeTheme;
use std::collections::HashMap;
use std::path::PathBuf;

// ── Environment variable names ───────────────────────────────────────────

pub const ENV_PAGE_SIZE: &str = "DEFAULT_PAGE_SIZE";
pub const ENV_ORIENTATION: &str = "DEFAULT_ORIENTATION";
pub const ENV_MARGIN_TOP: &str = "DEFAULT_MARGIN_TOP";
pub const ENV_MARGIN_RIGHT: &str = "DEFAULT_MARGIN_RIGHT";
pub const ENV_MARGIN_BOTTOM: &str = "DEFAULT_MARGIN_BOTTOM";
pub const ENV_MARGIN_LEFT: &str = "DEFAULT_MARGIN_LEFT";
pub const ENV_FONT_SIZE: &str = "DEFAULT_FONT_SIZE";

const LITERAL_MARGIN_MM: f64 = 20.0;
const LITERAL_FONT_SIZE_PX: u32 = 16;

// ── Process-wide defaults ────────────────────────────────────────────────

/// Fallback value for every page option a request leaves unset.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionDefaults {
    pub page_size: PageFormat,
    pub orientation: Orientation,
    pub margins: Margins,
    pub font_size: FontSize,
}

impl Default for ConversionDefaults {
    fn default() -> Self {
        Self {
            page_size: PageFormat::A4,
            orientation: Orientation::Portrait,
            margins: Margins::uniform(CssLength::mm(LITERAL_MARGIN_MM)),
            font_size: FontSize::px(LITERAL_FONT_SIZE_PX),
        }
    }
}

impl ConversionDefaults {
    /// Read `DEFAULT_*` variables from the process environment.
    ///
    /// Unset or empty variables keep the literal default; a malformed value
    /// is a configuration error so a typo fails at startup instead of on
    /// the first request.
    pub fn from_env() -> Result<Self, Md2PdfError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a caller-supplied variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Md2PdfError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let margin = |key: &str, fallback: &CssLength| -> Result<CssLength, Md2PdfError> {
            match get(key) {
                Some(v) => CssLength::parse("margin", &v).map_err(|e| config_error(key, e)),
                None => Ok(fallback.clone()),
            }
        };

        Ok(Self {
            page_size: match get(ENV_PAGE_SIZE) {
                Some(v) => v.parse().map_err(|e| config_error(ENV_PAGE_SIZE, e))?,
                None => defaults.page_size,
            },
            orientation: match get(ENV_ORIENTATION) {
                Some(v) => v.parse().map_err(|e| config_error(ENV_ORIENTATION, e))?,
                None => defaults.orientation,
            },
            margins: Margins {
                top: margin(ENV_MARGIN_TOP, &defaults.margins.top)?,
                right: margin(ENV_MARGIN_RIGHT, &defaults.margins.right)?,
                bottom: margin(ENV_MARGIN_BOTTOM, &defaults.margins.bottom)?,
                left: margin(ENV_MARGIN_LEFT, &defaults.margins.left)?,
            },
            font_size: match get(ENV_FONT_SIZE) {
                Some(v) => FontSize::parse(&v).map_err(|e| config_error(ENV_FONT_SIZE, e))?,
                None => defaults.font_size,
            },
        })
    }
}

fn config_error(key: &str, err: Md2PdfError) -> Md2PdfError {
    Md2PdfError::InvalidConfig(format!("{key}: {err}"))
}

// ── Per-request options ──────────────────────────────────────────────────

/// One request's conversion options. Every field is optional; unset fields
/// take the matching [`ConversionDefaults`] value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    pub page_size: Option<String>,
    pub orientation: Option<String>,
    pub margin_top: Option<String>,
    pub margin_right: Option<String>,
    pub margin_bottom: Option<String>,
    pub margin_left: Option<String>,
    /// Raw CSS appended after every other stylesheet.
    pub custom_css: Option<String>,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub font_size: Option<String>,
    /// Syntax-highlighting palette name (`github`, `monokai`, …).
    pub code_theme: Option<String>,
    /// Link the colour-blind-friendly stylesheet from the preview page.
    pub color_blind_friendly: bool,
}

impl ConversionOptions {
    /// Build options from form fields using the web form's camelCase names
    /// (`pageSize`, `marginTop`, `customCSS`, …). Unknown keys are ignored
    /// and empty values count as unset.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            fields
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
        };
        Self {
            page_size: get("pageSize"),
            orientation: get("orientation"),
            margin_top: get("marginTop"),
            margin_right: get("marginRight"),
            margin_bottom: get("marginBottom"),
            margin_left: get("marginLeft"),
            custom_css: get("customCSS"),
            header_template: get("headerTemplate"),
            footer_template: get("footerTemplate"),
            font_size: get("fontSize"),
            code_theme: get("codeTheme"),
            color_blind_friendly: get("colorBlindFriendly")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Merge over `defaults`, validating every supplied value.
    ///
    /// Runs before any side effect of a conversion, so a bad option never
    /// leaves half-written artifacts behind.
    pub fn resolve(&self, defaults: &ConversionDefaults) -> Result<ResolvedOptions, Md2PdfError> {
        let margin = |field: &'static str, value: &Option<String>, fallback: &CssLength| {
            match non_blank(value) {
                Some(v) => CssLength::parse(field, v),
                None => Ok(fallback.clone()),
            }
        };

        let page = PageSetup {
            format: match non_blank(&self.page_size) {
                Some(v) => v.parse()?,
                None => defaults.page_size,
            },
            orientation: match non_blank(&self.orientation) {
                Some(v) => v.parse()?,
                None => defaults.orientation,
            },
            margins: Margins {
                top: margin("marginTop", &self.margin_top, &defaults.margins.top)?,
                right: margin("marginRight", &self.margin_right, &defaults.margins.right)?,
                bottom: margin("marginBottom", &self.margin_bottom, &defaults.margins.bottom)?,
                left: margin("marginLeft", &self.margin_left, &defaults.margins.left)?,
            },
            header_template: self.header_template.clone().unwrap_or_default(),
            footer_template: self.footer_template.clone().unwrap_or_default(),
        };

        let font_size = match non_blank(&self.font_size) {
            Some(v) => FontSize::parse(v)?,
            None => defaults.font_size.clone(),
        };

        Ok(ResolvedOptions {
            page,
            font_size,
            custom_css: self.custom_css.clone().unwrap_or_default(),
            code_theme: CodeTheme::from_name(self.code_theme.as_deref().unwrap_or_default()),
            color_blind_friendly: self.color_blind_friendly,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Interpret a form/query flag. Only `true`, `1`, `on` and `yes` are truthy.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

/// Fully-typed options for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub page: PageSetup,
    pub font_size: FontSize,
    pub custom_css: String,
    pub code_theme: CodeTheme,
    pub color_blind_friendly: bool,
}

// ── Application config ───────────────────────────────────────────────────

/// Process-wide configuration for the web service and CLI.
///
/// Built via [`AppConfig::builder()`] or [`AppConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_md2pdf::AppConfig;
///
/// let config = AppConfig::builder()
///     .public_dir("out")
///     .render_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.public_dir.to_str(), Some("out"));
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Flat directory holding every `<base>.html` / `<base>.pdf` pair. Default: `public`.
    pub public_dir: PathBuf,

    /// Static assets served under `/assets` (preview stylesheets). Default: `assets`.
    pub assets_dir: PathBuf,

    /// Where uploads are staged while converting. Default: the system temp dir.
    pub upload_dir: Option<PathBuf>,

    /// Stylesheet inlined into every document after the base CSS.
    /// Default: `<assets_dir>/css/custom-styles.css`. A missing file is not an error.
    pub custom_styles_path: Option<PathBuf>,

    /// Markdown served by `GET /example`. Default: the bundled example.
    pub example_path: Option<PathBuf>,

    /// Chromium executable. Default: auto-detected by `chrome-locate`.
    pub browser_executable: Option<PathBuf>,

    /// Per-step timeout for the headless browser in seconds. Default: 60.
    ///
    /// Covers launch, navigation and printing; a hung browser surfaces as a
    /// render error instead of holding the request forever.
    pub render_timeout_secs: u64,

    /// Largest accepted upload in bytes. Default: 5 MiB.
    pub max_upload_bytes: usize,

    /// Fallback page options.
    pub defaults: ConversionDefaults,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            assets_dir: PathBuf::from("assets"),
            upload_dir: None,
            custom_styles_path: None,
            example_path: None,
            browser_executable: None,
            render_timeout_secs: 60,
            max_upload_bytes: 5 * 1024 * 1024,
            defaults: ConversionDefaults::default(),
        }
    }
}

impl AppConfig {
    /// Create a new builder for `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: Self::default(),
        }
    }

    /// The stylesheet to inline, falling back to the one under `assets_dir`.
    pub fn custom_styles(&self) -> PathBuf {
        self.custom_styles_path
            .clone()
            .unwrap_or_else(|| self.assets_dir.join("css").join("custom-styles.css"))
    }
}

/// Builder for [`AppConfig`].
#[derive(Debug)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.public_dir = dir.into();
        self
    }

    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.assets_dir = dir.into();
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = Some(dir.into());
        self
    }

    pub fn custom_styles_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.custom_styles_path = Some(path.into());
        self
    }

    pub fn example_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.example_path = Some(path.into());
        self
    }

    pub fn browser_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.browser_executable = Some(path.into());
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn defaults(mut self, defaults: ConversionDefaults) -> Self {
        self.config.defaults = defaults;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AppConfig, Md2PdfError> {
        let c = &self.config;
        if c.public_dir.as_os_str().is_empty() {
            return Err(Md2PdfError::InvalidConfig(
                "artifact directory must not be empty".into(),
            ));
        }
        if c.render_timeout_secs == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "render timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
