//! HTML → PDF via headless Chromium.
//!
//! ## Why spawn_blocking?
//!
//! `headless_chrome` drives the DevTools protocol with blocking calls on the
//! current thread. [`render_blocking`] moves the whole launch → load → print
//! sequence onto tokio's blocking pool so a slow print never stalls the
//! async workers that serve other requests.
//!
//! ## Browser lifetime
//!
//! One browser process per conversion, owned by a [`BrowserSession`]. The
//! session closes its tab and kills the process in `Drop`, so every exit
//! path (success, `?` early return, panic unwinding) releases it.

use crate::error::Md2PdfError;
use crate::page::PageSetup;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Anything that can print a written HTML document to PDF bytes.
///
/// Implementations are blocking; call them through [`render_blocking`].
pub trait PdfRenderer: Send + Sync {
    fn render(&self, document: &Path, setup: &PageSetup) -> Result<Vec<u8>, Md2PdfError>;
}

/// Run `renderer` on tokio's blocking pool.
pub async fn render_blocking(
    renderer: Arc<dyn PdfRenderer>,
    document: &Path,
    setup: &PageSetup,
) -> Result<Vec<u8>, Md2PdfError> {
    let document = document.to_path_buf();
    let setup = setup.clone();

    tokio::task::spawn_blocking(move || renderer.render(&document, &setup))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("Render task panicked: {}", e)))?
}

/// Flags for running inside containers, where the setuid sandbox and a
/// large `/dev/shm` are usually unavailable. `sandbox(false)` adds `--no-sandbox`.
const LAUNCH_ARGS: [&str; 4] = [
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--font-render-hinting=none",
];

/// Resolves once every `<img>` has loaded or failed and web fonts are ready.
const SETTLE_SCRIPT: &str = r#"(async () => {
  const pending = Array.from(document.images)
    .filter((img) => !img.complete)
    .map((img) => new Promise((resolve) => {
      img.addEventListener('load', resolve, { once: true });
      img.addEventListener('error', resolve, { once: true });
    }));
  await Promise.all(pending);
  if (document.fonts && document.fonts.ready) {
    await document.fonts.ready;
  }
  return true;
})()"#;

/// [`PdfRenderer`] backed by a fresh headless Chromium per call.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    executable: Option<PathBuf>,
    timeout: Duration,
}

impl ChromeRenderer {
    /// `executable` overrides browser discovery; `timeout` bounds every
    /// browser step (launch, navigation, print).
    pub fn new(executable: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable,
            timeout,
        }
    }
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self::new(None, Duration::from_secs(60))
    }
}

impl PdfRenderer for ChromeRenderer {
    fn render(&self, document: &Path, setup: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
        let started = Instant::now();
        let url = file_url(document)?;

        let session = BrowserSession::launch(self.executable.as_deref(), self.timeout)?;
        let tab = session.tab();

        tab.navigate_to(&url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| Md2PdfError::RenderFailed(format!("loading {url}: {e}")))?;
        tab.evaluate(SETTLE_SCRIPT, true)
            .map_err(|e| Md2PdfError::RenderFailed(format!("waiting for resources: {e}")))?;
        debug!("Document settled after {:?}", started.elapsed());

        let pdf = tab
            .print_to_pdf(Some(print_options(setup)))
            .map_err(|e| Md2PdfError::RenderFailed(format!("printing: {e}")))?;

        if pdf.is_empty() {
            return Err(Md2PdfError::RenderFailed(
                "browser returned an empty PDF".into(),
            ));
        }

        info!(
            "Printed {} ({} bytes) in {:?}",
            document.display(),
            pdf.len(),
            started.elapsed()
        );
        Ok(pdf)
    }
}

/// Map a [`PageSetup`] onto Chromium's print parameters (inches).
pub fn print_options(setup: &PageSetup) -> PrintToPdfOptions {
    let (width, height) = setup.format.size_inches();
    let header_footer = setup.header_footer();

    PrintToPdfOptions {
        landscape: Some(setup.orientation.is_landscape()),
        print_background: Some(true),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(setup.margins.top.inches()),
        margin_right: Some(setup.margins.right.inches()),
        margin_bottom: Some(setup.margins.bottom.inches()),
        margin_left: Some(setup.margins.left.inches()),
        prefer_css_page_size: Some(false),
        display_header_footer: Some(header_footer.is_some()),
        header_template: header_footer.as_ref().map(|(h, _)| h.clone()),
        footer_template: header_footer.map(|(_, f)| f),
        ..Default::default()
    }
}

fn file_url(document: &Path) -> Result<String, Md2PdfError> {
    let absolute = document
        .canonicalize()
        .map_err(|e| Md2PdfError::read_failed(document, e))?;
    url::Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| {
            Md2PdfError::RenderFailed(format!(
                "cannot express '{}' as a file URL",
                absolute.display()
            ))
        })
}

// ── Scoped browser session ───────────────────────────────────────────────

/// A launched browser plus one open tab, released on drop.
pub struct BrowserSession {
    tab: Arc<Tab>,
    // Dropped after `tab`; dropping `Browser` kills the process.
    _browser: Browser,
}

impl BrowserSession {
    /// Resolve the executable, start Chromium and open a tab.
    pub fn launch(executable: Option<&Path>, timeout: Duration) -> Result<Self, Md2PdfError> {
        let path = chrome_locate::locate_browser(executable)
            .map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))?;
        debug!("Launching {}", path.display());

        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(Some(path))
            .args(LAUNCH_ARGS.into_iter().map(OsStr::new).collect())
            .idle_browser_timeout(timeout)
            .build()
            .map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))?;

        let browser = Browser::new(options).map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))?;
        // If this fails, `browser` is dropped here and the process goes with it.
        let tab = browser
            .new_tab()
            .map_err(|e| Md2PdfError::BrowserLaunch(format!("opening tab: {e}")))?;
        tab.set_default_timeout(timeout);

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    pub fn tab(&self) -> &Tab {
        &self.tab
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            warn!("Closing browser tab failed: {}", e);
        }
        debug!("Browser session released");
    }
}
