//! End-to-end tests against a real headless Chromium.
//!
//! Gated behind the `E2E_ENABLED` environment variable, and skipped when no
//! browser can be located, so they do not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! Point at a specific browser with `MD2PDF_BROWSER_PATH=/path/to/chrome`.

use edgequake_md2pdf::{
    ChromeRenderer, ConversionDefaults, ConversionOptions, Converter, PdfRenderer,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set *and* a browser is installed.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match chrome_locate::locate_browser(None) {
            Ok(path) => path,
            Err(e) => {
                println!("SKIP: {e}");
                return;
            }
        }
    }};
}

fn chrome_converter(browser: PathBuf) -> Converter {
    let renderer: Arc<dyn PdfRenderer> =
        Arc::new(ChromeRenderer::new(Some(browser), Duration::from_secs(60)));
    Converter::new(ConversionDefaults::default(), renderer)
}

/// Number of page objects; `/Pages` tree nodes are excluded by the `\b`.
fn page_count(pdf: &[u8]) -> usize {
    let re = regex::Regex::new(r"/Type\s*/Page\b").unwrap();
    re.find_iter(&String::from_utf8_lossy(pdf)).count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_e2e_hello_world() {
    let browser = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let converter = chrome_converter(browser);

    let start = std::time::Instant::now();
    let out = converter
        .convert("# Hello\n\nworld", &dir.path().join("hello"), None, &ConversionOptions::default())
        .await
        .unwrap();
    println!("converted in {:?}: {:?}", start.elapsed(), out.stats);

    let pdf = std::fs::read(&out.pdf_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"), "not a PDF");
    assert!(pdf.len() > 1000, "PDF suspiciously small: {} bytes", pdf.len());
}

#[tokio::test]
async fn test_e2e_landscape_with_footer() {
    let browser = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let converter = chrome_converter(browser);

    let long: String = (1..=200)
        .map(|i| format!("Paragraph {i} with some filler text.\n\n"))
        .collect();
    let options = ConversionOptions {
        page_size: Some("Letter".into()),
        orientation: Some("landscape".into()),
        footer_template: Some(
            "<div style=\"font-size:8px\"><span class=\"pageNumber\"></span></div>".into(),
        ),
        ..Default::default()
    };
    let out = converter
        .convert(&long, &dir.path().join("long"), None, &options)
        .await
        .unwrap();

    let pdf = std::fs::read(&out.pdf_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    let pages = page_count(&pdf);
    println!("pages: {pages}");
    assert!(pages > 1, "200 paragraphs should span several pages");
}

#[tokio::test]
async fn test_e2e_highlighted_code_and_images_settle() {
    let browser = e2e_skip_unless_ready!();
    let dir = tempfile::tempdir().unwrap();
    let converter = chrome_converter(browser);

    // A broken image must not stall the settle step.
    let md = "```rust\nfn main() { println!(\"hi\"); }\n```\n\n![missing](nope.png)\n";
    let out = tokio::time::timeout(
        Duration::from_secs(90),
        converter.convert(md, &dir.path().join("code"), None, &ConversionOptions::default()),
    )
    .await
    .expect("conversion hung")
    .unwrap();

    let html = std::fs::read_to_string(&out.html_path).unwrap();
    assert!(html.contains("class=\"hljs\""));
    assert!(std::fs::read(&out.pdf_path).unwrap().starts_with(b"%PDF"));
}
