//! Shared helpers for integration tests.
#![allow(dead_code)]

use edgequake_md2pdf::{ConversionDefaults, Converter, Md2PdfError, PageSetup, PdfRenderer};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Stand-in for Chromium: the "PDF" is a header followed by the HTML it was
/// asked to print, so tests can check which document was rendered.
#[derive(Default)]
pub struct FakeRenderer {
    pub setups: Mutex<Vec<PageSetup>>,
}

pub const FAKE_PDF_HEADER: &[u8] = b"%PDF-1.4\n";

impl PdfRenderer for FakeRenderer {
    fn render(&self, document: &Path, setup: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
        let html = std::fs::read(document).map_err(|e| Md2PdfError::ReadFailed {
            path: document.to_path_buf(),
            source: e,
        })?;
        self.setups.lock().unwrap().push(setup.clone());
        let mut pdf = FAKE_PDF_HEADER.to_vec();
        pdf.extend_from_slice(&html);
        Ok(pdf)
    }
}

impl FakeRenderer {
    pub fn last_setup(&self) -> PageSetup {
        self.setups
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("renderer was never called")
    }
}

/// Always fails, like a browser that crashed mid-print.
pub struct FailingRenderer;

impl PdfRenderer for FailingRenderer {
    fn render(&self, _document: &Path, _setup: &PageSetup) -> Result<Vec<u8>, Md2PdfError> {
        Err(Md2PdfError::RenderFailed("browser crashed".into()))
    }
}

pub fn fake_converter() -> (Converter, Arc<FakeRenderer>) {
    let renderer = Arc::new(FakeRenderer::default());
    let converter = Converter::new(ConversionDefaults::default(), renderer.clone());
    (converter, renderer)
}

pub fn failing_converter() -> Converter {
    Converter::new(ConversionDefaults::default(), Arc::new(FailingRenderer))
}
