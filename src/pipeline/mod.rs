//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements one transformation step and is testable on
//! its own; the PDF backend sits behind a trait so it can be swapped.
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ document ──▶ (write .html) ──▶ pdf
//! (fragment)   (styled page)                  (headless Chromium)
//! ```
//!
//! 1. [`markdown`]: render Markdown to an HTML fragment with highlighted
//!    code and linkified URLs; pure and deterministic
//! 2. [`document`]: inline the stylesheets in cascade order and wrap the
//!    fragment in a standalone page
//! 3. [`pdf`]: print the written page; runs in `spawn_blocking`
//!    because the DevTools client blocks

pub mod document;
pub mod markdown;
pub mod pdf;
