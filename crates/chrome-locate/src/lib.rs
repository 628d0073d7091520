//! # chrome-locate
//!
//! Resolve a Chromium / Google Chrome executable for headless PDF printing,
//! so that callers of `headless_chrome` get one clear error listing every
//! location that was searched instead of a bare "could not launch".
//!
//! ## How it works
//!
//! [`locate_browser`] tries, in order:
//!
//! 1. The explicit path passed by the caller (must exist, no fallback).
//! 2. `MD2PDF_BROWSER_PATH`, `PUPPETEER_EXECUTABLE_PATH`, `CHROME_PATH`.
//! 3. Well-known install locations for the current platform.
//! 4. A `PATH` lookup for the usual binary names (`chromium`,
//!    `google-chrome`, `chrome`, …).
//!
//! The auto-detected result (steps 2–4) is memoised for the lifetime of the
//! process; an explicit path is always re-checked.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrome_locate::locate_browser;
//!
//! let chrome = locate_browser(None).expect("no Chromium installed");
//! println!("using {}", chrome.display());
//! ```
//!
//! ## Platform support
//!
//! | OS      | Well-known locations |
//! |---------|----------------------|
//! | Linux   | `/usr/bin/chromium`, `/usr/bin/google-chrome`, snap, `/opt/google/chrome` |
//! | macOS   | `/Applications/{Google Chrome,Chromium}.app` (system and per-user) |
//! | Windows | `%ProgramFiles%`, `%ProgramFiles(x86)%`, `%LOCALAPPDATA%` Chrome installs |

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variables consulted for an executable override, in order.
pub const ENV_OVERRIDES: [&str; 3] = [
    "MD2PDF_BROWSER_PATH",
    "PUPPETEER_EXECUTABLE_PATH",
    "CHROME_PATH",
];

/// Binary names looked up on `PATH`, in order of preference.
pub const BINARY_NAMES: [&str; 7] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "headless_shell",
    "msedge",
];

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// An explicitly configured path does not point to a file.
    #[error("Browser executable '{}' does not exist", path.display())]
    MissingExplicit { path: PathBuf },

    /// An environment override points to a file that does not exist.
    #[error("{var} is set to '{}' but no such file exists", path.display())]
    MissingOverride { var: &'static str, path: PathBuf },

    /// Nothing usable was found anywhere.
    #[error(
        "No Chromium/Chrome executable found.\n\
Searched:\n{}\n\
Install Chromium or set MD2PDF_BROWSER_PATH=/path/to/chrome.",
        format_searched(searched)
    )]
    NotFound { searched: Vec<String> },
}

fn format_searched(searched: &[String]) -> String {
    searched
        .iter()
        .map(|s| format!("  • {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static DETECTED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the browser executable, reading overrides from the process
/// environment.
///
/// `explicit` wins over everything else and is never silently replaced by
/// a detected browser: if it does not exist, [`LocateError::MissingExplicit`]
/// is returned.
pub fn locate_browser(explicit: Option<&Path>) -> Result<PathBuf, LocateError> {
    if let Some(path) = explicit {
        return check_explicit(path);
    }

    if let Some(path) = DETECTED_PATH.get() {
        return Ok(path.clone());
    }

    let path = locate_with(None, |var| std::env::var(var).ok())?;

    // Best-effort cache; a racing thread resolves the same path.
    let _ = DETECTED_PATH.set(path.clone());

    Ok(path)
}

/// Resolve the browser executable using `lookup` for environment variables.
///
/// This is the uncached core of [`locate_browser`]; it is public so callers
/// (and tests) can supply their own variable source.
pub fn locate_with<F>(explicit: Option<&Path>, lookup: F) -> Result<PathBuf, LocateError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = explicit {
        return check_explicit(path);
    }

    // 1. Environment overrides. A set-but-missing override is an error:
    //    silently launching a different browser hides the misconfiguration.
    for var in ENV_OVERRIDES {
        if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
            let path = PathBuf::from(value.trim());
            if path.is_file() {
                return Ok(path);
            }
            return Err(LocateError::MissingOverride { var, path });
        }
    }

    let mut searched = Vec::new();

    // 2. Well-known install locations.
    for candidate in well_known_paths() {
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate.display().to_string());
    }

    // 3. PATH lookup.
    for name in BINARY_NAMES {
        if let Ok(path) = which::which(name) {
            return Ok(path);
        }
        searched.push(format!("$PATH/{name}"));
    }

    Err(LocateError::NotFound { searched })
}

/// Returns `true` when a browser can be resolved without an explicit path.
pub fn is_browser_available() -> bool {
    locate_browser(None).is_ok()
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn check_explicit(path: &Path) -> Result<PathBuf, LocateError> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(LocateError::MissingExplicit {
            path: path.to_path_buf(),
        })
    }
}

/// Platform-specific absolute install paths, most common first.
fn well_known_paths() -> Vec<PathBuf> {
    match std::env::consts::OS {
        "linux" => [
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
        .iter()
        .map(PathBuf::from)
        .collect(),
        "macos" => {
            let bundles = [
                "Google Chrome.app/Contents/MacOS/Google Chrome",
                "Chromium.app/Contents/MacOS/Chromium",
                "Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
            ];
            let mut roots = vec![PathBuf::from("/Applications")];
            if let Some(home) = dirs::home_dir() {
                roots.push(home.join("Applications"));
            }
            roots
                .iter()
                .flat_map(|root| bundles.iter().map(move |b| root.join(b)))
                .collect()
        }
        "windows" => {
            let mut roots: Vec<PathBuf> = ["ProgramFiles", "ProgramFiles(x86)"]
                .iter()
                .filter_map(|var| std::env::var_os(var).map(PathBuf::from))
                .collect();
            if let Some(local) = dirs::data_local_dir() {
                roots.push(local);
            }
            roots
                .iter()
                .flat_map(|root| {
                    [
                        root.join(r"Google\Chrome\Application\chrome.exe"),
                        root.join(r"Chromium\Application\chrome.exe"),
                        root.join(r"Microsoft\Edge\Application\msedge.exe"),
                    ]
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fake_binary(dir: &Path) -> PathBuf {
        let p = dir.join("chrome");
        std::fs::write(&p, b"#!/bin/sh\n").unwrap();
        p
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = locate_with(Some(Path::new("/definitely/not/chrome")), |_| None).unwrap_err();
        assert!(matches!(err, LocateError::MissingExplicit { .. }));
        assert!(err.to_string().contains("/definitely/not/chrome"));
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_binary(dir.path());
        let found = locate_with(Some(&bin), |_| Some("/elsewhere".into())).unwrap();
        assert_eq!(found, bin);
    }

    #[test]
    fn first_env_override_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_binary(dir.path());
        let env: HashMap<&str, String> =
            [("PUPPETEER_EXECUTABLE_PATH", bin.display().to_string())].into();
        let found = locate_with(None, |k| env.get(k).cloned()).unwrap();
        assert_eq!(found, bin);
    }

    #[test]
    fn missing_env_override_is_reported() {
        let env: HashMap<&str, String> = [("CHROME_PATH", "/nope/chrome".to_string())].into();
        let err = locate_with(None, |k| env.get(k).cloned()).unwrap_err();
        match err {
            LocateError::MissingOverride { var, path } => {
                assert_eq!(var, "CHROME_PATH");
                assert_eq!(path, PathBuf::from("/nope/chrome"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_env_override_is_ignored() {
        let env: HashMap<&str, String> = [("MD2PDF_BROWSER_PATH", "   ".to_string())].into();
        // Either a real browser is found or NotFound lists the search; never
        // a MissingOverride for the blank variable.
        match locate_with(None, |k| env.get(k).cloned()) {
            Ok(_) => {}
            Err(LocateError::NotFound { searched }) => assert!(!searched.is_empty()),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn not_found_message_lists_locations() {
        let err = LocateError::NotFound {
            searched: vec!["/usr/bin/chromium".into(), "$PATH/chrome".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/bin/chromium"));
        assert!(msg.contains("MD2PDF_BROWSER_PATH"));
    }
}
