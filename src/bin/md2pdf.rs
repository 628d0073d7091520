//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate: `serve` runs the web service, the
//! other subcommands operate on the artifact directory directly.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_md2pdf::server::{self, AppState};
use edgequake_md2pdf::{
    delete_artifacts, list_artifacts, list_artifacts_detailed, rewrap_artifact, AppConfig,
    ConversionDefaults, ConversionOptions, Converter, PreviewOptions,
};
use edgequake_md2pdf::{preview::base_name_of, CodeTheme};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the web service on port 3000
  md2pdf serve

  # Convert a file into public/notes.html + public/notes.pdf
  md2pdf convert notes.md

  # Letter, landscape, custom output base
  md2pdf convert notes.md --page-size Letter --orientation landscape -o out/report

  # Page numbers in the footer
  md2pdf convert notes.md --footer '<div style="font-size:8px;width:100%;text-align:center"><span class="pageNumber"></span>/<span class="totalPages"></span></div>'

  # Inspect and clean up the artifact directory
  md2pdf list --details
  md2pdf delete notes

ENVIRONMENT VARIABLES:
  HOST, PORT                 Listen address for `serve`
  MD2PDF_PUBLIC_DIR          Artifact directory (default: public)
  MD2PDF_ASSETS_DIR          Static assets directory (default: assets)
  MD2PDF_BROWSER_PATH        Chromium/Chrome executable
  PUPPETEER_EXECUTABLE_PATH  Fallback browser override
  CHROME_PATH                Fallback browser override
  DEFAULT_PAGE_SIZE          A4 | Letter | Legal (default: A4)
  DEFAULT_ORIENTATION        portrait | landscape (default: portrait)
  DEFAULT_MARGIN_TOP/RIGHT/BOTTOM/LEFT   CSS lengths (default: 20mm)
  DEFAULT_FONT_SIZE          CSS font size (default: 16px)
  RUST_LOG                   Overrides --verbose / --quiet

A .env file in the working directory is loaded at startup.
"#;

/// Convert Markdown to HTML previews and PDFs with headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown to HTML previews and PDFs with headless Chromium",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    shared: SharedArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(Args, Debug)]
struct SharedArgs {
    /// Directory holding generated <name>.html / <name>.pdf pairs.
    #[arg(long, global = true, env = "MD2PDF_PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Static assets directory (preview stylesheets, custom-styles.css).
    #[arg(long, global = true, env = "MD2PDF_ASSETS_DIR", default_value = "assets")]
    assets_dir: PathBuf,

    /// Stylesheet inlined into every document [default: <assets-dir>/css/custom-styles.css].
    #[arg(long, global = true, env = "MD2PDF_CUSTOM_STYLES")]
    custom_styles: Option<PathBuf>,

    /// Chromium/Chrome executable. Auto-detected when unset.
    #[arg(long, global = true, env = "MD2PDF_BROWSER_PATH")]
    browser: Option<PathBuf>,

    /// Per-step browser timeout in seconds.
    #[arg(long, global = true, env = "MD2PDF_RENDER_TIMEOUT", default_value_t = 60)]
    render_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web service.
    Serve {
        /// Interface to bind.
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,

        /// Where uploads are staged during conversion [default: system temp dir].
        #[arg(long, env = "MD2PDF_UPLOAD_DIR")]
        upload_dir: Option<PathBuf>,

        /// Markdown served by GET /example [default: bundled example].
        #[arg(long, env = "MD2PDF_EXAMPLE_PATH")]
        example: Option<PathBuf>,

        /// Largest accepted upload in MiB.
        #[arg(long, env = "MD2PDF_MAX_UPLOAD_MB", default_value_t = 5)]
        max_upload_mb: usize,
    },

    /// Convert one Markdown file.
    Convert {
        /// Markdown file to convert.
        input: PathBuf,

        /// Output path without extension [default: <public-dir>/<input stem>].
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        page: PageArgs,

        /// Re-wrap the HTML artifact in the preview shell, as the web service does.
        #[arg(long)]
        preview: bool,
    },

    /// List artifacts.
    List {
        /// Include type, size and modification time (newest first).
        #[arg(short, long)]
        details: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Delete <basename>.html and <basename>.pdf.
    Delete {
        basename: String,
    },
}

#[derive(Args, Debug, Default)]
struct PageArgs {
    /// A4, Letter or Legal [default: DEFAULT_PAGE_SIZE or A4].
    #[arg(long)]
    page_size: Option<String>,

    /// portrait or landscape [default: DEFAULT_ORIENTATION or portrait].
    #[arg(long)]
    orientation: Option<String>,

    /// Shorthand for all four margins.
    #[arg(long)]
    margin: Option<String>,

    #[arg(long)]
    margin_top: Option<String>,
    #[arg(long)]
    margin_right: Option<String>,
    #[arg(long)]
    margin_bottom: Option<String>,
    #[arg(long)]
    margin_left: Option<String>,

    /// Base font size, e.g. 14px or 11pt.
    #[arg(long)]
    font_size: Option<String>,

    /// File whose CSS is appended after every other stylesheet.
    #[arg(long)]
    css: Option<PathBuf>,

    /// Header HTML template.
    #[arg(long)]
    header: Option<String>,

    /// Footer HTML template.
    #[arg(long)]
    footer: Option<String>,

    /// Code highlighting theme: github, monokai, solarized-dark, solarized-light, ocean, eighties, mocha.
    #[arg(long)]
    code_theme: Option<String>,

    /// Use the colour-blind-friendly preview stylesheet (with --preview).
    #[arg(long)]
    color_blind_friendly: bool,
}

impl PageArgs {
    fn into_options(self) -> Result<ConversionOptions> {
        let custom_css = match &self.css {
            Some(path) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading CSS file {}", path.display()))?,
            ),
            None => None,
        };
        let side = |specific: Option<String>| specific.or_else(|| self.margin.clone());
        Ok(ConversionOptions {
            page_size: self.page_size.clone(),
            orientation: self.orientation.clone(),
            margin_top: side(self.margin_top.clone()),
            margin_right: side(self.margin_right.clone()),
            margin_bottom: side(self.margin_bottom.clone()),
            margin_left: side(self.margin_left.clone()),
            custom_css,
            header_template: self.header.clone(),
            footer_template: self.footer.clone(),
            font_size: self.font_size.clone(),
            code_theme: self.code_theme.clone(),
            color_blind_friendly: self.color_blind_friendly,
        })
    }
}

fn build_config(shared: &SharedArgs) -> Result<AppConfig> {
    let defaults = ConversionDefaults::from_env().context("reading DEFAULT_* settings")?;
    let mut builder = AppConfig::builder()
        .public_dir(&shared.public_dir)
        .assets_dir(&shared.assets_dir)
        .render_timeout_secs(shared.render_timeout)
        .defaults(defaults);
    if let Some(path) = &shared.custom_styles {
        builder = builder.custom_styles_path(path);
    }
    if let Some(path) = &shared.browser {
        builder = builder.browser_executable(path);
    }
    Ok(builder.build()?)
}

/// `--max-upload-mb` in bytes; at least 1 MiB, saturating on huge values.
fn upload_limit_bytes(megabytes: usize) -> usize {
    megabytes.max(1).saturating_mul(1024 * 1024)
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Converting");
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `env = ...` attributes see values from .env.
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // `serve` logs requests at INFO; one-shot commands stay quiet unless asked.
    let base = match &cli.command {
        Command::Serve { .. } => "info,tower_http=info",
        _ => "warn",
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        base
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.shared)?;

    match cli.command {
        Command::Serve {
            host,
            port,
            upload_dir,
            example,
            max_upload_mb,
        } => {
            let mut config = config;
            config.upload_dir = upload_dir;
            config.example_path = example;
            config.max_upload_bytes = upload_limit_bytes(max_upload_mb);

            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;
            server::serve(AppState::new(config), addr).await?;
        }

        Command::Convert {
            input,
            output,
            page,
            preview,
        } => {
            let display_name = input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| input.display().to_string());
            let output_base =
                output.unwrap_or_else(|| config.public_dir.join(base_name_of(&display_name)));
            let options = page.into_options()?;
            let preview_options = PreviewOptions {
                color_blind_friendly: options.color_blind_friendly,
                code_theme: CodeTheme::from_name(options.code_theme.as_deref().unwrap_or_default()),
            };

            let converter = Converter::from_config(&config);
            let bar = (!cli.quiet).then(|| spinner(display_name.clone()));
            let custom_styles = config.custom_styles();
            let result = converter
                .convert_file(&input, &output_base, Some(&custom_styles), &options)
                .await;
            if let Some(bar) = &bar {
                bar.finish_and_clear();
            }
            let out = result.with_context(|| format!("converting {}", input.display()))?;

            if preview {
                rewrap_artifact(&out.html_path, &display_name, &preview_options).await?;
            }

            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✓"),
                    bold(&out.pdf_path.display().to_string()),
                    dim(&format!(
                        "{} KiB, {:.1}s",
                        out.stats.pdf_bytes / 1024,
                        out.stats.total_duration_ms as f64 / 1000.0
                    ))
                );
                eprintln!("  {} {}", dim("html"), out.html_path.display());
            }
        }

        Command::List { details, json } => {
            if details {
                let entries = list_artifacts_detailed(&config.public_dir).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    for e in entries {
                        println!(
                            "{:<40} {:<4} {:>10}  {}",
                            e.name,
                            e.kind,
                            e.size,
                            e.last_modified.format("%Y-%m-%d %H:%M:%S")
                        );
                    }
                }
            } else {
                let names = list_artifacts(&config.public_dir).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&names)?);
                } else {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
        }

        Command::Delete { basename } => {
            let report = delete_artifacts(&config.public_dir, &basename).await?;
            if !cli.quiet {
                eprintln!("{} {}", green("✓"), report.message());
                if report.is_partial() {
                    eprintln!("  {}", dim("only one of the pair existed"));
                }
            }
        }
    }

    Ok(())
}
