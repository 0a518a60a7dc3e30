//! CLI binary for pdf-ocr2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `OcrConfig` and prints or writes the results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_ocr2md::{
    convert, write_artifact, Capabilities, ConversionOutput, Ocr2MdError, OcrConfig,
    OcrProgressCallback, ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback.
///
/// The provider reports nothing while it works, so the bar is a wrapping
/// pseudo-percentage driven by the library's ticker. It says "still
/// working", not "this far along".
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn activate_bar(&self) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}]  ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.set_position(0);
    }

    /// Remove the bar from the terminal, whatever state it is in.
    fn clear(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_request_start(&self, pdf_bytes: usize) {
        self.activate_bar();
        self.bar.set_message(dim(&format!("{} KiB uploaded", pdf_bytes / 1024)));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold("Sending document to the OCR service…")
        ));
    }

    fn on_tick(&self, percent: u8) {
        self.bar.set_position(u64::from(percent));
    }

    fn on_request_complete(&self, page_count: usize) {
        self.bar.set_position(100);
        self.bar.println(format!(
            "  {} OCR returned {} pages",
            green("✓"),
            bold(&page_count.to_string())
        ));
        self.bar.set_prefix("Rendering");
    }

    fn on_request_error(&self, error: &str) {
        let msg = if error.chars().count() > 80 {
            let cut: String = error.chars().take(79).collect();
            format!("{cut}\u{2026}")
        } else {
            error.to_string()
        };
        self.bar.println(format!("  {} {}", red("✗"), red(&msg)));
        self.bar.finish_and_clear();
    }

    fn on_render_complete(&self, markdown_len: usize, docx_len: Option<usize>) {
        self.bar.finish_and_clear();
        let docx = match docx_len {
            Some(n) => format!("  /  {} bytes docx", n),
            None => String::new(),
        };
        eprintln!(
            "{} {}{}",
            green("✔"),
            dim(&format!("{markdown_len} chars markdown")),
            dim(&docx)
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Markdown to stdout
  ocr2md document.pdf

  # Write ocr_output.md and ocr_output.docx into ./out
  ocr2md document.pdf -o out --docx

  # Convert from URL, text only
  ocr2md https://arxiv.org/pdf/1706.03762 --no-images -o out

  # JSON output with per-page results and stats
  ocr2md --json document.pdf > output.json

CREDENTIALS (first non-empty wins):
  --secrets <FILE>                   TOML file with MISTRAL_API_KEY = "..."
  ./.ocr2md/secrets.toml             project secret store
  <config dir>/ocr2md/secrets.toml   user secret store
  MISTRAL_API_KEY                    environment variable

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY         Mistral API key
  OCR2MD_MODEL            Override the OCR model ID
  OCR2MD_BASE_URL         Override the API base URL
  RUST_LOG                Override the log filter
"#;

/// Convert PDF files and URLs to Markdown using Mistral OCR.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2md",
    version,
    about = "Convert PDF files and URLs to Markdown using Mistral OCR",
    long_about = "Convert PDF documents (local files or URLs) to Markdown with the Mistral OCR \
API. Page text is kept as returned by the service, extracted images are inlined as data URIs, \
and a paginated Word document can be produced alongside.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write ocr_output.md (and ocr_output.docx) into this directory
    /// instead of printing Markdown to stdout.
    #[arg(short, long, env = "OCR2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Also produce a Word document (requires --output-dir).
    #[arg(long, requires = "output_dir")]
    docx: bool,

    /// Ask the service not to return extracted images.
    #[arg(long)]
    no_images: bool,

    /// OCR model ID.
    #[arg(long, env = "OCR2MD_MODEL")]
    model: Option<String>,

    /// API base URL.
    #[arg(long, env = "OCR2MD_BASE_URL")]
    base_url: Option<String>,

    /// TOML secret store to read MISTRAL_API_KEY from.
    #[arg(long, env = "OCR2MD_SECRETS")]
    secrets: Option<PathBuf>,

    /// Output structured JSON instead of Markdown.
    #[arg(long, conflicts_with = "output_dir")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCR2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCR2MD_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "OCR2MD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// OCR call timeout in seconds.
    #[arg(long, env = "OCR2MD_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless verbose output was asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let capabilities = Capabilities::detect();
    if cli.docx && !capabilities.rich_document && !cli.quiet {
        eprintln!(
            "{} Word export is not compiled into this build; only Markdown will be written.",
            yellow("⚠")
        );
    }

    let progress = show_progress.then(CliProgressCallback::new);
    let progress_cb = progress
        .clone()
        .map(|cb| cb as Arc<dyn OcrProgressCallback>);

    let config = build_config(&cli, capabilities, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    // Ctrl-C drops the conversion future, which aborts the OCR request.
    let output = tokio::select! {
        res = convert(&cli.input, &config) => res,
        _ = tokio::signal::ctrl_c() => Err(Ocr2MdError::Cancelled),
    };

    if output.is_err() {
        if let Some(ref bar) = progress {
            bar.clear();
        }
    }

    let output = match output {
        Ok(o) => o,
        Err(e) if e.is_user_actionable() => {
            eprintln!("{} {}", red("✘"), e);
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Conversion failed"),
    };

    if let Some(err) = output.rich_document.error() {
        if !cli.quiet {
            eprintln!("{} {}", yellow("⚠"), err);
        }
    }

    if let Some(ref dir) = cli.output_dir {
        let mut written = Vec::new();
        for artifact in output.artifacts() {
            let path = write_artifact(dir, &artifact)
                .await
                .with_context(|| format!("Failed to write {}", artifact.file_name))?;
            written.push(path);
        }

        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {} images  {}ms",
                if output.stats.images_skipped == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                output.stats.total_pages,
                output.stats.images_embedded,
                output.stats.total_duration_ms,
            );
            for path in &written {
                eprintln!("   →  {}", bold(&path.display().to_string()));
            }
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&json_view(&output))
            .context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(output.markdown.as_bytes())
            .context("Failed to write to stdout")?;
        if !output.markdown.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }

        if !cli.quiet && !show_progress {
            eprintln!(
                "Converted {} pages in {}ms",
                output.stats.total_pages, output.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Map CLI args to `OcrConfig`.
fn build_config(
    cli: &Cli,
    capabilities: Capabilities,
    progress: Option<ProgressCallback>,
) -> Result<OcrConfig> {
    let mut builder = OcrConfig::builder()
        .include_images(!cli.no_images)
        .want_docx(cli.docx)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout)
        .capabilities(capabilities);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(ref path) = cli.secrets {
        builder = builder.secrets_path(path.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The `--json` document: everything except the binary Word package.
fn json_view(output: &ConversionOutput) -> serde_json::Value {
    serde_json::json!({
        "markdown": output.markdown,
        "pages": output.pages,
        "stats": output.stats,
        "rich_document_error": output.rich_document.error().map(|e| e.to_string()),
    })
}
