//! Conversion entry points.
//!
//! A conversion is: resolve the provider (credential checked first), resolve
//! the upload, encode it, run the OCR call as a spawned task while a ticker
//! drives the progress callback, then render Markdown and, on request, the
//! Word document. Nothing touches the network before both the credential and
//! the upload have been validated.
//!
//! Dropping the future returned by [`convert`] aborts the in-flight OCR task,
//! so a front-end can cancel simply by abandoning the run.

use crate::capability::Capabilities;
use crate::config::OcrConfig;
use crate::credentials::{self, ApiKey, CredentialSource};
use crate::error::Ocr2MdError;
use crate::output::{
    Artifact, ConversionOutput, ConversionStats, OcrResponse, PageResult, RichDocumentOutcome,
};
use crate::pipeline::docx::{render_rich_document, EmbedReport};
use crate::pipeline::encode::pdf_data_url;
use crate::pipeline::input::{self, PdfUpload};
use crate::pipeline::markdown::render_markdown;
use crate::pipeline::ocr::{MistralOcrClient, OcrProvider, OcrRequest};
use crate::progress::next_percent;
use crate::session::{Session, SessionResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Convert a PDF file or URL to Markdown (and optionally Word).
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// - [`Ocr2MdError::MissingCredential`] before anything else is attempted
/// - input errors (not found, not a PDF, download failure)
/// - [`Ocr2MdError::ProviderCallFailure`] when the OCR call fails
///
/// A missing Word backend is *not* an error here: it is reported in
/// [`ConversionOutput::rich_document`] and the Markdown is still returned.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    let provider = resolve_provider(config)?;
    let upload = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run(provider, upload, config).await
}

/// Convert PDF bytes already in memory (e.g. from an upload widget).
///
/// # Errors
/// [`Ocr2MdError::MissingUpload`] for an empty buffer, otherwise as
/// [`convert`].
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    let provider = resolve_provider(config)?;
    let upload = PdfUpload::from_bytes("upload.pdf", bytes.to_vec())?;
    run(provider, upload, config).await
}

/// Run a conversion inside a [`Session`]: the session is cleared first and
/// populated only if the run succeeds.
pub async fn convert_in_session<'s>(
    session: &'s mut Session,
    input_str: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<&'s SessionResult, Ocr2MdError> {
    session.begin_run();
    let output = convert(input_str, config).await?;
    session.store(&output);
    session
        .result()
        .ok_or_else(|| Ocr2MdError::Internal("session result missing after store".into()))
}

/// Convert and write the artifacts into `out_dir` under their fixed names
/// (`ocr_output.md`, `ocr_output.docx`).
///
/// Uses atomic writes (temp file + rename) to prevent partial files.
pub async fn convert_to_dir(
    input_str: impl AsRef<str>,
    out_dir: impl AsRef<Path>,
    config: &OcrConfig,
) -> Result<(ConversionOutput, Vec<PathBuf>), Ocr2MdError> {
    let output = convert(input_str, config).await?;
    let mut written = Vec::new();
    for artifact in output.artifacts() {
        written.push(write_artifact(out_dir.as_ref(), &artifact).await?);
    }
    Ok((output, written))
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Ocr2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Render already-fetched pages: Markdown always, Word when `want_docx`.
///
/// Pure apart from logging; useful for re-rendering a saved provider
/// response without calling the API again.
pub fn render_outputs(
    pages: &[PageResult],
    want_docx: bool,
    capabilities: &Capabilities,
) -> (String, RichDocumentOutcome, EmbedReport) {
    let markdown = render_markdown(pages);

    if !want_docx {
        return (markdown, RichDocumentOutcome::NotRequested, EmbedReport::default());
    }

    match render_rich_document(pages, capabilities) {
        Ok(doc) => (markdown, RichDocumentOutcome::Rendered(doc.bytes), doc.report),
        Err(e) => {
            warn!("Word export unavailable: {}", e);
            (markdown, RichDocumentOutcome::Unavailable(e), EmbedReport::default())
        }
    }
}

/// Write one artifact into `dir` atomically and return its final path.
pub async fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<PathBuf, Ocr2MdError> {
    let path = dir.join(artifact.file_name);
    let write_err = |source| Ocr2MdError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = dir.join(format!("{}.tmp", artifact.file_name));
    tokio::fs::write(&tmp_path, &artifact.bytes)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_err)?;

    debug!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(path)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the OCR provider.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Explicit key** (`config.api_key`) — builds the Mistral client.
/// 3. **Secret store, then `MISTRAL_API_KEY`** — see [`crate::credentials`].
fn resolve_provider(config: &OcrConfig) -> Result<Arc<dyn OcrProvider>, Ocr2MdError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let key = match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(k) => ApiKey::new(k, CredentialSource::Explicit),
        None => credentials::resolve_api_key(config.secrets_path.as_deref())?,
    };
    debug!("API key source: {:?}", key.source);

    let client = MistralOcrClient::new(&config.base_url, key.expose(), config.api_timeout_secs)
        .map_err(|source| Ocr2MdError::ProviderCallFailure {
            provider: "mistral".to_string(),
            source,
        })?;
    Ok(Arc::new(client))
}

async fn run(
    provider: Arc<dyn OcrProvider>,
    upload: PdfUpload,
    config: &OcrConfig,
) -> Result<ConversionOutput, Ocr2MdError> {
    let total_start = Instant::now();
    let pdf_size_bytes = upload.bytes.len();

    // ── Encode ───────────────────────────────────────────────────────────
    let request = OcrRequest {
        model: config.model.clone(),
        document_url: pdf_data_url(&upload.bytes),
        include_image_base64: config.include_images,
    };
    drop(upload);

    // ── OCR ──────────────────────────────────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_request_start(pdf_size_bytes);
    }
    let ocr_start = Instant::now();
    let response = match run_ocr_task(provider, request, config).await {
        Ok(r) => r,
        Err(e) => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_request_error(&e.to_string());
            }
            return Err(e);
        }
    };
    let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;
    info!(
        "OCR returned {} pages in {}ms",
        response.pages.len(),
        ocr_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_request_complete(response.pages.len());
    }

    // ── Render ───────────────────────────────────────────────────────────
    let render_start = Instant::now();
    let (markdown, rich_document, report) =
        render_outputs(&response.pages, config.want_docx, &config.capabilities);
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(markdown.len(), rich_document.bytes().map(<[u8]>::len));
    }

    let stats = ConversionStats {
        total_pages: response.pages.len(),
        images_embedded: report.embedded,
        images_skipped: report.skipped,
        pdf_size_bytes,
        ocr_duration_ms,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} bytes Markdown, {}ms total",
        stats.total_pages,
        markdown.len(),
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        rich_document,
        pages: response.pages,
        stats,
    })
}

/// Aborts the wrapped task when dropped, so abandoning a conversion cancels
/// the request.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Spawn the OCR call and tick the progress callback until it finishes.
async fn run_ocr_task(
    provider: Arc<dyn OcrProvider>,
    request: OcrRequest,
    config: &OcrConfig,
) -> Result<OcrResponse, Ocr2MdError> {
    let provider_name = provider.name().to_string();
    let mut task = AbortOnDrop(tokio::spawn(
        async move { provider.process(request).await },
    ));

    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut percent = 0u8;

    let joined = loop {
        tokio::select! {
            res = &mut task.0 => break res,
            _ = ticker.tick() => {
                percent = next_percent(percent);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_tick(percent);
                }
            }
        }
    };

    match joined {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(source)) => {
            warn!("{} OCR call failed: {}", provider_name, source);
            Err(Ocr2MdError::ProviderCallFailure {
                provider: provider_name,
                source,
            })
        }
        Err(e) if e.is_cancelled() => Err(Ocr2MdError::Cancelled),
        Err(e) => Err(Ocr2MdError::Internal(format!("OCR task panicked: {}", e))),
    }
}
