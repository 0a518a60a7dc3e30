//! Integration tests for the conversion pipeline.
//!
//! The OCR provider is replaced with in-process fakes injected through
//! `OcrConfig::builder().provider(..)`, so these run offline and need no
//! API key.

use futures::future::BoxFuture;
use pdf_ocr2md::{
    convert, convert_from_bytes, convert_in_session, convert_to_dir, Capabilities, ImageResult,
    Ocr2MdError, OcrConfig, OcrProgressCallback, OcrProvider, OcrRequest, OcrResponse,
    PageResult, ProviderError, RichDocumentOutcome, Session,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const PDF: &[u8] = b"%PDF-1.7\n1 0 obj << >> endobj\n%%EOF";

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns a fixed response after an optional delay and counts calls.
struct StaticProvider {
    pages: Vec<PageResult>,
    delay: Duration,
    calls: AtomicUsize,
    last_request: Mutex<Option<OcrRequest>>,
}

impl StaticProvider {
    fn new(pages: Vec<PageResult>) -> Arc<Self> {
        Self::slow(pages, Duration::ZERO)
    }

    fn slow(pages: Vec<PageResult>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            pages,
            delay,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }
}

impl OcrProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn process(&self, request: OcrRequest) -> BoxFuture<'_, Result<OcrResponse, ProviderError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok::<_, ProviderError>(OcrResponse {
                pages: self.pages.clone(),
                ..Default::default()
            })
        })
    }
}

struct FailingProvider;

impl OcrProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn process(&self, _request: OcrRequest) -> BoxFuture<'_, Result<OcrResponse, ProviderError>> {
        Box::pin(async {
            Err::<OcrResponse, _>(ProviderError::Status {
                status: 401,
                body: "Unauthorized".into(),
            })
        })
    }
}

struct PanickingProvider;

impl OcrProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    fn process(&self, _request: OcrRequest) -> BoxFuture<'_, Result<OcrResponse, ProviderError>> {
        let blow_up = || -> Result<OcrResponse, ProviderError> { panic!("provider blew up") };
        Box::pin(async move { blow_up() })
    }
}

/// Never finishes; records when its future is dropped.
struct HangingProvider {
    dropped: Arc<AtomicBool>,
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl OcrProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    fn process(&self, _request: OcrRequest) -> BoxFuture<'_, Result<OcrResponse, ProviderError>> {
        let guard = SetOnDrop(Arc::clone(&self.dropped));
        Box::pin(async move {
            let _guard = guard;
            futures::future::pending::<()>().await;
            Ok::<_, ProviderError>(OcrResponse::default())
        })
    }
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
    ticks: Mutex<Vec<u8>>,
}

impl OcrProgressCallback for RecordingCallback {
    fn on_request_start(&self, pdf_bytes: usize) {
        self.events.lock().unwrap().push(format!("start:{pdf_bytes}"));
    }

    fn on_tick(&self, percent: u8) {
        self.ticks.lock().unwrap().push(percent);
    }

    fn on_request_complete(&self, page_count: usize) {
        self.events.lock().unwrap().push(format!("complete:{page_count}"));
    }

    fn on_request_error(&self, _error: &str) {
        self.events.lock().unwrap().push("error".into());
    }

    fn on_render_complete(&self, _markdown_len: usize, docx_len: Option<usize>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("render:{}", docx_len.is_some()));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn page(index: usize, text: &str) -> PageResult {
    PageResult {
        index,
        markdown: Some(text.into()),
        ..Default::default()
    }
}

fn config_with(provider: Arc<dyn OcrProvider>) -> OcrConfig {
    OcrConfig::builder().provider(provider).build().unwrap()
}

fn write_pdf(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("doc.pdf");
    std::fs::write(&path, PDF).unwrap();
    path
}

// ── Markdown conversion ──────────────────────────────────────────────────────

#[tokio::test]
async fn converts_pages_in_order() {
    init_logging();
    let provider = StaticProvider::new(vec![page(0, "First"), page(1, "Second")]);
    let config = config_with(provider.clone());

    let out = assert_ok!(convert_from_bytes(PDF, &config).await);

    assert_eq!(
        out.markdown,
        "---\n\n### Page 1\n\n\nFirst\n\n\n---\n\n### Page 2\n\n\nSecond"
    );
    assert_eq!(out.stats.total_pages, 2);
    assert!(matches!(out.rich_document, RichDocumentOutcome::NotRequested));
    assert_eq!(out.artifacts().len(), 1);
}

#[tokio::test]
async fn request_carries_pdf_data_uri_and_model() {
    let provider = StaticProvider::new(vec![]);
    let config = OcrConfig::builder()
        .provider(provider.clone())
        .include_images(false)
        .build()
        .unwrap();

    assert_ok!(convert_from_bytes(b"%PDF-1.4", &config).await);

    let req = provider.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(req.document_url, "data:application/pdf;base64,JVBERi0xLjQ=");
    assert_eq!(req.model, "mistral-ocr-latest");
    assert!(!req.include_image_base64);
}

#[tokio::test]
async fn empty_response_gives_empty_markdown() {
    let config = config_with(StaticProvider::new(vec![]));
    let out = assert_ok!(convert_from_bytes(PDF, &config).await);
    assert_eq!(out.markdown, "");
    assert_eq!(out.stats.total_pages, 0);
}

#[tokio::test]
async fn images_are_inlined_as_png_data_uris() {
    let provider = StaticProvider::new(vec![PageResult {
        index: 0,
        markdown: Some("Figure below".into()),
        images: vec![ImageResult {
            id: Some("img-0.jpeg".into()),
            image_base64: Some("QUJD".into()),
            ..Default::default()
        }],
        dimensions: None,
    }]);
    let out = assert_ok!(convert_from_bytes(PDF, &config_with(provider)).await);

    assert!(out.markdown.contains("#### Extracted images"));
    assert!(out
        .markdown
        .ends_with("![page 1 image 1](data:image/png;base64,QUJD)"));
}

#[tokio::test]
async fn converts_local_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path());
    let config = config_with(StaticProvider::new(vec![page(0, "Local")]));

    let out = assert_ok!(convert(path.to_str().unwrap(), &config).await);
    assert!(out.markdown.ends_with("Local"));
    assert_eq!(out.stats.pdf_size_bytes, PDF.len());
}

// ── Input validation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_upload_never_reaches_provider() {
    let provider = StaticProvider::new(vec![page(0, "unused")]);
    let config = config_with(provider.clone());

    let err = assert_err!(convert_from_bytes(&[], &config).await);
    assert!(matches!(err, Ocr2MdError::MissingUpload));
    assert!(err.is_user_actionable());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_pdf_never_reaches_provider() {
    let provider = StaticProvider::new(vec![]);
    let config = config_with(provider.clone());

    let err = assert_err!(convert_from_bytes(b"PK\x03\x04zip", &config).await);
    assert!(matches!(err, Ocr2MdError::NotAPdf { .. }));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreadable_secret_store_is_reported() {
    let config = OcrConfig::builder()
        .secrets_path("/definitely/not/here/secrets.toml")
        .build()
        .unwrap();

    let err = assert_err!(convert_from_bytes(PDF, &config).await);
    assert!(matches!(err, Ocr2MdError::SecretStoreUnreadable { .. }));
}

#[tokio::test]
async fn missing_credential_is_reported_before_input() {
    let any_store = pdf_ocr2md::credentials::default_secret_paths()
        .iter()
        .any(|p| p.exists());
    if std::env::var("MISTRAL_API_KEY").is_ok() || any_store {
        println!("SKIP — an API key is configured in this environment");
        return;
    }

    // Even an invalid input reports the missing key first.
    let err = assert_err!(convert("/no/such/file.pdf", &OcrConfig::default()).await);
    assert!(matches!(err, Ocr2MdError::MissingCredential { .. }));
    assert!(err.is_user_actionable());
}

// ── Provider failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn provider_failure_keeps_source() {
    init_logging();
    let cb = Arc::new(RecordingCallback::default());
    let config = OcrConfig::builder()
        .provider(Arc::new(FailingProvider))
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    let err = assert_err!(convert_from_bytes(PDF, &config).await);
    match &err {
        Ocr2MdError::ProviderCallFailure { provider, source } => {
            assert_eq!(provider, "failing");
            assert!(matches!(source, ProviderError::Status { status: 401, .. }));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(std::error::Error::source(&err).is_some());

    let events = cb.events.lock().unwrap().clone();
    assert_eq!(events, vec![format!("start:{}", PDF.len()), "error".into()]);
}

#[tokio::test]
async fn provider_panic_is_internal_error() {
    let config = config_with(Arc::new(PanickingProvider));
    let err = assert_err!(convert_from_bytes(PDF, &config).await);
    assert!(matches!(err, Ocr2MdError::Internal(_)));
}

// ── Progress and cancellation ────────────────────────────────────────────────

#[tokio::test]
async fn ticks_while_provider_works() {
    init_logging();
    let cb = Arc::new(RecordingCallback::default());
    let provider = StaticProvider::slow(vec![page(0, "done")], Duration::from_millis(200));
    let config = OcrConfig::builder()
        .provider(provider)
        .tick_interval_ms(10)
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    assert_ok!(convert_from_bytes(PDF, &config).await);

    let ticks = cb.ticks.lock().unwrap().clone();
    assert!(ticks.len() >= 3, "expected several ticks, got {ticks:?}");
    assert_eq!(&ticks[..3], &[3, 6, 9]);
    assert!(ticks.iter().all(|&p| p < 100));

    let events = cb.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            format!("start:{}", PDF.len()),
            "complete:1".to_string(),
            "render:false".to_string(),
        ]
    );
}

#[tokio::test]
async fn dropping_the_conversion_aborts_the_request() {
    let dropped = Arc::new(AtomicBool::new(false));
    let config = config_with(Arc::new(HangingProvider {
        dropped: Arc::clone(&dropped),
    }));

    let res = tokio::time::timeout(Duration::from_millis(50), convert_from_bytes(PDF, &config)).await;
    assert!(res.is_err(), "conversion should still be pending");

    // Give the runtime a chance to tear down the aborted task.
    for _ in 0..20 {
        if dropped.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(dropped.load(Ordering::SeqCst));
}

// ── Session ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_is_cleared_by_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path());
    let path = path.to_str().unwrap();
    let mut session = Session::new();

    let ok = config_with(StaticProvider::new(vec![page(0, "kept")]));
    let result = assert_ok!(convert_in_session(&mut session, path, &ok).await);
    assert!(result.markdown.ends_with("kept"));
    assert!(!session.is_empty());

    let failing = config_with(Arc::new(FailingProvider));
    assert_err!(convert_in_session(&mut session, path, &failing).await);
    assert!(session.is_empty());
    assert_eq!(session.runs(), 2);
}

// ── Word export ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_word_backend_still_returns_markdown() {
    let config = OcrConfig::builder()
        .provider(StaticProvider::new(vec![page(0, "text")]))
        .want_docx(true)
        .capabilities(Capabilities::markdown_only())
        .build()
        .unwrap();

    let out = assert_ok!(convert_from_bytes(PDF, &config).await);
    assert!(out.markdown.ends_with("text"));
    assert!(matches!(
        out.rich_document.error(),
        Some(Ocr2MdError::MissingDependency { .. })
    ));
    assert_eq!(out.artifacts().len(), 1);
}

#[cfg(feature = "docx")]
#[tokio::test]
async fn convert_to_dir_writes_both_artifacts() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path());
    let out_dir = dir.path().join("out");
    let cb = Arc::new(RecordingCallback::default());
    let config = OcrConfig::builder()
        .provider(StaticProvider::new(vec![
            page(0, "Alpha\nBeta"),
            page(1, "Gamma"),
        ]))
        .want_docx(true)
        .progress_callback(cb.clone())
        .build()
        .unwrap();

    let (out, written) = assert_ok!(convert_to_dir(pdf.to_str().unwrap(), &out_dir, &config).await);

    assert_eq!(written.len(), 2);
    let md = std::fs::read_to_string(out_dir.join("ocr_output.md")).unwrap();
    assert_eq!(md, out.markdown);

    let docx = std::fs::read(out_dir.join("ocr_output.docx")).unwrap();
    assert!(docx.starts_with(b"PK"), "docx is a zip package");
    assert_eq!(Some(docx.as_slice()), out.rich_document.bytes());

    let events = cb.events.lock().unwrap().clone();
    assert_eq!(events.last().map(String::as_str), Some("render:true"));
}

#[tokio::test]
async fn markdown_only_dir_output() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_pdf(dir.path());
    let config = config_with(StaticProvider::new(vec![page(0, "only md")]));

    let (_, written) = assert_ok!(convert_to_dir(pdf.to_str().unwrap(), dir.path(), &config).await);
    assert_eq!(written, vec![dir.path().join("ocr_output.md")]);
    assert!(!dir.path().join("ocr_output.docx").exists());
}
