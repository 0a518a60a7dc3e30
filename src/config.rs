//! Configuration types for PDF OCR conversion.
//!
//! All conversion behaviour is controlled through [`OcrConfig`], built via its
//! [`OcrConfigBuilder`]. The builder lets callers set only what they care
//! about and rely on documented defaults for the rest.

use crate::capability::Capabilities;
use crate::error::Ocr2MdError;
use crate::pipeline::ocr::OcrProvider;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default OCR model identifier.
pub const DEFAULT_MODEL: &str = "mistral-ocr-latest";

/// Default Mistral API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

/// Configuration for a PDF OCR conversion.
///
/// # Example
/// ```rust
/// use pdf_ocr2md::OcrConfig;
///
/// let config = OcrConfig::builder()
///     .want_docx(true)
///     .include_images(false)
///     .build()
///     .unwrap();
/// assert!(config.want_docx);
/// ```
#[derive(Clone)]
pub struct OcrConfig {
    /// OCR model identifier. Default: `mistral-ocr-latest`.
    pub model: String,

    /// API base URL; the request goes to `{base_url}/v1/ocr`.
    pub base_url: String,

    /// Ask the provider to return extracted images as base64. Default: true.
    pub include_images: bool,

    /// Also produce a Word document. Default: false.
    pub want_docx: bool,

    /// API key supplied directly. Skips the secret store and environment.
    pub api_key: Option<String>,

    /// Secrets file to consult before the implicit locations.
    pub secrets_path: Option<PathBuf>,

    /// Pre-constructed OCR provider. Takes precedence over the built-in
    /// Mistral client (and over credential resolution).
    pub provider: Option<Arc<dyn OcrProvider>>,

    /// HTTP timeout for the OCR call in seconds. Default: 300.
    ///
    /// Large scanned books take minutes on the provider side.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Interval between decorative progress ticks. Default: 80 ms.
    pub tick_interval_ms: u64,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Optional backends available in this build. Detected once at default
    /// construction.
    pub capabilities: Capabilities,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            include_images: true,
            want_docx: false,
            api_key: None,
            secrets_path: None,
            provider: None,
            api_timeout_secs: 300,
            download_timeout_secs: 120,
            tick_interval_ms: 80,
            progress_callback: None,
            capabilities: Capabilities::detect(),
        }
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("include_images", &self.include_images)
            .field("want_docx", &self.want_docx)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("secrets_path", &self.secrets_path)
            .field("provider", &self.provider.as_ref().map(|p| p.name().to_string()))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("tick_interval_ms", &self.tick_interval_ms)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl OcrConfig {
    /// Create a new builder for `OcrConfig`.
    pub fn builder() -> OcrConfigBuilder {
        OcrConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`OcrConfig`].
#[derive(Debug)]
pub struct OcrConfigBuilder {
    config: OcrConfig,
}

impl OcrConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn include_images(mut self, v: bool) -> Self {
        self.config.include_images = v;
        self
    }

    pub fn want_docx(mut self, v: bool) -> Self {
        self.config.want_docx = v;
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.secrets_path = Some(path.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn OcrProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn tick_interval_ms(mut self, ms: u64) -> Self {
        self.config.tick_interval_ms = ms;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn capabilities(mut self, caps: Capabilities) -> Self {
        self.config.capabilities = caps;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<OcrConfig, Ocr2MdError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Ocr2MdError::InvalidConfig("model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(Ocr2MdError::InvalidConfig(format!(
                "base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.tick_interval_ms == 0 {
            return Err(Ocr2MdError::InvalidConfig(
                "tick interval must be ≥ 1 ms".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(Ocr2MdError::InvalidConfig(
                "API timeout must be ≥ 1 s".into(),
            ));
        }
        Ok(self.config)
    }
}
