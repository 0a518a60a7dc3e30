//! OCR provider interaction: submit the document reference, get pages back.
//!
//! The only stage with network I/O. [`OcrProvider`] is the seam: the built-in
//! [`MistralOcrClient`] talks to the Mistral OCR endpoint over HTTPS, and
//! callers (or tests) can inject their own implementation through
//! [`crate::config::OcrConfig::provider`].
//!
//! There is deliberately no retry here. A failed call is reported once, with
//! the provider's own error attached, and the caller decides whether to try
//! again.

use crate::error::ProviderError;
use crate::output::OcrResponse;
use futures::future::BoxFuture;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// One OCR request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    /// Provider model identifier.
    pub model: String,
    /// Document reference, usually a `data:application/pdf;base64,…` URI.
    pub document_url: String,
    /// Ask for extracted images as base64 payloads.
    pub include_image_base64: bool,
}

/// An OCR backend.
///
/// Returns a boxed future so the trait stays object-safe and providers can be
/// shared as `Arc<dyn OcrProvider>` across the spawned request task.
pub trait OcrProvider: Send + Sync {
    /// Short provider name used in logs and error messages.
    fn name(&self) -> &str;

    /// Run OCR on the referenced document.
    fn process(&self, request: OcrRequest) -> BoxFuture<'_, Result<OcrResponse, ProviderError>>;
}

// ── Mistral wire format ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct OcrRequestBody<'a> {
    model: &'a str,
    document: DocumentChunk<'a>,
    include_image_base64: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DocumentChunk<'a> {
    DocumentUrl { document_url: &'a str },
}

impl<'a> From<&'a OcrRequest> for OcrRequestBody<'a> {
    fn from(r: &'a OcrRequest) -> Self {
        Self {
            model: &r.model,
            document: DocumentChunk::DocumentUrl {
                document_url: &r.document_url,
            },
            include_image_base64: r.include_image_base64,
        }
    }
}

/// Longest provider error body kept in a [`ProviderError::Status`].
const MAX_ERROR_BODY: usize = 2000;

/// HTTP client for the Mistral OCR endpoint (`POST {base_url}/v1/ocr`).
pub struct MistralOcrClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl MistralOcrClient {
    /// Build a client for `base_url` (e.g. `https://api.mistral.ai`).
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/ocr", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: OcrRequest) -> Result<OcrResponse, ProviderError> {
        info!(
            "POST {} (model={}, images={})",
            self.endpoint, request.model, request.include_image_base64
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&OcrRequestBody::from(&request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let parsed = parse_response(&body)?;
        debug!(
            "Provider returned {} pages ({} bytes)",
            parsed.pages.len(),
            body.len()
        );
        Ok(parsed)
    }
}

impl OcrProvider for MistralOcrClient {
    fn name(&self) -> &str {
        "mistral"
    }

    fn process(&self, request: OcrRequest) -> BoxFuture<'_, Result<OcrResponse, ProviderError>> {
        Box::pin(self.send(request))
    }
}

/// Decode a provider response body.
pub fn parse_response(body: &str) -> Result<OcrResponse, ProviderError> {
    serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\u{2026}", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OcrRequest {
        OcrRequest {
            model: "mistral-ocr-latest".into(),
            document_url: "data:application/pdf;base64,JVBERg==".into(),
            include_image_base64: true,
        }
    }

    #[test]
    fn request_body_matches_wire_format() {
        let r = request();
        let json = serde_json::to_value(OcrRequestBody::from(&r)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "mistral-ocr-latest",
                "document": {
                    "type": "document_url",
                    "document_url": "data:application/pdf;base64,JVBERg=="
                },
                "include_image_base64": true
            })
        );
    }

    #[test]
    fn parse_full_response() {
        let body = r##"{
            "pages": [
                {"index": 0, "markdown": "# One", "images": [], "dimensions": {"dpi": 200, "height": 10, "width": 10}},
                {"index": 1, "markdown": "Two", "images": [{"id": "img-0.jpeg", "image_base64": "QUJD"}]}
            ],
            "model": "mistral-ocr-2505",
            "usage_info": {"pages_processed": 2, "doc_size_bytes": 1234}
        }"##;
        let resp = parse_response(body).unwrap();
        assert_eq!(resp.pages.len(), 2);
        assert_eq!(resp.pages[1].images[0].encoded_data(), Some("QUJD"));
        assert_eq!(resp.model.as_deref(), Some("mistral-ocr-2505"));
        assert_eq!(resp.usage_info.unwrap().pages_processed, Some(2));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[test]
    fn endpoint_is_normalised() {
        let c = MistralOcrClient::new("https://api.mistral.ai/", "k", 5).unwrap();
        assert_eq!(c.endpoint(), "https://api.mistral.ai/v1/ocr");
        assert_eq!(c.name(), "mistral");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let t = truncate("ééééé", 3);
        assert!(t.ends_with('\u{2026}'));
        assert!(t.starts_with('é'));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_http_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let c = MistralOcrClient::new("http://127.0.0.1:9", "k", 5).unwrap();
        let err = c.process(request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)), "got: {err:?}");
    }
}
