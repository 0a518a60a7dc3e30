//! Output types: the OCR provider's page results and the conversion artifacts.
//!
//! [`PageResult`] and [`ImageResult`] mirror the provider's JSON so a response
//! can be deserialised directly. Every field the renderers consult is
//! optional: a missing `markdown` or `image_base64` is treated as absent, never
//! as an error.

use crate::error::Ocr2MdError;
use serde::{Deserialize, Serialize};

/// Suggested file name for the Markdown artifact.
pub const MARKDOWN_FILE_NAME: &str = "ocr_output.md";
/// MIME type of the Markdown artifact.
pub const MARKDOWN_MIME: &str = "text/markdown";
/// Suggested file name for the Word artifact.
pub const DOCX_FILE_NAME: &str = "ocr_output.docx";
/// MIME type of the Word artifact.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The full OCR provider response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OcrResponse {
    /// Pages in the order the provider delivered them.
    #[serde(default)]
    pub pages: Vec<PageResult>,
    /// Model that served the request, as echoed by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_info: Option<UsageInfo>,
}

/// Billing counters reported by the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageInfo {
    #[serde(default)]
    pub pages_processed: Option<u64>,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// One page of OCR output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PageResult {
    /// Zero-based page index. Headings render it as `index + 1`.
    pub index: usize,
    /// Page text, already formatted as Markdown by the provider.
    #[serde(default)]
    pub markdown: Option<String>,
    /// Images extracted from the page, in provider order.
    #[serde(default)]
    pub images: Vec<ImageResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<PageDimensions>,
}

impl PageResult {
    /// 1-based page number used in headings and captions.
    pub fn page_number(&self) -> usize {
        self.index + 1
    }

    /// The page text, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.markdown.as_deref().filter(|s| !s.is_empty())
    }
}

/// Rendered page size reported by the provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

/// One image extracted from a page.
///
/// The provider does not say which raster format `image_base64` holds; both
/// renderers assume PNG.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImageResult {
    #[serde(default)]
    pub id: Option<String>,
    /// Base64-encoded raster bytes. Absent unless images were requested.
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left_x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_left_y: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right_x: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom_right_y: Option<u32>,
}

impl ImageResult {
    /// The encoded payload, if present and non-empty.
    pub fn encoded_data(&self) -> Option<&str> {
        self.image_base64.as_deref().filter(|s| !s.is_empty())
    }
}

/// Result of a complete conversion.
#[derive(Debug)]
pub struct ConversionOutput {
    /// The assembled Markdown document. Always produced on success.
    pub markdown: String,
    /// The Word document, when requested.
    pub rich_document: RichDocumentOutcome,
    /// Pages as returned by the provider.
    pub pages: Vec<PageResult>,
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// The artifacts to offer for download: Markdown always, Word when it
    /// was rendered.
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut out = vec![Artifact::markdown(&self.markdown)];
        if let RichDocumentOutcome::Rendered(bytes) = &self.rich_document {
            out.push(Artifact::docx(bytes.clone()));
        }
        out
    }
}

/// What happened to the optional Word export.
#[derive(Debug)]
pub enum RichDocumentOutcome {
    /// The caller did not ask for a Word document.
    NotRequested,
    /// The `.docx` package bytes.
    Rendered(Vec<u8>),
    /// Requested, but could not be produced. Markdown is unaffected.
    Unavailable(Ocr2MdError),
}

impl RichDocumentOutcome {
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            RichDocumentOutcome::Rendered(b) => Some(b),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Ocr2MdError> {
        match self {
            RichDocumentOutcome::Unavailable(e) => Some(e),
            _ => None,
        }
    }
}

/// Timing and count statistics for a conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages returned by the provider.
    pub total_pages: usize,
    /// Images placed in the Word document (0 when not requested).
    pub images_embedded: usize,
    /// Images skipped while assembling the Word document.
    pub images_skipped: usize,
    /// Size of the submitted PDF.
    pub pdf_size_bytes: usize,
    /// Wall-clock time of the OCR call.
    pub ocr_duration_ms: u64,
    /// Time spent rendering Markdown and Word.
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A downloadable output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn markdown(markdown: &str) -> Self {
        Self {
            file_name: MARKDOWN_FILE_NAME,
            mime_type: MARKDOWN_MIME,
            bytes: markdown.as_bytes().to_vec(),
        }
    }

    pub fn docx(bytes: Vec<u8>) -> Self {
        Self {
            file_name: DOCX_FILE_NAME,
            mime_type: DOCX_MIME,
            bytes,
        }
    }
}
