//! # pdf-ocr2md
//!
//! Convert PDF documents to Markdown (and optionally Word) with the Mistral
//! OCR API.
//!
//! The OCR itself runs entirely on the provider side. This crate is the
//! adapter around it: it base64-encodes the PDF into a data URI, submits it,
//! and turns the ordered page results into a Markdown document with inline
//! images and, on request, a paginated `.docx`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     read local file or download URL, check %PDF
//!  ├─ 2. Key       secret store → MISTRAL_API_KEY
//!  ├─ 3. Encode    bytes → data:application/pdf;base64,…
//!  ├─ 4. OCR       POST /v1/ocr (spawned task, decorative progress ticks)
//!  ├─ 5. Markdown  "### Page N" sections + inline PNG data URIs
//!  └─ 6. Word      optional: heading, one paragraph per line, images, page break
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_ocr2md::{convert, OcrConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Key read from .ocr2md/secrets.toml or MISTRAL_API_KEY
//!     let config = OcrConfig::builder().want_docx(true).build()?;
//!     let output = convert("document.pdf", &config).await?;
//!     println!("{}", output.markdown);
//!     if let Some(err) = output.rich_document.error() {
//!         eprintln!("no Word export: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `docx`  | on      | Word export via `docx-rs`; without it Word requests report `MissingDependency` |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capability;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capability::Capabilities;
pub use config::{OcrConfig, OcrConfigBuilder};
pub use convert::{
    convert, convert_from_bytes, convert_in_session, convert_sync, convert_to_dir,
    render_outputs, write_artifact,
};
pub use error::{EmbedError, Ocr2MdError, ProviderError};
pub use output::{
    Artifact, ConversionOutput, ConversionStats, ImageResult, OcrResponse, PageResult,
    RichDocumentOutcome,
};
pub use pipeline::docx::{render_rich_document, write_pages, DocumentSink, EmbedReport};
pub use pipeline::encode::pdf_data_url;
pub use pipeline::markdown::render_markdown;
pub use pipeline::ocr::{MistralOcrClient, OcrProvider, OcrRequest};
pub use progress::{NoopProgressCallback, OcrProgressCallback, ProgressCallback};
pub use session::{Session, SessionResult};
