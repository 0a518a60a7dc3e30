//! Error types for the pdf-ocr2md library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`Ocr2MdError`] — **Fatal** for the current run: no credential, no
//!   upload, the OCR call failed, the output could not be written. Returned
//!   as `Err(Ocr2MdError)` from the top-level `convert*` functions.
//!
//! * [`ProviderError`] — what went wrong inside the OCR provider call. It is
//!   never returned on its own; [`Ocr2MdError::ProviderCallFailure`] carries
//!   it as its `source` so the original diagnostics stay attached.
//!
//! * [`EmbedError`] — **Non-fatal**: a single image could not be placed in
//!   the Word document. The renderer retries once without explicit sizing and
//!   otherwise skips the image; these errors never reach the caller.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-ocr2md library.
#[derive(Debug, Error)]
pub enum Ocr2MdError {
    // ── Precondition errors ───────────────────────────────────────────────
    /// No API key in the secret store nor in the environment.
    #[error(
        "No Mistral API key found.\n\
Add MISTRAL_API_KEY to a secrets file ({searched}) or set the MISTRAL_API_KEY environment variable."
    )]
    MissingCredential { searched: String },

    /// No PDF was supplied (empty upload).
    #[error("No PDF supplied. Upload a PDF first.")]
    MissingUpload,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: [u8; 4] },

    // ── Secret store ──────────────────────────────────────────────────────
    /// An explicitly requested secrets file could not be read or parsed.
    #[error("Cannot read secrets file '{path}': {detail}")]
    SecretStoreUnreadable { path: PathBuf, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The OCR call itself failed. No partial output is produced.
    #[error("An unexpected error occurred while calling {provider} OCR: {source}")]
    ProviderCallFailure {
        provider: String,
        #[source]
        source: ProviderError,
    },

    /// The run was abandoned before the OCR call completed.
    #[error("OCR call cancelled")]
    Cancelled,

    // ── Export errors ─────────────────────────────────────────────────────
    /// Word export requested but the backend was not compiled in.
    #[error("Word export is unavailable: the '{feature}' feature is not enabled.\n{hint}")]
    MissingDependency { feature: String, hint: String },

    /// The Word backend failed to serialise the package.
    #[error("Failed to assemble Word document: {0}")]
    DocumentAssembly(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Ocr2MdError {
    /// True for the conditions the user can fix before retrying
    /// (missing key, missing upload, missing Word backend).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Ocr2MdError::MissingCredential { .. }
                | Ocr2MdError::MissingUpload
                | Ocr2MdError::MissingDependency { .. }
        )
    }
}

/// Failure inside the OCR provider call.
///
/// The variants are diagnostic only: callers are not expected to branch on
/// provider-specific codes.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level failure (DNS, TLS, connection reset, client timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON shape.
    #[error("could not decode provider response: {0}")]
    Decode(String),

    /// Any other provider-side failure (used by injected providers).
    #[error("{0}")]
    Other(String),
}

/// A non-fatal failure while embedding one image in the Word document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum EmbedError {
    /// The backend could not infer the image's native size, so it cannot be
    /// scaled to the requested width.
    #[error("cannot size image: {detail}")]
    Sizing { detail: String },

    /// The payload was not valid base64.
    #[error("image payload is not valid base64: {detail}")]
    Decode { detail: String },

    /// The backend rejected the image for another reason.
    #[error("image rejected by document backend: {detail}")]
    Backend { detail: String },
}
