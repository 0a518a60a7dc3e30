//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! The OCR request embeds the whole document, so unlike a rasterising
//! pipeline nothing needs a file-system path: local files are read and URLs
//! are downloaded straight into memory. Either way the `%PDF` magic bytes are
//! checked before anything is sent to the provider.

use crate::error::Ocr2MdError;
use std::path::PathBuf;
use tracing::{debug, info};

/// An uploaded PDF.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    /// Display name (file name or URL) for logs and errors.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    /// Wrap in-memory bytes, validating that they look like a PDF.
    ///
    /// # Errors
    /// [`Ocr2MdError::MissingUpload`] for an empty buffer,
    /// [`Ocr2MdError::NotAPdf`] when the magic bytes are wrong.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, Ocr2MdError> {
        let name = name.into();
        validate_pdf(&name, &bytes)?;
        Ok(Self { name, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// If the input is a URL, download it. If it is a local path, read it.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfUpload, Ocr2MdError> {
    if input.trim().is_empty() {
        return Err(Ocr2MdError::MissingUpload);
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.contains("://") {
        Err(Ocr2MdError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        read_local(input).await
    }
}

fn validate_pdf(name: &str, bytes: &[u8]) -> Result<(), Ocr2MdError> {
    if bytes.is_empty() {
        return Err(Ocr2MdError::MissingUpload);
    }
    if !bytes.starts_with(b"%PDF") {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(Ocr2MdError::NotAPdf {
            source_name: name.to_string(),
            magic,
        });
    }
    Ok(())
}

async fn read_local(path_str: &str) -> Result<PdfUpload, Ocr2MdError> {
    let path = PathBuf::from(path_str);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Ocr2MdError::PermissionDenied { path: path.clone() },
        _ => Ocr2MdError::FileNotFound { path: path.clone() },
    })?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    PdfUpload::from_bytes(path.display().to_string(), bytes)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfUpload, Ocr2MdError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Ocr2MdError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Ocr2MdError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Ocr2MdError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Ocr2MdError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Ocr2MdError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    PdfUpload::from_bytes(url, bytes.to_vec())
}
