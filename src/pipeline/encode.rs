//! Request encoding: raw PDF bytes → `data:application/pdf;base64,…` URI.
//!
//! The OCR endpoint accepts a document either by public URL or inline as a
//! data URI. Inlining avoids hosting the upload anywhere; the payload is the
//! standard (padded) base64 alphabet. No size limit is enforced here, the
//! provider rejects oversized documents itself.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// MIME prefix of every document reference produced by [`pdf_data_url`].
pub const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

/// Embed a PDF as a base64 data URI suitable for the OCR request body.
pub fn pdf_data_url(pdf_bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(pdf_bytes);
    debug!("Encoded PDF {} bytes → {} bytes base64", pdf_bytes.len(), b64.len());

    let mut url = String::with_capacity(PDF_DATA_URL_PREFIX.len() + b64.len());
    url.push_str(PDF_DATA_URL_PREFIX);
    url.push_str(&b64);
    url
}

/// Decode an image payload, tolerating a leading `data:<mime>;base64,` prefix.
pub(crate) fn decode_image_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let raw = match payload.split_once(";base64,") {
        Some((head, tail)) if head.starts_with("data:") => tail,
        _ => payload,
    };
    STANDARD.decode(raw.trim())
}
