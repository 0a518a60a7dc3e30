//! Pipeline stages for PDF OCR conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ markdown
//! (path/URL) (data URI) (HTTP)  └─▶ docx (optional)
//! ```
//!
//! 1. [`input`]    — read the local file or download the URL, check `%PDF`
//! 2. [`encode`]   — wrap the bytes in a `data:application/pdf;base64,…` URI
//! 3. [`ocr`]      — the provider call; the only stage with network I/O
//! 4. [`markdown`] — page results → Markdown with inline images
//! 5. [`docx`]     — page results → Word package, when requested and compiled in

pub mod docx;
pub mod encode;
pub mod input;
pub mod markdown;
pub mod ocr;
