//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn OcrProgressCallback>`] via
//! [`crate::config::OcrConfigBuilder::progress_callback`] to receive events
//! while the OCR request is in flight and while the outputs are rendered.
//!
//! The provider reports no progress of its own. [`OcrProgressCallback::on_tick`]
//! fires on a fixed interval while the request is pending and carries a
//! cycling pseudo-percentage purely for animation; it says nothing about how
//! far along the provider is.
//!
//! # Example
//!
//! ```rust
//! use pdf_ocr2md::{OcrConfig, OcrProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct TickCounter {
//!     ticks: AtomicUsize,
//! }
//!
//! impl OcrProgressCallback for TickCounter {
//!     fn on_tick(&self, _percent: u8) {
//!         self.ticks.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(TickCounter { ticks: AtomicUsize::new(0) });
//!
//! let config = OcrConfig::builder()
//!     .progress_callback(counter as Arc<dyn OcrProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it runs.
///
/// Implementations must be `Send + Sync`. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait OcrProgressCallback: Send + Sync {
    /// Called once, just before the OCR request is dispatched.
    ///
    /// # Arguments
    /// * `pdf_bytes` — size of the submitted PDF
    fn on_request_start(&self, pdf_bytes: usize) {
        let _ = pdf_bytes;
    }

    /// Called on every tick while the request is pending.
    ///
    /// # Arguments
    /// * `percent` — decorative value in `0..100`, advancing by 3 and wrapping
    fn on_tick(&self, percent: u8) {
        let _ = percent;
    }

    /// Called when the provider answered successfully.
    ///
    /// # Arguments
    /// * `page_count` — pages in the response
    fn on_request_complete(&self, page_count: usize) {
        let _ = page_count;
    }

    /// Called when the OCR request failed.
    fn on_request_error(&self, error: &str) {
        let _ = error;
    }

    /// Called once the Markdown (and optional Word document) are ready.
    ///
    /// # Arguments
    /// * `markdown_len` — byte length of the Markdown
    /// * `docx_len`     — byte length of the Word document, if one was produced
    fn on_render_complete(&self, markdown_len: usize, docx_len: Option<usize>) {
        let _ = (markdown_len, docx_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl OcrProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::OcrConfig`].
pub type ProgressCallback = Arc<dyn OcrProgressCallback>;

/// Step of the decorative percentage per tick.
pub const TICK_STEP: u8 = 3;

/// Next decorative percentage: `(current + 3) % 100`.
pub fn next_percent(current: u8) -> u8 {
    ((u16::from(current) + u16::from(TICK_STEP)) % 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        ticks: AtomicUsize,
        pages: AtomicUsize,
        errors: Mutex<Vec<String>>,
    }

    impl OcrProgressCallback for TrackingCallback {
        fn on_tick(&self, _percent: u8) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_request_complete(&self, page_count: usize) {
            self.pages.store(page_count, Ordering::SeqCst);
        }

        fn on_request_error(&self, error: &str) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_request_start(1024);
        cb.on_tick(3);
        cb.on_request_complete(5);
        cb.on_request_error("some error");
        cb.on_render_complete(42, None);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_tick(0);
        tracker.on_tick(3);
        tracker.on_request_complete(7);
        tracker.on_request_error("HTTP 500");

        assert_eq!(tracker.ticks.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.pages.load(Ordering::SeqCst), 7);
        assert_eq!(tracker.errors.lock().unwrap().as_slice(), ["HTTP 500"]);
    }

    #[test]
    fn percent_cycles_by_three() {
        assert_eq!(next_percent(0), 3);
        assert_eq!(next_percent(96), 99);
        assert_eq!(next_percent(99), 2);
        let mut p = 0;
        for _ in 0..1000 {
            p = next_percent(p);
            assert!(p < 100);
        }
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn OcrProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_request_start(10);
        cb.on_tick(50);
        cb.on_render_complete(512, Some(2048));
    }
}
