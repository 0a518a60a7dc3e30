//! Optional-backend detection.
//!
//! Word export depends on the `docx` cargo feature. Rather than checking for
//! it at every call site, [`Capabilities::detect`] runs once (at CLI startup,
//! or when an [`crate::config::OcrConfig`] is built) and the result travels
//! with the config to the rendering dispatch.

use serde::{Deserialize, Serialize};

/// Which optional output backends this build can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// `.docx` export is compiled in.
    pub rich_document: bool,
}

impl Capabilities {
    /// Inspect the compiled feature set.
    pub fn detect() -> Self {
        Self {
            rich_document: cfg!(feature = "docx"),
        }
    }

    /// A build with no optional backends. Useful to exercise the fallback
    /// paths in tests.
    pub fn markdown_only() -> Self {
        Self {
            rich_document: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_feature() {
        assert_eq!(Capabilities::detect().rich_document, cfg!(feature = "docx"));
        assert!(!Capabilities::markdown_only().rich_document);
    }
}
