//! Explicit per-session result holder.
//!
//! An interactive front-end keeps the last successful conversion around so it
//! can re-offer the downloads. [`Session`] makes that state explicit: created
//! empty, cleared when a new run starts, populated when a run succeeds. A
//! failed run therefore leaves the session empty rather than showing stale
//! results from an earlier document.

use crate::output::{Artifact, ConversionOutput, RichDocumentOutcome};

/// Results retained from the last successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub markdown: String,
    pub docx: Option<Vec<u8>>,
}

impl SessionResult {
    pub fn artifacts(&self) -> Vec<Artifact> {
        let mut out = vec![Artifact::markdown(&self.markdown)];
        if let Some(ref bytes) = self.docx {
            out.push(Artifact::docx(bytes.clone()));
        }
        out
    }
}

/// One user's session.
#[derive(Debug, Default)]
pub struct Session {
    result: Option<SessionResult>,
    runs: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run: drops whatever the previous run left behind.
    pub fn begin_run(&mut self) {
        self.result = None;
        self.runs += 1;
    }

    /// Record a successful conversion.
    pub fn store(&mut self, output: &ConversionOutput) {
        let docx = match &output.rich_document {
            RichDocumentOutcome::Rendered(bytes) => Some(bytes.clone()),
            _ => None,
        };
        self.result = Some(SessionResult {
            markdown: output.markdown.clone(),
            docx,
        });
    }

    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_none()
    }

    /// Number of runs started in this session.
    pub fn runs(&self) -> u64 {
        self.runs
    }
}
