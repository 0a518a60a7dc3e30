//! Rich-document rendering: ordered page results → a paginated Word package.
//!
//! The layout is written against the small [`DocumentSink`] trait so the page
//! walk (headings, line-per-paragraph text, image retry, page breaks) is
//! independent of the backend. The `docx-rs` backend lives behind the `docx`
//! feature; without it [`render_rich_document`] reports
//! [`Ocr2MdError::MissingDependency`] once and the Markdown path carries on.
//!
//! Word does not interpret Markdown, so page text is flattened: every line
//! becomes its own plain paragraph, `#`, `**` and friends included.

use crate::capability::Capabilities;
use crate::error::{EmbedError, Ocr2MdError};
use crate::output::PageResult;
use crate::pipeline::encode::decode_image_payload;
use tracing::{debug, warn};

/// English Metric Units per inch (OOXML drawing unit).
pub const EMU_PER_INCH: u32 = 914_400;

/// Width every embedded image is scaled to: 6 inches.
pub const MAX_IMAGE_WIDTH_EMU: u32 = 6 * EMU_PER_INCH;

/// Heading level used for the per-page title.
pub const PAGE_HEADING_LEVEL: u8 = 2;

/// The operations the page walk needs from a document backend.
pub trait DocumentSink {
    fn heading(&mut self, text: &str, level: u8);

    fn paragraph(&mut self, text: &str);

    /// Embed an image. With `Some(width)` the image is scaled to that width in
    /// EMU, keeping its aspect ratio; with `None` the backend picks the size.
    ///
    /// Returns [`EmbedError::Sizing`] when the requested width cannot be
    /// honoured because the native dimensions are unknown.
    fn picture(&mut self, bytes: &[u8], width_emu: Option<u32>) -> Result<(), EmbedError>;

    fn page_break(&mut self);
}

/// Per-document image bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedReport {
    /// Images placed in the document.
    pub embedded: usize,
    /// Of those, images placed by the unsized retry.
    pub unsized_fallbacks: usize,
    /// Images that could not be placed at all.
    pub skipped: usize,
}

/// A finished Word package.
#[derive(Debug, Clone)]
pub struct RichDocument {
    pub bytes: Vec<u8>,
    pub report: EmbedReport,
}

/// Walk the pages and write them into `sink`.
///
/// Never fails: image problems are logged and counted in the report.
pub fn write_pages<S: DocumentSink + ?Sized>(pages: &[PageResult], sink: &mut S) -> EmbedReport {
    let mut report = EmbedReport::default();

    for page in pages {
        let n = page.page_number();
        sink.heading(&format!("Page {n}"), PAGE_HEADING_LEVEL);

        if let Some(text) = page.text() {
            for line in split_lines(text) {
                sink.paragraph(line);
            }
        }

        for (i, image) in page.images.iter().enumerate() {
            let Some(data) = image.encoded_data() else {
                continue;
            };
            embed_image(sink, n, i + 1, data, &mut report);
        }

        sink.page_break();
    }

    report
}

/// Split on every line boundary a plain-text reader would honour: `\n`,
/// `\r\n`, a lone `\r`, vertical tab, form feed, the file/group/record
/// separators, NEL and the Unicode line and paragraph separators. A trailing
/// boundary does not produce an extra empty line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        start = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                start = j + 1;
            }
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r'
            | '\x0b'
            | '\x0c'
            | '\x1c'
            | '\x1d'
            | '\x1e'
            | '\u{85}'
            | '\u{2028}'
            | '\u{2029}'
    )
}

fn embed_image<S: DocumentSink + ?Sized>(
    sink: &mut S,
    page_num: usize,
    image_num: usize,
    data: &str,
    report: &mut EmbedReport,
) {
    let bytes = match decode_image_payload(data) {
        Ok(b) => b,
        Err(e) => {
            let err = EmbedError::Decode {
                detail: e.to_string(),
            };
            warn!("Page {page_num} image {image_num}: skipped: {err}");
            report.skipped += 1;
            return;
        }
    };

    match sink.picture(&bytes, Some(MAX_IMAGE_WIDTH_EMU)) {
        Ok(()) => report.embedded += 1,
        Err(EmbedError::Sizing { detail }) => {
            debug!("Page {page_num} image {image_num}: cannot size ({detail}), retrying unsized");
            match sink.picture(&bytes, None) {
                Ok(()) => {
                    report.embedded += 1;
                    report.unsized_fallbacks += 1;
                }
                Err(e) => {
                    warn!("Page {page_num} image {image_num}: skipped: {e}");
                    report.skipped += 1;
                }
            }
        }
        Err(e) => {
            warn!("Page {page_num} image {image_num}: skipped: {e}");
            report.skipped += 1;
        }
    }
}

/// Render the pages as a `.docx` package.
///
/// # Errors
/// [`Ocr2MdError::MissingDependency`] when the Word backend is not available
/// in this build; [`Ocr2MdError::DocumentAssembly`] if the package cannot be
/// serialised.
pub fn render_rich_document(
    pages: &[PageResult],
    capabilities: &Capabilities,
) -> Result<RichDocument, Ocr2MdError> {
    if !capabilities.rich_document {
        return Err(missing_dependency());
    }
    backend::render(pages)
}

fn missing_dependency() -> Ocr2MdError {
    Ocr2MdError::MissingDependency {
        feature: "docx".to_string(),
        hint: "Reinstall with Word support: cargo install pdf-ocr2md --features docx".to_string(),
    }
}

#[cfg(feature = "docx")]
mod backend {
    use super::{write_pages, DocumentSink, RichDocument};
    use crate::error::{EmbedError, Ocr2MdError};
    use crate::output::PageResult;
    use docx_rs::{BreakType, Docx, Paragraph, Pic, Run, Style, StyleType};
    use std::io::Cursor;
    use tracing::debug;

    /// Frame used when an image's native size cannot be read: 4:3 at 96 DPI.
    const FALLBACK_PX: (u32, u32) = (640, 480);

    pub(super) fn render(pages: &[PageResult]) -> Result<RichDocument, Ocr2MdError> {
        let mut sink = DocxSink::new();
        let report = write_pages(pages, &mut sink);
        let bytes = sink.finish()?;
        debug!(
            "Assembled docx: {} pages, {} images, {} bytes",
            pages.len(),
            report.embedded,
            bytes.len()
        );
        Ok(RichDocument { bytes, report })
    }

    /// [`DocumentSink`] collecting paragraphs for a `docx_rs::Docx`.
    #[derive(Default)]
    pub struct DocxSink {
        paragraphs: Vec<Paragraph>,
    }

    impl DocxSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serialise the collected paragraphs as a `.docx` package.
        pub fn finish(self) -> Result<Vec<u8>, Ocr2MdError> {
            let docx = self.paragraphs.into_iter().fold(
                Docx::new()
                    .add_style(heading_style(1, 32))
                    .add_style(heading_style(2, 26))
                    .add_style(heading_style(3, 24)),
                |docx, p| docx.add_paragraph(p),
            );

            let mut buf = Cursor::new(Vec::new());
            docx.build()
                .pack(&mut buf)
                .map_err(|e| Ocr2MdError::DocumentAssembly(e.to_string()))?;
            Ok(buf.into_inner())
        }

        fn push(&mut self, paragraph: Paragraph) {
            self.paragraphs.push(paragraph);
        }
    }

    fn heading_style(level: u8, half_points: usize) -> Style {
        Style::new(&format!("Heading{level}"), StyleType::Paragraph)
            .name(format!("Heading {level}"))
            .size(half_points)
            .bold()
    }

    fn native_dimensions(bytes: &[u8]) -> Result<(u32, u32), EmbedError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| EmbedError::Sizing {
                detail: e.to_string(),
            })?;
        let (w, h) = reader.into_dimensions().map_err(|e| EmbedError::Sizing {
            detail: e.to_string(),
        })?;
        if w == 0 || h == 0 {
            return Err(EmbedError::Sizing {
                detail: format!("degenerate image {w}x{h}"),
            });
        }
        Ok((w, h))
    }

    /// Height in EMU keeping the aspect ratio at `target_w`.
    fn scaled_height(w: u32, h: u32, target_w: u32) -> Result<u32, EmbedError> {
        let scaled = u64::from(h) * u64::from(target_w) / u64::from(w);
        u32::try_from(scaled).map_err(|_| EmbedError::Sizing {
            detail: format!("{w}x{h} image is too tall to scale to {target_w} EMU wide"),
        })
    }

    impl DocumentSink for DocxSink {
        fn heading(&mut self, text: &str, level: u8) {
            self.push(
                Paragraph::new()
                    .style(&format!("Heading{level}"))
                    .add_run(Run::new().add_text(text)),
            );
        }

        fn paragraph(&mut self, text: &str) {
            self.push(Paragraph::new().add_run(Run::new().add_text(text)));
        }

        fn picture(&mut self, bytes: &[u8], width_emu: Option<u32>) -> Result<(), EmbedError> {
            let pic = match width_emu {
                Some(target_w) => {
                    let (w, h) = native_dimensions(bytes)?;
                    let target_h = scaled_height(w, h, target_w)?;
                    Pic::new_with_dimensions(bytes.to_vec(), w, h).size(target_w, target_h)
                }
                None => {
                    let (w, h) = native_dimensions(bytes).unwrap_or(FALLBACK_PX);
                    Pic::new_with_dimensions(bytes.to_vec(), w, h)
                }
            };
            self.push(Paragraph::new().add_run(Run::new().add_image(pic)));
            Ok(())
        }

        fn page_break(&mut self) {
            self.push(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        }
    }
}

#[cfg(not(feature = "docx"))]
mod backend {
    use super::{missing_dependency, RichDocument};
    use crate::error::Ocr2MdError;
    use crate::output::PageResult;

    pub(super) fn render(_pages: &[PageResult]) -> Result<RichDocument, Ocr2MdError> {
        Err(missing_dependency())
    }
}

#[cfg(feature = "docx")]
pub use backend::DocxSink;
