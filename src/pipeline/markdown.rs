//! Markdown rendering: ordered page results → one Markdown document.
//!
//! Each page becomes a fragment opening with a horizontal rule and a
//! `### Page N` heading, followed by the provider's Markdown verbatim and the
//! page's images embedded inline as `data:image/png;base64,…` URIs. Fragments
//! are joined with a newline and the result is trimmed, so the document
//! starts at the first rule and carries no trailing blank lines.
//!
//! Pages are emitted in input order; no sorting happens here.

use crate::output::PageResult;

/// MIME type assumed for every extracted image. The provider does not report
/// one; PNG renders for the vast majority of extracted images.
pub const IMAGE_MIME: &str = "image/png";

/// Render the page sequence to Markdown.
///
/// Pure and deterministic: the same input always yields byte-identical output.
pub fn render_markdown(pages: &[PageResult]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(pages.len() * 2);

    for page in pages {
        let n = page.page_number();
        parts.push(format!("\n\n---\n\n### Page {n}\n\n"));

        if let Some(text) = page.text() {
            parts.push(text.to_string());
        }

        if !page.images.is_empty() {
            parts.push("\n\n#### Extracted images\n".to_string());
            // Numbering follows the image's position on the page, skipped
            // entries included.
            for (i, image) in page.images.iter().enumerate() {
                if let Some(data) = image.encoded_data() {
                    parts.push(image_embed(n, i + 1, data));
                }
            }
        }
    }

    parts.join("\n").trim().to_string()
}

fn image_embed(page_num: usize, image_num: usize, data: &str) -> String {
    format!("\n![page {page_num} image {image_num}](data:{IMAGE_MIME};base64,{data})\n")
}
