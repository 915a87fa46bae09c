//! PDF attachment text extraction.

use crate::error::ExtractError;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Extract text from an in-memory PDF.
///
/// `pdf-extract` panics on some malformed inputs; a panic is reported as an
/// error like any other decode failure.
pub fn extract_pdf_text(payload: &[u8]) -> Result<String, ExtractError> {
    let text = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(payload)
    }))
    .map_err(|_| ExtractError::PdfPanic)??;
    let text = clean_pdf_text(&text);

    debug!("Extracted {} characters from PDF", text.len());
    Ok(text)
}

/// Clean up extracted PDF text.
fn clean_pdf_text(text: &str) -> String {
    // Form feeds mark page breaks
    text.replace('\x0C', "\n\n---\n\n")
        .lines()
        .map(|line| line.trim())
        // Collapse runs of empty lines
        .fold(Vec::new(), |mut acc, line| {
            let last_was_empty = acc.last().map(|s: &String| s.is_empty()).unwrap_or(false);
            if !(line.is_empty() && last_was_empty) {
                acc.push(line.to_string());
            }
            acc
        })
        .join("\n")
        .trim()
        .to_string()
}
