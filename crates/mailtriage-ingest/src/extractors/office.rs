//! Word document attachment text extraction.

use crate::error::ExtractError;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::debug;

/// Extract paragraph text from an in-memory `.docx` document.
///
/// Each paragraph becomes one line. Tables are not read.
pub fn extract_docx_text(payload: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(payload)?;

    let mut lines = Vec::new();
    for child in docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            let mut line = String::new();
            for child in paragraph.children {
                if let ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let RunChild::Text(t) = child {
                            line.push_str(&t.text);
                        }
                    }
                }
            }
            lines.push(line);
        }
    }

    let text = lines.join("\n");
    debug!("Extracted {} characters from Word document", text.len());
    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    pub(crate) fn sample_docx(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_paragraphs_become_lines() {
        let payload = sample_docx(&["Borrower: Jane Roe", "Loan number 42"]);
        let text = extract_docx_text(&payload).unwrap();
        assert_eq!(text, "Borrower: Jane Roe\nLoan number 42");
    }

    #[test]
    fn test_garbage_is_an_error() {
        let err = extract_docx_text(b"PK not really a zip").unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
        assert!(err.to_string().contains("Failed to read Word document"));
    }
}
