//! Attachment text extraction, dispatched on content category.

mod image;
mod office;
mod pdf;

pub use image::extract_image_text;
pub use office::extract_docx_text;
pub use pdf::extract_pdf_text;

#[cfg(test)]
pub(crate) use pdf::tests::sample_pdf as pdf_fixture;

use crate::error::{IngestError, IngestResult};
use mailtriage_core::{Attachment, ContentCategory, EmailDocument, ExtractionPolicy};
use tracing::{debug, warn};

/// Extract the text of one attachment and store it on the attachment.
///
/// Extraction runs at most once per attachment; repeated calls return the
/// stored text. Under `policy`, a failure either becomes empty text or an
/// `IngestError::Extraction`.
pub fn extract_attachment(attachment: &Attachment, policy: ExtractionPolicy) -> IngestResult<&str> {
    if attachment.extracted_text().is_none() {
        let result = match attachment.category {
            ContentCategory::Pdf => extract_pdf_text(&attachment.payload),
            ContentCategory::Office => extract_docx_text(&attachment.payload),
            ContentCategory::Image => extract_image_text(&attachment.payload, &attachment.mime_type),
            ContentCategory::Other => {
                debug!(
                    "No extractor for {} ({}), using empty text",
                    attachment.display_name(),
                    attachment.mime_type
                );
                Ok(String::new())
            }
        };

        let text = match result {
            Ok(text) => text,
            Err(source) if policy.substitutes(attachment.category) => {
                warn!(
                    "Extraction failed for {} ({}), using empty text: {}",
                    attachment.display_name(),
                    attachment.category,
                    source
                );
                String::new()
            }
            Err(source) => {
                return Err(IngestError::Extraction {
                    category: attachment.category,
                    attachment: attachment.display_name().to_string(),
                    source,
                })
            }
        };

        attachment.set_extracted_text(text);
    }

    Ok(attachment.extracted_text().unwrap_or_default())
}

/// Extract every attachment of a document in order, stopping at the first failure.
pub fn extract_all(document: &EmailDocument, policy: ExtractionPolicy) -> IngestResult<()> {
    for attachment in &document.attachments {
        extract_attachment(attachment, policy)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use mailtriage_core::{Stage, NO_SUBJECT};

    fn attachment(mime: &str, payload: &[u8]) -> Attachment {
        Attachment::new(mime, payload.to_vec()).with_file_name("file")
    }

    #[test]
    fn test_pdf_failure_is_substituted_by_default() {
        let att = attachment("application/pdf", b"garbage");
        let text = extract_attachment(&att, ExtractionPolicy::Reference).unwrap();
        assert_eq!(text, "");
        assert_eq!(att.extracted_text(), Some(""));
    }

    #[test]
    fn test_office_failure_is_an_error_by_default() {
        let att = attachment(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            b"garbage",
        );
        let err = extract_attachment(&att, ExtractionPolicy::Reference).unwrap_err();
        assert_eq!(err.stage(), Stage::Extraction);
        assert!(matches!(
            err,
            IngestError::Extraction {
                category: ContentCategory::Office,
                source: ExtractError::Docx(_),
                ..
            }
        ));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(att.extracted_text(), None);
    }

    #[test]
    fn test_image_failure_is_an_error_by_default() {
        let att = attachment("image/png", b"garbage");
        let err = extract_attachment(&att, ExtractionPolicy::Reference).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Extraction {
                category: ContentCategory::Image,
                ..
            }
        ));
    }

    #[test]
    fn test_pdf_text_is_extracted() {
        let att = attachment("application/pdf", &pdf::tests::sample_pdf("Payoff statement"));
        let text = extract_attachment(&att, ExtractionPolicy::Strict).unwrap();
        assert!(text.contains("Payoff statement"));
    }

    #[test]
    fn test_other_category_is_empty() {
        let att = attachment("text/csv", b"a,b,c");
        assert_eq!(extract_attachment(&att, ExtractionPolicy::Strict).unwrap(), "");
    }

    #[test]
    fn test_policies() {
        let lenient = attachment("application/msword", b"garbage");
        assert_eq!(extract_attachment(&lenient, ExtractionPolicy::Lenient).unwrap(), "");

        let strict = attachment("application/pdf", b"garbage");
        let err = extract_attachment(&strict, ExtractionPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            IngestError::Extraction {
                category: ContentCategory::Pdf,
                ..
            }
        ));
    }

    #[test]
    fn test_docx_text_is_cached() {
        let payload = office::tests::sample_docx(&["Escrow analysis"]);
        let att = attachment("application/msword", &payload);

        assert_eq!(
            extract_attachment(&att, ExtractionPolicy::Strict).unwrap(),
            "Escrow analysis"
        );
        // The stored text wins over a second run
        assert!(!att.set_extracted_text("other".to_string()));
        assert_eq!(
            extract_attachment(&att, ExtractionPolicy::Strict).unwrap(),
            "Escrow analysis"
        );
    }

    #[test]
    fn test_extract_all_feeds_combined_text() {
        let payload = office::tests::sample_docx(&["Payoff letter"]);
        let doc = EmailDocument::new(None, Some("See attached".to_string())).with_attachments(vec![
            attachment("application/msword", &payload),
            attachment("application/pdf", b"garbage"),
        ]);

        extract_all(&doc, ExtractionPolicy::Reference).unwrap();
        assert_eq!(doc.subject, NO_SUBJECT);
        assert_eq!(doc.combined_text(), "See attached\nPayoff letter\n");
    }
}
