//! Raw RFC 5322 message parser.

use super::{parse_error, MessageParser};
use crate::error::IngestResult;
use mail_parser::{MimeHeaders, MessageParser as MimeParser};
use mailtriage_core::{Attachment, EmailDocument};
use std::path::Path;
use tracing::debug;

/// Parser for `.eml` files.
pub struct EmlParser;

impl EmlParser {
    /// Create a new EML parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a message already held in memory.
    pub fn parse_bytes(&self, path: &Path, raw: &[u8]) -> IngestResult<EmailDocument> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(parse_error(path, "Failed to parse EML file: message is empty"));
        }

        let message = MimeParser::default().parse(raw).ok_or_else(|| {
            parse_error(path, "Failed to parse EML file: no message headers found")
        })?;

        let subject = message.subject().map(str::to_string);
        let body = message
            .body_text(0)
            .map(|s| s.into_owned())
            .or_else(|| message.body_html(0).map(|s| s.into_owned()));

        let attachments: Vec<Attachment> = message
            .attachments()
            .enumerate()
            .map(|(idx, part)| {
                let mime_type = part
                    .content_type()
                    .map(|ct| match ct.subtype() {
                        Some(sub) => format!("{}/{}", ct.ctype(), sub),
                        None => ct.ctype().to_string(),
                    })
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let name = part
                    .attachment_name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("attachment_{idx}"));

                Attachment::new(mime_type, part.contents().to_vec()).with_file_name(name)
            })
            .collect();

        debug!(
            "Parsed EML {:?}: {} attachment(s)",
            path.file_name().unwrap_or_default(),
            attachments.len()
        );

        Ok(EmailDocument::new(subject, body).with_attachments(attachments))
    }
}

impl Default for EmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageParser for EmlParser {
    fn parse(&self, path: &Path) -> IngestResult<EmailDocument> {
        let raw = std::fs::read(path)?;
        self.parse_bytes(path, &raw)
    }

    fn extensions(&self) -> &[&str] {
        &["eml"]
    }
}
