//! Outlook `.msg` parser.
//!
//! A `.msg` file is an OLE compound file. Message properties live in
//! `__substg1.0_<tag><type>` streams, where the type suffix is `001F` for
//! UTF-16LE strings, `001E` for 8-bit strings and `0102` for binary data.
//! Each attachment is a `__attach_version1.0_#NNNNNNNN` storage holding its
//! own property streams.

use super::{parse_error, MessageParser};
use crate::error::IngestResult;
use cfb::CompoundFile;
use encoding_rs::WINDOWS_1252;
use mailtriage_core::{Attachment, EmailDocument};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::{debug, warn};

const SUBJECT: &str = "0037";
const BODY: &str = "1000";
const ATTACH_DATA: &str = "37010102";
const ATTACH_MIME: &str = "370E";
const ATTACH_LONG_NAME: &str = "3707";
const ATTACH_SHORT_NAME: &str = "3704";
const ATTACH_PREFIX: &str = "__attach_version1.0_";
const PROPERTIES: &str = "__properties_version1.0";
const PROPERTY_PREFIX: &str = "__substg1.0_";

/// Parser for `.msg` files.
pub struct MsgParser;

impl MsgParser {
    /// Create a new MSG parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a message already held in memory.
    pub fn parse_bytes(&self, path: &Path, raw: Vec<u8>) -> IngestResult<EmailDocument> {
        let mut file = CompoundFile::open(Cursor::new(raw))
            .map_err(|e| parse_error(path, format!("Failed to parse MSG file: {}", e)))?;

        let root: Vec<(String, String, bool)> = file
            .read_storage("/")
            .map_err(|e| parse_error(path, format!("Failed to read MSG root storage: {}", e)))?
            .map(|e| {
                (
                    e.name().to_string(),
                    e.path().to_string_lossy().to_string(),
                    e.is_storage(),
                )
            })
            .collect();

        let has_properties = root.iter().any(|(name, _, is_storage)| {
            !is_storage && (name == PROPERTIES || name.starts_with(PROPERTY_PREFIX))
        });
        if !has_properties {
            return Err(parse_error(
                path,
                "Failed to parse MSG file: no message property storage",
            ));
        }

        let subject = read_string(&mut file, "/", SUBJECT);
        let body = read_string(&mut file, "/", BODY);

        let storages: Vec<String> = root
            .into_iter()
            .filter(|(name, _, is_storage)| *is_storage && name.starts_with(ATTACH_PREFIX))
            .map(|(_, path, _)| path)
            .collect();

        let mut attachments = Vec::with_capacity(storages.len());
        for storage in storages {
            match read_attachment(&mut file, &storage) {
                Some(attachment) => attachments.push(attachment),
                None => warn!("Skipping attachment without data: {}", storage),
            }
        }

        debug!(
            "Parsed MSG {:?}: {} attachment(s)",
            path.file_name().unwrap_or_default(),
            attachments.len()
        );

        Ok(EmailDocument::new(subject, body).with_attachments(attachments))
    }
}

impl Default for MsgParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageParser for MsgParser {
    fn parse(&self, path: &Path) -> IngestResult<EmailDocument> {
        let raw = std::fs::read(path)?;
        self.parse_bytes(path, raw)
    }

    fn extensions(&self) -> &[&str] {
        &["msg"]
    }
}

fn read_attachment<F: Read + Seek>(file: &mut CompoundFile<F>, storage: &str) -> Option<Attachment> {
    let payload = read_stream(file, &property_path(storage, ATTACH_DATA))?;

    let file_name = read_string(file, storage, ATTACH_LONG_NAME)
        .or_else(|| read_string(file, storage, ATTACH_SHORT_NAME));

    let mime_type = read_string(file, storage, ATTACH_MIME)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            file_name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first_raw())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let attachment = Attachment::new(mime_type, payload);
    Some(match file_name {
        Some(name) => attachment.with_file_name(name),
        None => attachment,
    })
}

/// Read a string property, preferring the UTF-16 stream over the 8-bit one.
fn read_string<F: Read + Seek>(
    file: &mut CompoundFile<F>,
    storage: &str,
    tag: &str,
) -> Option<String> {
    if let Some(bytes) = read_stream(file, &property_path(storage, &format!("{tag}001F"))) {
        return Some(decode_utf16(&bytes));
    }
    read_stream(file, &property_path(storage, &format!("{tag}001E"))).map(|bytes| {
        let (text, _, _) = WINDOWS_1252.decode(&bytes);
        text.trim_end_matches('\0').to_string()
    })
}

fn read_stream<F: Read + Seek>(file: &mut CompoundFile<F>, path: &str) -> Option<Vec<u8>> {
    if !file.is_stream(path) {
        return None;
    }
    let mut stream = file.open_stream(path).ok()?;
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).ok()?;
    Some(buf)
}

fn property_path(storage: &str, property: &str) -> String {
    format!("{}/{}{}", storage.trim_end_matches('/'), PROPERTY_PREFIX, property)
}

fn decode_utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}
