//! Image attachment text recognition.

use crate::error::ExtractError;
use mailtriage_process::{ocr_bytes, OcrOptions};

/// Recognize text in an image payload with tesseract.
///
/// `mime_type` supplies the temp file extension so tesseract can detect the format.
pub fn extract_image_text(payload: &[u8], mime_type: &str) -> Result<String, ExtractError> {
    let extension = mime_type
        .split_once('/')
        .map(|(_, sub)| sub.split(';').next().unwrap_or(sub).trim());

    Ok(ocr_bytes(payload, extension, &OcrOptions::default())?.text)
}
