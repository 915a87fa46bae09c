//! OCR processing using Tesseract.

use crate::error::{ProcessError, ProcessResult};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Result of OCR processing.
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// The extracted text.
    pub text: String,
}

/// Tesseract invocation settings.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Recognition language (`-l`).
    pub language: String,
    /// Page segmentation mode (`--psm`).
    pub page_segmentation: u8,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation: 1, // Automatic page segmentation with OSD
        }
    }
}

/// Perform OCR on an image file.
pub fn ocr_image(image_path: &Path, options: &OcrOptions) -> ProcessResult<OcrResult> {
    if !image_path.exists() {
        return Err(ProcessError::FileNotFound(image_path.to_path_buf()));
    }

    if which::which("tesseract").is_err() {
        return Err(ProcessError::ToolNotFound {
            tool: "tesseract".to_string(),
        });
    }

    debug!("Running OCR on {:?}", image_path);

    let output = Command::new("tesseract")
        .arg(image_path)
        .arg("stdout")
        .args(["-l", &options.language])
        .args(["--oem", "3"])
        .args(["--psm", &options.page_segmentation.to_string()])
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        // Tesseract sometimes outputs warnings to stderr but still works
        if !output.stdout.is_empty() {
            debug!("Tesseract warning: {}", stderr);
        } else {
            return Err(ProcessError::OcrError(stderr.trim().to_string()));
        }
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();

    Ok(OcrResult { text })
}

/// Perform OCR on an in-memory image, such as an email attachment.
///
/// The payload is written to a temporary file that is removed afterwards.
/// `extension` (e.g. `png`) helps tesseract's format detection.
pub fn ocr_bytes(
    payload: &[u8],
    extension: Option<&str>,
    options: &OcrOptions,
) -> ProcessResult<OcrResult> {
    if payload.is_empty() {
        return Err(ProcessError::EmptyInput);
    }

    let suffix = extension
        .map(|ext| format!(".{}", ext.trim_start_matches('.')))
        .unwrap_or_default();

    let mut file = tempfile::Builder::new()
        .prefix("mailtriage-ocr-")
        .suffix(&suffix)
        .tempfile()?;
    file.write_all(payload)?;
    file.flush()?;

    debug!("OCR on {} byte payload", payload.len());
    ocr_image(file.path(), options)
}
