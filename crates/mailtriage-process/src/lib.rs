//! mailtriage process - text recognition for image attachments.
//!
//! OCR relies on the `tesseract` CLI being installed on the system.

mod error;
mod ocr;

pub use error::{ProcessError, ProcessResult};
pub use ocr::{ocr_bytes, ocr_image, OcrOptions, OcrResult};

/// Check if required external tools are available.
pub fn check_dependencies() -> Vec<(&'static str, bool)> {
    vec![("tesseract", which::which("tesseract").is_ok())]
}

/// Check if all required tools are installed.
pub fn all_tools_available() -> bool {
    check_dependencies().iter().all(|(_, available)| *available)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dependencies_lists_tesseract() {
        let deps = check_dependencies();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].0, "tesseract");
        assert_eq!(all_tools_available(), deps[0].1);
    }
}
