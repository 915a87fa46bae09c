//! Error types for the ingestion pipeline.

use mailtriage_core::{ContentCategory, Stage};
use mailtriage_llm::LlmError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] mailtriage_config::ConfigError),

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Parse error for {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Extraction error ({category}) for attachment {attachment}: {source}")]
    Extraction {
        category: ContentCategory,
        attachment: String,
        #[source]
        source: ExtractError,
    },

    #[error("Classification error: {0}")]
    Classification(#[from] LlmError),

    #[error("Aggregation error: {0}")]
    Aggregation(String),

    #[error("Processing {path} timed out after {seconds} seconds")]
    Timeout { path: PathBuf, seconds: u64 },

    #[error("Worker task failed: {0}")]
    Task(String),
}

/// Errors from turning one attachment payload into text.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to extract text from PDF: {0}")]
    Pdf(#[from] pdf_extract::OutputError),

    #[error("PDF decoder panicked")]
    PdfPanic,

    #[error("Failed to read Word document: {0}")]
    Docx(#[from] docx_rs::ReaderError),

    #[error("Text recognition failed: {0}")]
    Ocr(#[from] mailtriage_process::ProcessError),
}

impl IngestError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            IngestError::Parse { .. } | IngestError::UnsupportedFileType(_) => Stage::Parse,
            IngestError::Extraction { .. } => Stage::Extraction,
            IngestError::Classification(_) => Stage::Classification,
            IngestError::Aggregation(_) => Stage::Aggregation,
            IngestError::Timeout { .. } => Stage::Timeout,
            IngestError::Io(_)
            | IngestError::Config(_)
            | IngestError::SourceNotFound(_)
            | IngestError::Task(_) => Stage::Internal,
        }
    }
}
