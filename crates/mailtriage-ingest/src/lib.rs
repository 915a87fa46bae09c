//! mailtriage ingest - the email ingestion and classification pipeline.
//!
//! This crate provides:
//! - Discovery of `.eml` and `.msg` files in a source directory
//! - Container parsing into a normalized `EmailDocument`
//! - Attachment text extraction (PDF, Word documents, images)
//! - The batch pipeline that classifies every message and collects the results

mod error;
pub mod extractors;
pub mod parsers;
mod pipeline;
mod source;

pub use error::{ExtractError, IngestError, IngestResult};
pub use extractors::{extract_all, extract_attachment};
pub use parsers::{parse_source, EmlParser, MessageParser, MsgParser};
pub use pipeline::{
    aggregate, process_directory, process_directory_blocking, Pipeline, PipelineSettings,
};
pub use source::enumerate_sources;
