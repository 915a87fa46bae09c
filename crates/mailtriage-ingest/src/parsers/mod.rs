//! Message parsers for the supported container formats.

mod eml;
mod msg;

pub use eml::EmlParser;
pub use msg::MsgParser;

#[cfg(test)]
pub(crate) use msg::tests::sample_msg as msg_fixture;

use crate::error::IngestResult;
use mailtriage_core::{ContainerFormat, EmailDocument, SourceFile};
use std::path::Path;

/// Trait for message container parsers.
pub trait MessageParser: Send + Sync {
    /// Parse the message file at the given path.
    fn parse(&self, path: &Path) -> IngestResult<EmailDocument>;

    /// Get the supported file extensions.
    fn extensions(&self) -> &[&str];

    /// Check if this parser supports the given extension.
    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Get the parser for a container format.
pub fn get_parser(format: ContainerFormat) -> Box<dyn MessageParser> {
    match format {
        ContainerFormat::Eml => Box::new(EmlParser::new()),
        ContainerFormat::Msg => Box::new(MsgParser::new()),
    }
}

/// Parse a source file with the parser its extension selected.
pub fn parse_source(source: &SourceFile) -> IngestResult<EmailDocument> {
    get_parser(source.format).parse(&source.path)
}

/// Build a parse error for `path`.
pub(crate) fn parse_error(path: &Path, message: impl Into<String>) -> crate::IngestError {
    crate::IngestError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
