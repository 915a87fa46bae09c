//! Discovery of message files in the source directory.

use crate::error::{IngestError, IngestResult};
use mailtriage_core::{ContainerFormat, SourceFile};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// List the `.eml` and `.msg` files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not searched and hidden files are skipped.
pub fn enumerate_sources(dir: &Path) -> IngestResult<Vec<SourceFile>> {
    if !dir.is_dir() {
        return Err(IngestError::SourceNotFound(dir.to_path_buf()));
    }

    let mut sources = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        match ContainerFormat::from_path(path) {
            Some(format) => sources.push(SourceFile::new(path, format)),
            None => debug!("Skipping unsupported file: {:?}", path),
        }
    }

    debug!("Found {} message files in {:?}", sources.len(), dir);
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_directory() {
        let dir = tempdir().unwrap();
        let sources = enumerate_sources(dir.path()).unwrap();
        assert!(sources.is_empty());
    }

    #[test]
    fn test_filters_and_orders() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.msg"), b"x").unwrap();
        std::fs::write(dir.path().join("a.eml"), b"x").unwrap();
        std::fs::write(dir.path().join("C.EML"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join(".hidden.eml"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("d.eml"), b"x").unwrap();

        let sources = enumerate_sources(dir.path()).unwrap();
        let names: Vec<String> = sources.iter().map(|s| s.file_name()).collect();

        assert_eq!(names, vec!["C.EML", "a.eml", "b.msg"]);
        assert_eq!(sources[0].format, ContainerFormat::Eml);
        assert_eq!(sources[2].format, ContainerFormat::Msg);
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempdir().unwrap();
        let result = enumerate_sources(&dir.path().join("missing"));
        assert!(matches!(result, Err(IngestError::SourceNotFound(_))));
    }
}
