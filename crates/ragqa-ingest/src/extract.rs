//! Document text extraction.

use std::path::Path;

use tracing::debug;

use ragqa_core::{Error, Result};

/// Supported document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    PlainText,
    Pdf,
}

impl FileType {
    /// Detect file type from extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect file type from a path or bare filename.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "{} (only .pdf and .txt are accepted)",
                    path.display()
                ))
            })
    }
}

/// Path → raw text.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Reads `.txt` files as UTF-8 (invalid sequences replaced) and pulls the
/// text layer out of `.pdf` files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;

impl Extractor for FileExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        match FileType::from_path(path)? {
            FileType::PlainText => {
                let bytes = std::fs::read(path)?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            FileType::Pdf => {
                let text = pdf_extract::extract_text(path).map_err(|e| {
                    Error::Ingest(format!("PDF extraction failed for {}: {}", path.display(), e))
                })?;
                debug!("Extracted {} chars from {}", text.len(), path.display());
                Ok(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_extension("txt"), Some(FileType::PlainText));
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("docx"), None);
        assert!(FileType::from_path(Path::new("notes.md")).is_err());
        assert!(FileType::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_extract_plain_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello\nworld").unwrap();
        assert_eq!(FileExtractor.extract(&path).unwrap(), "hello\nworld");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.txt");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();
        assert_eq!(FileExtractor.extract(&path).unwrap(), "caf\u{FFFD}");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slides.pptx");
        std::fs::write(&path, "irrelevant").unwrap();
        let err = FileExtractor.extract(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}
