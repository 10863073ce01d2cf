//! Format-specific text extraction strategies and the registry that
//! dispatches a normalized type token to one of them.

mod image;
mod pdf;
mod word;

pub use image::{ImageExtractor, OcrEngine, TesseractEngine};
pub use pdf::PdfExtractor;
pub use word::WordExtractor;

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{ExtractedText, FileType};

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A strategy converting raw bytes of a known format into plain text.
///
/// Implementations must be pure functions of the input bytes: no shared
/// mutable state, repeatable, safe to retry.
pub trait DocumentExtractor: Send + Sync {
    /// Extract plain text from `bytes`, which the caller has declared to
    /// be of `file_type`. Empty text is a valid result for image inputs.
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<ExtractedText, ExtractionError>;
}

/// Maps a declared type token to the capability-matching extraction
/// strategy. Matching is by exact normalized token; unknown tokens fail
/// closed with `UnsupportedFormat`.
pub struct ExtractorRegistry {
    extractors: HashMap<FileType, Box<dyn DocumentExtractor>>,
}

impl ExtractorRegistry {
    /// Registry wired with the standard extractors for every supported token.
    pub fn new() -> Self {
        let mut registry = Self {
            extractors: HashMap::new(),
        };
        registry.register(FileType::Pdf, Box::new(PdfExtractor::new()));
        for ty in [FileType::Doc, FileType::Docx] {
            registry.register(ty, Box::new(WordExtractor::new()));
        }
        for ty in [FileType::Jpg, FileType::Jpeg, FileType::Png] {
            registry.register(ty, Box::new(ImageExtractor::new()));
        }
        registry
    }

    /// An empty registry, for callers that wire their own strategies.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register (or replace) the strategy for a file type.
    pub fn register(&mut self, file_type: FileType, extractor: Box<dyn DocumentExtractor>) {
        self.extractors.insert(file_type, extractor);
    }

    /// Resolve the extractor for a declared type token.
    pub fn resolve(&self, token: &str) -> Result<(FileType, &dyn DocumentExtractor), ExtractionError> {
        let file_type = FileType::from_token(token)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(token.to_string()))?;
        let extractor = self
            .extractors
            .get(&file_type)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(token.to_string()))?;
        Ok((file_type, extractor.as_ref()))
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle command output, extracting stdout on success or returning the
/// appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::ExtractionFailed(format!(
                    "{}: {}",
                    error_prefix, stderr
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Report availability of the external tools used by the extractors.
pub fn check_tools() -> Vec<(String, bool)> {
    ["tesseract", "antiword"]
        .iter()
        .map(|tool| (tool.to_string(), check_binary(tool)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_resolves_all_supported_tokens() {
        let registry = ExtractorRegistry::new();
        for token in FileType::supported_tokens() {
            let (file_type, _) = registry.resolve(token).unwrap();
            assert_eq!(file_type.as_str(), *token);
        }
    }

    #[test]
    fn test_registry_fails_closed_on_unknown_tokens() {
        let registry = ExtractorRegistry::new();
        for token in ["exe", "txt", "html", "", "pdx", "docm"] {
            match registry.resolve(token) {
                Err(ExtractionError::UnsupportedFormat(t)) => assert_eq!(t, token),
                other => panic!("expected UnsupportedFormat for {:?}, got {:?}", token, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_registry_normalizes_tokens() {
        let registry = ExtractorRegistry::new();
        assert!(registry.resolve("PDF").is_ok());
        assert!(registry.resolve(" jpeg ").is_ok());
    }

    #[test]
    fn test_empty_registry_has_no_defaults() {
        let registry = ExtractorRegistry::empty();
        assert!(matches!(
            registry.resolve("pdf"),
            Err(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_check_tools() {
        let tools = check_tools();
        assert_eq!(tools.len(), 2);
    }
}
