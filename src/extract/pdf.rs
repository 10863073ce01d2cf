//! PDF text extraction from in-memory bytes.

use tracing::debug;

use super::{DocumentExtractor, ExtractionError};
use crate::models::{ExtractedText, FileType};

/// Extracts embedded text from a PDF byte stream.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<ExtractedText, ExtractionError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::ExtractionFailed(format!("pdf parse: {}", e)))?;
        debug!("pdf extraction produced {} chars", text.chars().count());
        Ok(ExtractedText::new(text, file_type))
    }
}
