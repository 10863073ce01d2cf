//! Image text extraction via OCR.
//!
//! OCR itself is delegated to an engine behind a trait; the default
//! engine shells out to Tesseract. An image with no recognizable text
//! yields empty text, which is a valid low-value result, not a failure.

use std::io::Write;
use std::process::Command;

use tracing::debug;

use super::{handle_cmd_output, DocumentExtractor, ExtractionError};
use crate::models::{ExtractedText, FileType};

/// A text-recognition engine for raster images.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in the given image bytes. Returns empty text when
    /// nothing recognizable is found.
    fn recognize(&self, bytes: &[u8], file_type: FileType) -> Result<String, ExtractionError>;
}

/// OCR engine backed by the `tesseract` command-line tool.
pub struct TesseractEngine {
    /// Tesseract language setting.
    language: String,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            language: "eng".to_string(),
        }
    }

    /// Set the Tesseract language.
    pub fn with_language(mut self, lang: &str) -> Self {
        self.language = lang.to_string();
        self
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, bytes: &[u8], file_type: FileType) -> Result<String, ExtractionError> {
        // Tesseract reads from a file, so stage the bytes in a tempfile
        // with the right extension.
        let suffix = format!(".{}", file_type.as_str());
        let mut file = tempfile::Builder::new().suffix(&suffix).tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        let output = Command::new("tesseract")
            .arg(file.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .output();

        handle_cmd_output(output, "tesseract (install tesseract-ocr)", "tesseract failed")
    }
}

/// Extracts text from image bytes through an OCR engine.
pub struct ImageExtractor {
    engine: Box<dyn OcrEngine>,
}

impl ImageExtractor {
    /// Image extractor using the default Tesseract engine.
    pub fn new() -> Self {
        Self {
            engine: Box::new(TesseractEngine::new()),
        }
    }

    /// Image extractor using a custom OCR engine.
    pub fn with_engine(engine: Box<dyn OcrEngine>) -> Self {
        Self { engine }
    }
}

impl Default for ImageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for ImageExtractor {
    fn extract(&self, bytes: &[u8], file_type: FileType) -> Result<ExtractedText, ExtractionError> {
        let text = self.engine.recognize(bytes, file_type)?;
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            debug!("ocr found no recognizable text");
        }
        Ok(ExtractedText::new(trimmed, file_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEngine(&'static str);

    impl OcrEngine for FixedEngine {
        fn recognize(&self, _bytes: &[u8], _file_type: FileType) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_empty_recognition_is_valid() {
        let extractor = ImageExtractor::with_engine(Box::new(FixedEngine("  \n ")));
        let result = extractor.extract(&[0xFF, 0xD8], FileType::Jpg).unwrap();
        assert!(result.text.is_empty());
        assert_eq!(result.format, FileType::Jpg);
    }

    #[test]
    fn test_recognized_text_is_trimmed() {
        let extractor = ImageExtractor::with_engine(Box::new(FixedEngine(" receipt total 12.50 \n")));
        let result = extractor.extract(&[0x89, 0x50], FileType::Png).unwrap();
        assert_eq!(result.text, "receipt total 12.50");
    }
}
