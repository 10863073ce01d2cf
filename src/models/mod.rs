//! Core value types flowing through the processing pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported file types, resolved once from the declared type token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Doc,
    Docx,
    Jpg,
    Jpeg,
    Png,
}

impl FileType {
    /// Resolve a declared type token. Tokens are normalized (trimmed,
    /// lowercased) here and nowhere else; unknown tokens yield `None`
    /// so callers fail closed rather than guessing a strategy.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_lowercase().as_str() {
            "pdf" => Some(FileType::Pdf),
            "doc" => Some(FileType::Doc),
            "docx" => Some(FileType::Docx),
            "jpg" => Some(FileType::Jpg),
            "jpeg" => Some(FileType::Jpeg),
            "png" => Some(FileType::Png),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Doc => "doc",
            FileType::Docx => "docx",
            FileType::Jpg => "jpg",
            FileType::Jpeg => "jpeg",
            FileType::Png => "png",
        }
    }

    /// All tokens the pipeline accepts.
    pub fn supported_tokens() -> &'static [&'static str] {
        &["pdf", "doc", "docx", "jpg", "jpeg", "png"]
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document as submitted by the caller: raw bytes plus the declared
/// type token. Never retained beyond the pipeline call.
#[derive(Debug, Clone)]
pub struct RawDocument {
    bytes: Vec<u8>,
    declared_type: String,
}

impl RawDocument {
    pub fn new(bytes: Vec<u8>, declared_type: impl Into<String>) -> Self {
        Self {
            bytes,
            declared_type: declared_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn declared_type(&self) -> &str {
        &self.declared_type
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Plain text produced by a format extractor. Created exactly once per
/// document and never mutated afterward.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub format: FileType,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedText {
    pub fn new(text: String, format: FileType) -> Self {
        Self {
            text,
            format,
            extracted_at: Utc::now(),
        }
    }
}

/// The three derived views of a document. Each field is independently
/// nullable: one enrichment call failing must not block the others.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentResult {
    pub summary: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub insights: Option<String>,
}

impl EnrichmentResult {
    /// True when all three enrichment fields are present.
    pub fn is_complete(&self) -> bool {
        self.summary.is_some() && self.keywords.is_some() && self.insights.is_some()
    }
}

/// Terminal status of a pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// All three enrichment fields present.
    Completed,
    /// At least one enrichment field degraded to null.
    Partial,
    /// Extraction never produced usable text; no enrichment data at all.
    Failed,
}

/// A per-stage error descriptor surfaced in the outcome's `errors` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: String,
    pub kind: String,
    pub message: String,
}

impl StageError {
    pub fn new(
        stage: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// The terminal record returned to the caller. Constructed once by the
/// orchestrator after all stages resolve or fail; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub status: OutcomeStatus,
    pub summary: Option<String>,
    /// Ordered keyword sequence, empty when the keyword stage degraded.
    pub keywords: Vec<String>,
    pub insights: Option<String>,
    pub errors: Vec<StageError>,
    /// Source format of the extracted text, absent for the failed terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_chars: Option<usize>,
}

impl ProcessingOutcome {
    /// Assemble the terminal record from extraction metadata and the
    /// enrichment result. Status derives from field presence alone.
    pub fn assembled(
        extracted: &ExtractedText,
        enrichment: EnrichmentResult,
        errors: Vec<StageError>,
    ) -> Self {
        let status = if enrichment.is_complete() {
            OutcomeStatus::Completed
        } else {
            OutcomeStatus::Partial
        };
        Self {
            status,
            summary: enrichment.summary,
            keywords: enrichment.keywords.unwrap_or_default(),
            insights: enrichment.insights,
            errors,
            format: Some(extracted.format),
            extracted_at: Some(extracted.extracted_at),
            extracted_chars: Some(extracted.text.chars().count()),
        }
    }

    /// A failed terminal record carrying the single fatal error and no
    /// enrichment data.
    pub fn failed(error: StageError) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            summary: None,
            keywords: Vec::new(),
            insights: None,
            errors: vec![error],
            format: None,
            extracted_at: None,
            extracted_chars: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_tokens() {
        for token in FileType::supported_tokens() {
            assert!(FileType::from_token(token).is_some(), "token {}", token);
        }
        assert_eq!(FileType::from_token(" PDF "), Some(FileType::Pdf));
        assert_eq!(FileType::from_token("exe"), None);
        assert_eq!(FileType::from_token(""), None);
        assert_eq!(FileType::from_token("pdf2"), None);
    }

    #[test]
    fn test_status_from_enrichment() {
        let extracted = ExtractedText::new("hello".to_string(), FileType::Pdf);
        let full = EnrichmentResult {
            summary: Some("s".into()),
            keywords: Some(vec!["k".into()]),
            insights: Some("i".into()),
        };
        let outcome = ProcessingOutcome::assembled(&extracted, full, Vec::new());
        assert_eq!(outcome.status, OutcomeStatus::Completed);

        let degraded = EnrichmentResult {
            summary: Some("s".into()),
            keywords: None,
            insights: Some("i".into()),
        };
        let outcome = ProcessingOutcome::assembled(&extracted, degraded, Vec::new());
        assert_eq!(outcome.status, OutcomeStatus::Partial);
        assert!(outcome.keywords.is_empty());
    }

    #[test]
    fn test_outcome_serialization_shape() {
        let outcome = ProcessingOutcome::failed(StageError::new(
            "extraction",
            "extraction_failed",
            "bad bytes",
        ));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["keywords"].as_array().unwrap().len(), 0);
        assert!(json["summary"].is_null());
        assert_eq!(json["errors"][0]["stage"], "extraction");
    }
}
