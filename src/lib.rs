//! docsift - document text extraction and AI enrichment pipeline.
//!
//! Accepts raw document bytes with a declared type token, extracts plain
//! text through a format-specific strategy, and derives a summary,
//! keywords, and insights from it via a language-model backend. Fatal
//! failures stop at extraction; enrichment failures degrade individual
//! fields of the outcome instead of aborting it.

pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod pipeline;

pub use config::EnrichmentConfig;
pub use extract::{DocumentExtractor, ExtractionError, ExtractorRegistry};
pub use llm::{BackendError, CompletionBackend, EnrichmentClient, EnrichmentError, OllamaBackend};
pub use models::{
    EnrichmentResult, ExtractedText, FileType, OutcomeStatus, ProcessingOutcome, RawDocument,
    StageError,
};
pub use pipeline::{Pipeline, PipelineError};
