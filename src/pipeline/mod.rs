//! Pipeline orchestrator: extraction then enrichment, with a two-tier
//! failure policy.
//!
//! Each invocation walks Received → Extracting → Enriching → Assembled,
//! with Failed reachable only while extracting. Extraction failure means
//! there is no usable content at all and short-circuits; an enrichment
//! failure only degrades its own field. The three enrichment operations
//! run concurrently and are all awaited before assembly, so one slow or
//! failing call never aborts the others. Dropping the returned future
//! cancels the in-flight enrichment calls with it.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::extract::{ExtractionError, ExtractorRegistry};
use crate::llm::{EnrichmentClient, EnrichmentError};
use crate::models::{EnrichmentResult, ProcessingOutcome, RawDocument, StageError};

/// Fatal errors that reach the caller as a single structured error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),
}

impl PipelineError {
    /// Stable kind tag for serialized error descriptors.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::UnsupportedFormat(_) => "unsupported_format",
            PipelineError::ExtractionFailed(_) => "extraction_failed",
        }
    }

    /// Stage name for serialized error descriptors.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "input",
            _ => "extraction",
        }
    }

    /// Descriptor for a failed terminal outcome record.
    pub fn to_stage_error(&self) -> StageError {
        StageError::new(self.stage(), self.kind(), self.to_string())
    }
}

impl From<ExtractionError> for PipelineError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFormat(token) => PipelineError::UnsupportedFormat(token),
            other => PipelineError::ExtractionFailed(other.to_string()),
        }
    }
}

/// Orchestrates one document through extraction and enrichment.
///
/// Stateless between invocations; concurrent calls share nothing but the
/// enrichment client's outbound connection pool.
pub struct Pipeline {
    registry: ExtractorRegistry,
    client: EnrichmentClient,
}

impl Pipeline {
    pub fn new(registry: ExtractorRegistry, client: EnrichmentClient) -> Self {
        Self { registry, client }
    }

    /// Process one document to its terminal outcome.
    ///
    /// Fatal errors (invalid input, unsupported format, extraction
    /// failure) surface as `Err`; enrichment failures degrade fields and
    /// are reported in the outcome's `errors` list with `status: partial`.
    pub async fn process(&self, doc: &RawDocument) -> Result<ProcessingOutcome, PipelineError> {
        // Received: reject empty payloads before touching any extractor.
        if doc.size() == 0 {
            return Err(PipelineError::InvalidInput(
                "empty byte payload".to_string(),
            ));
        }

        // Received -> Extracting: resolve the strategy for the declared
        // token, failing closed on unknown tokens.
        let (file_type, extractor) = self.registry.resolve(doc.declared_type())?;
        debug!("extracting {} document ({} bytes)", file_type, doc.size());
        let extracted = extractor.extract(doc.bytes(), file_type)?;

        // Extracting -> Enriching: fan out the three independent
        // operations and join on all of them. Enrichment never produces
        // the failed terminal.
        let text = &extracted.text;
        let (summary, keywords, insights) = tokio::join!(
            self.client.summarize(text),
            self.client.extract_keywords(text),
            self.client.derive_insights(text),
        );

        let mut enrichment = EnrichmentResult::default();
        let mut errors = Vec::new();
        enrichment.summary = Self::settle("summary", summary, &mut errors);
        enrichment.keywords = Self::settle("keywords", keywords, &mut errors);
        enrichment.insights = Self::settle("insights", insights, &mut errors);

        // Enriching -> Assembled.
        let outcome = ProcessingOutcome::assembled(&extracted, enrichment, errors);
        info!(
            "processed {} document: status {:?}, {} error(s)",
            file_type,
            outcome.status,
            outcome.errors.len()
        );
        Ok(outcome)
    }

    /// Fold one enrichment result into its field, recording a degraded
    /// field's error descriptor.
    fn settle<T>(
        stage: &str,
        result: Result<T, EnrichmentError>,
        errors: &mut Vec<StageError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{} enrichment degraded: {}", stage, e);
                errors.push(StageError::new(stage, e.kind(), e.to_string()));
                None
            }
        }
    }
}
