//! Configuration for the enrichment client and pipeline.

use serde::{Deserialize, Serialize};

/// Configuration for the enrichment client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Backend API endpoint (default: http://localhost:11434)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model to use for enrichment
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum tokens in a backend response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of extracted text sent per request; longer
    /// inputs are truncated at a UTF-8 boundary rather than rejected
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Number of keywords requested from the model
    #[serde(default = "default_keyword_count")]
    pub keyword_count: usize,
    /// Number of insight observations requested from the model
    #[serde(default = "default_insight_count")]
    pub insight_count: usize,
    /// Overall per-operation timeout in seconds; exceeding it degrades
    /// the field with no further retries
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
    /// Maximum retries per operation on transient backend failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff between retries
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    /// Custom prompt for summaries (uses the {content} placeholder)
    #[serde(default)]
    pub summary_prompt: Option<String>,
    /// Custom prompt for keywords (uses {count} and {content})
    #[serde(default)]
    pub keywords_prompt: Option<String>,
    /// Custom prompt for insights (uses {count} and {content})
    #[serde(default)]
    pub insights_prompt: Option<String>,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3.2:instruct".to_string()
}
fn default_max_tokens() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_content_chars() -> usize {
    12000
}
fn default_keyword_count() -> usize {
    5
}
fn default_insight_count() -> usize {
    3
}
fn default_operation_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_base_ms() -> u64 {
    500
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            keyword_count: default_keyword_count(),
            insight_count: default_insight_count(),
            operation_timeout_secs: default_operation_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            summary_prompt: None,
            keywords_prompt: None,
            insights_prompt: None,
        }
    }
}

impl EnrichmentConfig {
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_operation_timeout_secs(mut self, secs: u64) -> Self {
        self.operation_timeout_secs = secs;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff_base_ms(mut self, base_ms: u64) -> Self {
        self.backoff_base_ms = base_ms;
        self
    }
}
