//! Language-model enrichment: client, backend boundary, retry policy.

mod backend;
mod client;
mod retry;

pub use backend::{BackendError, CompletionBackend, OllamaBackend};
pub use client::{
    EnrichmentClient, EnrichmentError, DEFAULT_INSIGHTS_PROMPT, DEFAULT_KEYWORDS_PROMPT,
    DEFAULT_SUMMARY_PROMPT,
};
pub use retry::{backoff_delay, parse_retry_after};
