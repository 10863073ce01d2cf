//! Enrichment client deriving summary, keywords, and insights from
//! extracted text via a language-model backend.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use super::backend::{BackendError, CompletionBackend};
use super::retry::backoff_delay;
use crate::config::EnrichmentConfig;

/// Default prompt for summarizing extracted document text.
pub const DEFAULT_SUMMARY_PROMPT: &str = r#"You are summarizing the text content extracted from an uploaded document.

Write a concise synopsis that answers:
1. What is this document ABOUT?
2. What are the KEY FACTS it states? (amounts, dates, names, decisions)

Document Content:
{content}

Respond with ONLY a 2-3 sentence synopsis. No formatting or preamble."#;

/// Default prompt for extracting salient keywords.
pub const DEFAULT_KEYWORDS_PROMPT: &str = r#"You are extracting search keywords from the text content of an uploaded document. Read the ENTIRE text before answering.

Pick the {count} most salient terms: the main subject matter, key entities or people, and notable amounts or dates. Be specific rather than generic.

Document Content:
{content}

Respond with ONLY {count} comma-separated keywords. Example: invoice, acme corp, web hosting, net-30, january 2024"#;

/// Default prompt for deriving short insights.
pub const DEFAULT_INSIGHTS_PROMPT: &str = r#"You are deriving insights from the text content of an uploaded document.

Write {count} short observations that go beyond restating the text: what kind of document this is, what it implies, and anything unusual or noteworthy.

Document Content:
{content}

Respond with ONLY {count} observations, one per line. No numbering, headers, or preamble."#;

/// Errors from a single enrichment operation. Both variants are
/// non-fatal to the pipeline: the affected field degrades to null.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Operation exceeded its {0:?} budget")]
    Timeout(Duration),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EnrichmentError {
    /// Stable kind tag for the outcome's error descriptors.
    pub fn kind(&self) -> &'static str {
        match self {
            EnrichmentError::Timeout(_) | EnrichmentError::Backend(BackendError::Timeout) => {
                "enrichment_timeout"
            }
            EnrichmentError::Backend(_) => "enrichment_backend_error",
        }
    }
}

/// Client issuing independent enrichment requests against extracted text.
///
/// Each operation truncates its input to the configured content budget,
/// retries transient backend failures with bounded exponential backoff,
/// and is bounded overall by the per-operation timeout.
pub struct EnrichmentClient {
    config: EnrichmentConfig,
    backend: Arc<dyn CompletionBackend>,
}

impl EnrichmentClient {
    pub fn new(config: EnrichmentConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &EnrichmentConfig {
        &self.config
    }

    /// Generate a concise synopsis of the text.
    pub async fn summarize(&self, text: &str) -> Result<String, EnrichmentError> {
        let prompt = self
            .config
            .summary_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SUMMARY_PROMPT)
            .replace("{content}", self.truncate_content(text));

        debug!("requesting summary");
        let response = self.complete_with_retry(&prompt).await?;
        let summary = response.trim().to_string();
        if summary.is_empty() {
            return Err(BackendError::Parse("empty summary response".to_string()).into());
        }
        Ok(summary)
    }

    /// Extract the configured number of salient keywords, deduplicated
    /// case-insensitively, in model output order.
    pub async fn extract_keywords(&self, text: &str) -> Result<Vec<String>, EnrichmentError> {
        let prompt = self
            .config
            .keywords_prompt
            .as_deref()
            .unwrap_or(DEFAULT_KEYWORDS_PROMPT)
            .replace("{count}", &self.config.keyword_count.to_string())
            .replace("{content}", self.truncate_content(text));

        debug!("requesting keywords");
        let response = self.complete_with_retry(&prompt).await?;
        let keywords = self.parse_keywords(&response);
        if keywords.is_empty() {
            return Err(BackendError::Parse("no keywords parsed from response".to_string()).into());
        }
        Ok(keywords)
    }

    /// Derive a fixed small count of short observations about the text.
    pub async fn derive_insights(&self, text: &str) -> Result<String, EnrichmentError> {
        let prompt = self
            .config
            .insights_prompt
            .as_deref()
            .unwrap_or(DEFAULT_INSIGHTS_PROMPT)
            .replace("{count}", &self.config.insight_count.to_string())
            .replace("{content}", self.truncate_content(text));

        debug!("requesting insights");
        let response = self.complete_with_retry(&prompt).await?;
        let insights = response.trim().to_string();
        if insights.is_empty() {
            return Err(BackendError::Parse("empty insights response".to_string()).into());
        }
        Ok(insights)
    }

    /// Issue one completion, retrying transient failures with bounded
    /// exponential backoff, all within the per-operation time budget.
    async fn complete_with_retry(&self, prompt: &str) -> Result<String, EnrichmentError> {
        let budget = Duration::from_secs(self.config.operation_timeout_secs);
        let attempts = async {
            let mut attempt = 0u32;
            loop {
                match self.backend.complete(prompt).await {
                    Ok(response) => return Ok(response),
                    Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                        let wait = e
                            .retry_after_secs()
                            .map(|s| Duration::from_secs(s.min(60)))
                            .unwrap_or_else(|| {
                                backoff_delay(attempt, self.config.backoff_base_ms)
                            });
                        warn!(
                            "transient backend failure (attempt {}): {}, retrying in {:?}",
                            attempt + 1,
                            e,
                            wait
                        );
                        tokio::time::sleep(wait).await;
                        attempt += 1;
                    }
                    Err(e) => return Err(EnrichmentError::Backend(e)),
                }
            }
        };

        match tokio::time::timeout(budget, attempts).await {
            Ok(result) => result,
            Err(_) => Err(EnrichmentError::Timeout(budget)),
        }
    }

    /// Truncate content to the configured maximum (UTF-8 safe).
    fn truncate_content<'a>(&self, text: &'a str) -> &'a str {
        if text.len() <= self.config.max_content_chars {
            return text;
        }
        let mut end = self.config.max_content_chars;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }

    /// Parse keywords from the model response: comma-separated, trimmed
    /// of stray punctuation, deduplicated case-insensitively with the
    /// model's output order preserved.
    fn parse_keywords(&self, response: &str) -> Vec<String> {
        let cleaned = response
            .trim()
            .trim_start_matches("Keywords:")
            .trim_start_matches("KEYWORDS:")
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim();

        let mut seen = std::collections::HashSet::new();
        cleaned
            .split(',')
            .map(|t| {
                t.trim()
                    .trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
                    .to_string()
            })
            .filter(|t| !t.is_empty() && t.len() <= 50)
            .filter(|t| seen.insert(t.to_lowercase()))
            .take(self.config.keyword_count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedBackend {
        calls: AtomicUsize,
        responses: Vec<Result<String, BackendError>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, BackendError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                responses,
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(n) {
                Some(Ok(s)) => Ok(s.clone()),
                Some(Err(BackendError::Timeout)) => Err(BackendError::Timeout),
                Some(Err(BackendError::Parse(m))) => Err(BackendError::Parse(m.clone())),
                Some(Err(BackendError::Connection(m))) => Err(BackendError::Connection(m.clone())),
                Some(Err(BackendError::RateLimited { retry_after_secs })) => {
                    Err(BackendError::RateLimited {
                        retry_after_secs: *retry_after_secs,
                    })
                }
                Some(Err(BackendError::Api { status, message })) => Err(BackendError::Api {
                    status: *status,
                    message: message.clone(),
                }),
                None => Err(BackendError::Connection("script exhausted".to_string())),
            }
        }
    }

    fn test_config() -> EnrichmentConfig {
        EnrichmentConfig::default()
            .with_backoff_base_ms(1)
            .with_operation_timeout_secs(5)
    }

    fn client_with(responses: Vec<Result<String, BackendError>>) -> EnrichmentClient {
        EnrichmentClient::new(test_config(), Arc::new(ScriptedBackend::new(responses)))
    }

    #[test]
    fn test_parse_keywords_dedupes_case_insensitively() {
        let client = client_with(vec![]);
        let keywords = client.parse_keywords("Invoice, invoice, ACME Corp, acme corp, hosting, ssl");
        assert_eq!(keywords, vec!["Invoice", "ACME Corp", "hosting", "ssl"]);
    }

    #[test]
    fn test_parse_keywords_caps_count_and_keeps_order() {
        let client = client_with(vec![]);
        let keywords = client.parse_keywords("a, b, c, d, e, f, g");
        assert_eq!(keywords, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_parse_keywords_strips_formatting() {
        let client = client_with(vec![]);
        let keywords = client.parse_keywords("Keywords: [budget, policy, net-30]");
        assert_eq!(keywords, vec!["budget", "policy", "net-30"]);
    }

    #[test]
    fn test_truncate_content_respects_char_boundaries() {
        let mut config = test_config();
        config.max_content_chars = 5;
        let client = EnrichmentClient::new(config, Arc::new(ScriptedBackend::new(vec![])));
        // 'é' is two bytes; a naive slice at 5 would split it.
        let text = "abcdéf";
        let truncated = client.truncate_content(text);
        assert_eq!(truncated, "abcd");
        assert_eq!(client.truncate_content("ab"), "ab");
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let client = client_with(vec![
            Err(BackendError::Timeout),
            Err(BackendError::RateLimited {
                retry_after_secs: None,
            }),
            Ok("A short synopsis.".to_string()),
        ]);
        let summary = client.summarize("some text").await.unwrap();
        assert_eq!(summary, "A short synopsis.");
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let client = client_with(vec![
            Err(BackendError::Timeout),
            Err(BackendError::Timeout),
            Err(BackendError::Timeout),
            Ok("never reached".to_string()),
        ]);
        let result = client.summarize("some text").await;
        assert!(matches!(
            result,
            Err(EnrichmentError::Backend(BackendError::Timeout))
        ));
    }

    #[tokio::test]
    async fn test_non_transient_failures_are_not_retried() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            Err(BackendError::Api {
                status: 401,
                message: "bad key".to_string(),
            }),
            Ok("never reached".to_string()),
        ]));
        let client = EnrichmentClient::new(test_config(), backend.clone());
        let result = client.derive_insights("some text").await;
        assert!(matches!(result, Err(EnrichmentError::Backend(_))));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_operation_budget_is_enforced() {
        struct HangingBackend;

        #[async_trait]
        impl CompletionBackend for HangingBackend {
            async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
                std::future::pending().await
            }
        }

        let config = EnrichmentConfig::default().with_operation_timeout_secs(0);
        let client = EnrichmentClient::new(config, Arc::new(HangingBackend));
        let result = client.summarize("some text").await;
        assert!(matches!(result, Err(EnrichmentError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_empty_keyword_response_degrades() {
        let client = client_with(vec![Ok("   ".to_string())]);
        let result = client.extract_keywords("some text").await;
        assert!(matches!(result, Err(EnrichmentError::Backend(_))));
    }
}
