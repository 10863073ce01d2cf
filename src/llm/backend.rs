//! The language-model backend boundary: one request/response capability
//! per call, taking plain text and returning plain text or a structured
//! failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::retry::parse_retry_after;
use crate::config::EnrichmentConfig;

/// Errors from the language-model backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl BackendError {
    /// Transient failures are worth retrying with backoff; everything
    /// else (auth failures, malformed requests, unparseable output)
    /// degrades the field immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout
            | BackendError::RateLimited { .. }
            | BackendError::Connection(_) => true,
            BackendError::Api { status, .. } => *status >= 500,
            BackendError::Parse(_) => false,
        }
    }

    /// Suggested wait before a retry, when the backend provided one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            BackendError::RateLimited { retry_after_secs } => *retry_after_secs,
            _ => None,
        }
    }
}

/// A single request/response completion capability.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a prompt to the model and return its raw text response.
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

/// Completion backend speaking the Ollama generate API.
pub struct OllamaBackend {
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OllamaBackend {
    /// Build a backend from the enrichment configuration.
    pub fn new(config: &EnrichmentConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Self::request_timeout(config))
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    /// Check if the backend service is reachable.
    pub async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.client.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Per-request timeout: the operation budget split across all
    /// attempts, so a single slow request leaves room for retries.
    fn request_timeout(config: &EnrichmentConfig) -> std::time::Duration {
        let attempts = u64::from(config.max_retries) + 1;
        std::time::Duration::from_secs((config.operation_timeout_secs / attempts).max(1))
    }

    fn map_request_error(e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::Connection(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok());
            let retry_after_secs = parse_retry_after(retry_after).map(|d| d.as_secs());
            return Err(BackendError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}
