//! Oracle transport.
//!
//! Every oracle request has the same two parts: a system prompt carrying the
//! section checklist and the output format, and a user message carrying the
//! text under review. [`LlmProvider`] sends one [`OracleRequest`] and returns
//! the raw reply text; validation happens in [`crate::oracle`].
//!
//! Anthropic and OpenAI ship behind the `anthropic` and `openai` features.
//! Keys are held as [`ApiCredential`] and never printed.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod factory;
pub mod secrets;

#[cfg(feature = "anthropic")]
mod anthropic;

#[cfg(feature = "openai")]
mod openai;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicProvider, AnthropicProviderFactory};

#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OpenAiProviderFactory};

/// Sampling temperature of every classification request.
pub const CLASSIFICATION_TEMPERATURE: f32 = 0.0;

/// Transport-level failures. Anything here means the oracle produced no
/// reply at all.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Rate limited by provider, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Unreadable provider response: {0}")]
    InvalidResponse(String),

    #[error("Provider rejected the API key")]
    Unauthorized,

    #[error("No reply within {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// Per-call request settings, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub model: String,

    /// Reply token limit
    pub max_tokens: u32,

    pub timeout: Duration,

    /// Mark the system prompt cacheable (Anthropic)
    pub prompt_caching: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
            prompt_caching: true,
        }
    }
}

/// One classification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Instructions, output format and the section checklist
    pub system: String,

    /// Text under review, with optional industry framing
    pub user: String,
}

impl OracleRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Prompt size estimate used for budget reservations, ~4 bytes per
    /// token.
    pub fn estimated_tokens(&self) -> u32 {
        ((self.system.len() + self.user.len()) / 4) as u32
    }
}

/// Raw oracle reply.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,

    pub usage: TokenUsage,

    /// Model that actually served the request, used for cost estimates
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,

    pub completion_tokens: u32,

    pub cache_read_tokens: u32,

    pub cache_creation_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A chat-completion backend acting as the oracle.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        request: &OracleRequest,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Error body shape shared by the Anthropic and OpenAI APIs.
#[cfg(any(feature = "anthropic", feature = "openai"))]
#[derive(serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[cfg(any(feature = "anthropic", feature = "openai"))]
#[derive(serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(any(feature = "anthropic", feature = "openai"))]
fn send_error(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Http(err.to_string())
    }
}

/// Map non-success statuses to [`ProviderError`].
#[cfg(any(feature = "anthropic", feature = "openai"))]
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(ProviderError::RateLimited { retry_after })
        }
        401 => Err(ProviderError::Unauthorized),
        code => {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            Err(ProviderError::Api { status: code, message })
        }
    }
}
