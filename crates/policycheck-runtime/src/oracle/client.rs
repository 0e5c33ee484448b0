use std::sync::Arc;

use policycheck_core::{ChecklistSection, EvaluationMode, RawVerdict, SectionFindings, TextBlock};

use super::response::{parse_block_verdicts, parse_section_findings};
use super::OracleError;
use crate::cache::{CacheKey, ResponseCache};
use crate::config::RuntimeConfig;
use crate::prompts;
use crate::providers::{CompletionConfig, LlmProvider, OracleRequest, ProviderError};
use crate::resilience::{BudgetTracker, CircuitBreaker, LlmUsage};

/// Issues classification requests for one run and validates the replies.
///
/// Each call is guarded, in order, by the section's circuit breaker (when
/// enabled), the reply cache (when attached), the token budget and a
/// timeout. Breaker and budget state live and die with the client, so a
/// runner builds a fresh client per run; only the cache may be shared.
pub struct OracleClient {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    breaker: CircuitBreaker,
    budget: BudgetTracker,
    cache: Option<ResponseCache>,
}

impl OracleClient {
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RuntimeConfig, model: impl Into<String>) -> Self {
        Self {
            provider,
            completion: config.completion_config(model),
            breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            budget: BudgetTracker::new(config.budget.global_max_tokens),
            cache: None,
        }
    }

    /// Serve identical requests from `cache` and store validated replies
    /// in it.
    pub fn with_cache(mut self, cache: Option<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Mode A: classify every item of `section` against one block.
    pub async fn evaluate_block(
        &self,
        section: &ChecklistSection,
        block: &TextBlock,
        industry: Option<&str>,
    ) -> Result<Vec<RawVerdict>, OracleError> {
        let user = prompts::block_message(block, industry);
        self.call(EvaluationMode::Block, section, user, parse_block_verdicts)
            .await
    }

    /// Mode B: assess `section` against the whole document.
    pub async fn evaluate_section(
        &self,
        section: &ChecklistSection,
        document: &str,
        industry: Option<&str>,
    ) -> Result<SectionFindings, OracleError> {
        let user = prompts::document_message(document, industry);
        self.call(EvaluationMode::Document, section, user, parse_section_findings)
            .await
    }

    async fn call<T>(
        &self,
        mode: EvaluationMode,
        section: &ChecklistSection,
        user: String,
        parse: fn(&str) -> Result<T, OracleError>,
    ) -> Result<T, OracleError> {
        let section_id = section.section_id.as_str();

        if self.breaker.is_open(section_id) {
            self.budget.record_failure();
            return Err(OracleError::CircuitOpen(section_id.to_string()));
        }

        let request = OracleRequest::new(prompts::system_prompt(mode, section), user);
        let key = CacheKey::new(mode, section_id, &self.completion.model, &request);

        if let Some(cache) = &self.cache {
            if let Some(content) = cache.get(&key).await {
                if let Ok(value) = parse(&content) {
                    tracing::debug!(section = section_id, mode = %mode, "Oracle reply served from cache");
                    self.budget.record_cache_hit();
                    return Ok(value);
                }
            }
        }

        // Worst case for this call: the whole prompt plus a full-length reply.
        let reserved = request.estimated_tokens().saturating_add(self.completion.max_tokens);
        if !self.budget.try_reserve(reserved) {
            tracing::warn!(
                section = section_id,
                reserved,
                remaining = self.budget.remaining(),
                "Token budget exhausted, skipping oracle call"
            );
            self.budget.record_failure();
            return Err(OracleError::BudgetExceeded);
        }

        let timeout = self.completion.timeout;
        let reply = tokio::time::timeout(timeout, self.provider.complete(&request, &self.completion)).await;

        let outcome = match reply {
            Ok(Ok(response)) => {
                self.budget.record_usage(reserved, &response.usage, &response.model);
                tracing::debug!(
                    section = section_id,
                    mode = %mode,
                    tokens = response.usage.total(),
                    "Oracle call completed"
                );
                parse(&response.content).map(|value| (value, response.content))
            }
            Ok(Err(e)) => {
                self.budget.release(reserved);
                Err(match e {
                    ProviderError::Timeout(elapsed) => OracleError::Timeout(elapsed),
                    other => OracleError::Transport(other),
                })
            }
            Err(_) => {
                self.budget.release(reserved);
                Err(OracleError::Timeout(timeout))
            }
        };

        match outcome {
            Ok((value, content)) => {
                self.breaker.record_success(section_id);
                if let Some(cache) = &self.cache {
                    cache.insert(key, content).await;
                }
                Ok(value)
            }
            Err(e) => {
                if e.is_transport_failure() {
                    self.breaker.record_failure(section_id);
                } else {
                    self.breaker.record_success(section_id);
                }
                self.budget.record_failure();
                Err(e)
            }
        }
    }

    pub fn model(&self) -> &str {
        &self.completion.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Usage of the calls made through this client.
    pub fn usage(&self) -> LlmUsage {
        self.budget.get_usage()
    }
}
