//! Scripted provider shared by the runtime tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::providers::{
    CompletionConfig, CompletionResponse, LlmProvider, OracleRequest, ProviderError, TokenUsage,
};

type Script = dyn Fn(&str, &str) -> Result<String, ProviderError> + Send + Sync;

/// Answers each request by calling a script with the system and user
/// messages.
pub(crate) struct ScriptedProvider {
    script: Box<Script>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new<F>(script: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always reply with `content`.
    pub(crate) fn replying(content: &str) -> Self {
        let content = content.to_string();
        Self::new(move |_, _| Ok(content.clone()))
    }

    /// Always fail with the error `make` builds.
    pub(crate) fn failing<F>(make: F) -> Self
    where
        F: Fn() -> ProviderError + Send + Sync + 'static,
    {
        Self::new(move |_, _| Err(make()))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests that reached the script.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        request: &OracleRequest,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let content = (self.script)(&request.system, &request.user)?;

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                ..Default::default()
            },
            model: config.model.clone(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
