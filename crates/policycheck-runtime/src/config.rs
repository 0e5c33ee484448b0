//! Runtime configuration.
//!
//! Loaded from YAML or JSON; every field has a default, so an empty file is a
//! valid configuration. Durations are humantime strings ("45s", "2m").
//!
//! ```yaml
//! provider: openai
//! model: gpt-4o-mini
//! timeout: 45s
//! concurrency: 8
//! circuit_breaker:
//!   enabled: true
//!   failure_threshold: 5
//!   recovery_timeout: 1m
//! budget:
//!   global_max_tokens: 500000
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::{CircuitBreakerConfig, DEFAULT_GLOBAL_MAX_TOKENS};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for one [`ComplianceRunner`](crate::ComplianceRunner).
///
/// There is no temperature setting: classification requests always use
/// [`CLASSIFICATION_TEMPERATURE`](crate::providers::CLASSIFICATION_TEMPERATURE).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Provider type registered in the provider registry
    pub provider: String,

    /// Model name; `None` uses the provider's default
    pub model: Option<String>,

    /// Provider-specific options (`api_key`, `base_url`)
    pub provider_options: JsonValue,

    /// Completion token limit per call
    pub max_tokens: u32,

    /// Per-call timeout
    #[serde(with = "humantime_duration")]
    pub timeout: Duration,

    /// Oracle calls in flight at once; 1 runs sequentially
    pub concurrency: usize,

    /// Blocks with fewer words are not sent to the oracle
    pub min_block_words: usize,

    /// Ask the provider to cache the system prompt (Anthropic)
    pub prompt_caching: bool,

    pub circuit_breaker: CircuitBreakerConfig,

    pub budget: BudgetConfig,

    pub cache: CacheConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            provider_options: JsonValue::Object(Default::default()),
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
            concurrency: 4,
            min_block_words: policycheck_core::DEFAULT_MIN_BLOCK_WORDS,
            prompt_caching: true,
            circuit_breaker: CircuitBreakerConfig::default(),
            budget: BudgetConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Tokens one run may spend across all of its calls
    pub global_max_tokens: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            global_max_tokens: DEFAULT_GLOBAL_MAX_TOKENS,
        }
    }
}

/// Reply cache shared by the runs of one runner. Off by default, since it
/// is the only state that outlives a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,

    pub max_entries: u64,

    #[serde(with = "humantime_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are JSON, anything else YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("provider must not be empty".into()));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Invalid("concurrency must be at least 1".into()));
        }
        if self.min_block_words == 0 {
            return Err(ConfigError::Invalid("min_block_words must be at least 1".into()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".into()));
        }
        if self.budget.global_max_tokens == 0 {
            return Err(ConfigError::Invalid("budget.global_max_tokens must be positive".into()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout must be positive".into()));
        }
        if !self.provider_options.is_object() {
            return Err(ConfigError::Invalid("provider_options must be a mapping".into()));
        }
        Ok(())
    }

    /// Request settings for oracle calls against `model`.
    pub fn completion_config(&self, model: impl Into<String>) -> CompletionConfig {
        CompletionConfig {
            model: model.into(),
            max_tokens: self.max_tokens,
            timeout: self.timeout,
            prompt_caching: self.prompt_caching,
        }
    }
}

/// Serde adapter for humantime duration strings.
pub mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
