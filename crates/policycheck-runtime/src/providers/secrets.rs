//! API key handling for oracle providers.
//!
//! Keys are wrapped in [`SecretString`] as soon as they are read and only
//! unwrapped when an HTTP header is built. `Debug` and `Display` print
//! `[REDACTED]`, so a provider can be logged freely.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a key came from. Reported in logs instead of the key itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// `api_key` field of the provider options
    Config,
    /// Environment variable
    Environment,
    /// Passed to a constructor
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CredentialSource::Config => "config",
            CredentialSource::Environment => "environment",
            CredentialSource::Programmatic => "programmatic",
        };
        f.write_str(s)
    }
}

/// A provider API key.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    label: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, label: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            label,
        }
    }

    /// Read the key from `env_var`.
    pub fn from_env(env_var: &str, label: &'static str) -> Result<Self, ProviderError> {
        match std::env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(Self::new(v, CredentialSource::Environment, label)),
            _ => Err(ProviderError::NotConfigured(format!(
                "{} not set: export {}",
                label, env_var
            ))),
        }
    }

    /// Read the key from `options[field]`, falling back to `env_var`.
    pub fn from_options_or_env(
        options: &JsonValue,
        field: &str,
        env_var: &str,
        label: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = options[field].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, label));
        }

        Self::from_env(env_var, label).map_err(|_| {
            ProviderError::NotConfigured(format!(
                "{} required: set '{}' in provider options or export {}",
                label, field, env_var
            ))
        })
    }

    /// Whether a key could be resolved, without reading it into a secret.
    pub fn is_available(options: &JsonValue, field: &str, env_var: &str) -> bool {
        options[field].as_str().is_some()
            || std::env::var(env_var).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    /// The raw key. Call only when building the request header.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("label", &self.label)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.label, self.source)
    }
}
