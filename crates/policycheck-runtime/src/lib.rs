//! # policycheck-runtime
//!
//! Oracle-backed compliance runs for policycheck.
//!
//! `policycheck-core` decides nothing on its own about what a policy says;
//! it folds and scores verdicts. This crate obtains those verdicts from a
//! language model, validates them at the boundary, and drives a whole run:
//!
//! - Providers behind [`LlmProvider`] (Anthropic, OpenAI)
//! - Prompts that carry the section checklist and the text under review
//! - Schema-checked, typed replies ([`OracleError`] on anything else)
//! - Bounded concurrency, per-call timeouts, a per-section circuit breaker,
//!   a global token budget and a reply cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use policycheck_core::{ChecklistRegistry, EvaluationMode};
//! use policycheck_runtime::{ComplianceRunner, RunOptions, RuntimeConfig, SectionScope};
//!
//! let runner = ComplianceRunner::from_config(RuntimeConfig::default(), ChecklistRegistry::dpdpa())?;
//! let options = RunOptions {
//!     mode: EvaluationMode::Document,
//!     scope: SectionScope::single("6"),
//!     industry: Some("Fintech".into()),
//! };
//! let result = runner.run(&policy_text, &options).await?;
//! println!("{}", result.report.document_score);
//! ```

pub mod cache;
pub mod config;
pub mod oracle;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{BudgetConfig, CacheConfig, ConfigError, RuntimeConfig};
pub use oracle::{OracleClient, OracleError};
pub use orchestrator::{
    ComplianceRunner, ComplianceRunnerBuilder, RunOptions, RunReport, RuntimeError, SectionScope,
};
pub use providers::{LlmProvider, ProviderError, ProviderRegistry};
pub use resilience::LlmUsage;
