//! Compliance run orchestration.
//!
//! A run fans oracle calls out with bounded concurrency and fans the results
//! back in deterministically:
//! - Block mode: one call per (section, block), folded per section by the
//!   core aggregator after every call has finished
//! - Document mode: one call per section, scored by the core scorer
//!
//! A failed call never aborts the run. Block mode loses that block's
//! verdicts; document mode records the section as an error.
//!
//! Each run gets its own [`OracleClient`], and with it its own circuit
//! breaker state, token budget and usage counters. Only the reply cache,
//! when enabled, is shared between runs of one runner.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use policycheck_core::{
    aggregator,
    scoring::{assess_section, failed_section},
    segment_for_evaluation, ChecklistError, ChecklistRegistry, ChecklistSection,
    ComplianceReport, EvaluationMode, RawVerdict, SectionFindings, SectionReport, TextBlock,
};

use crate::cache::ResponseCache;
use crate::config::{ConfigError, RuntimeConfig};
use crate::oracle::OracleClient;
use crate::providers::{CompletionConfig, LlmProvider, ProviderError, ProviderRegistry};
use crate::resilience::LlmUsage;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Checklist(#[from] ChecklistError),
}

/// Which checklist sections a run covers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SectionScope {
    /// Every section in the registry, in registry order
    #[default]
    All,
    /// The listed section ids, in the given order
    Only(Vec<String>),
}

impl SectionScope {
    /// `"all"` (any case) or a comma-separated list of section ids.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            return SectionScope::All;
        }
        SectionScope::Only(
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn single(section_id: impl Into<String>) -> Self {
        SectionScope::Only(vec![section_id.into()])
    }

    fn resolve<'r>(
        &self,
        registry: &'r ChecklistRegistry,
    ) -> Result<Vec<&'r ChecklistSection>, ChecklistError> {
        match self {
            SectionScope::All => Ok(registry.sections().iter().collect()),
            SectionScope::Only(ids) => {
                let mut sections: Vec<&ChecklistSection> = Vec::with_capacity(ids.len());
                for id in ids {
                    let section = registry.require_section(id)?;
                    if !sections.iter().any(|s| s.section_id == section.section_id) {
                        sections.push(section);
                    }
                }
                Ok(sections)
            }
        }
    }
}

/// Per-run choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: EvaluationMode,
    pub scope: SectionScope,
    /// Industry framing passed to the oracle; "General" or `None` adds none
    pub industry: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: EvaluationMode::Block,
            scope: SectionScope::All,
            industry: None,
        }
    }
}

/// Result of one compliance run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub report: ComplianceReport,

    /// Oracle usage of this run
    pub llm_usage: LlmUsage,
}

/// Runs compliance checks against one checklist registry with one oracle.
pub struct ComplianceRunner {
    provider: Arc<dyn LlmProvider>,
    model: String,
    cache: Option<ResponseCache>,
    registry: ChecklistRegistry,
    config: RuntimeConfig,
}

impl ComplianceRunner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: ChecklistRegistry,
        config: RuntimeConfig,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            cache: ResponseCache::from_config(&config.cache),
            registry,
            config,
        }
    }

    /// Build the provider named in `config` from the built-in provider
    /// registry. Fails when the provider is unknown or has no credentials.
    pub fn from_config(config: RuntimeConfig, registry: ChecklistRegistry) -> Result<Self, RuntimeError> {
        config.validate()?;

        let providers = ProviderRegistry::with_defaults();
        providers.validate(&config.provider, &config.provider_options)?;
        let provider = providers.create(&config.provider, &config.provider_options)?;

        let model = config
            .model
            .clone()
            .or_else(|| providers.default_model(&config.provider).map(str::to_string))
            .unwrap_or_else(|| CompletionConfig::default().model);

        tracing::info!(provider = provider.name(), model = %model, "Oracle configured");
        Ok(Self::new(provider, registry, config, model))
    }

    pub fn registry(&self) -> &ChecklistRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Forget every cached oracle reply.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    /// Evaluate `document` and assemble the report.
    ///
    /// Only an unknown section id in `options.scope` is an error; oracle
    /// failures are folded into the report.
    pub async fn run(&self, document: &str, options: &RunOptions) -> Result<RunReport, RuntimeError> {
        let sections = options.scope.resolve(&self.registry)?;
        let industry = options.industry.as_deref();
        let client = OracleClient::new(self.provider.clone(), &self.config, self.model.as_str())
            .with_cache(self.cache.clone());

        tracing::info!(
            mode = %options.mode,
            sections = sections.len(),
            concurrency = self.config.concurrency,
            "Starting compliance run"
        );

        let report = match options.mode {
            EvaluationMode::Block => self.run_blocks(&client, document, &sections, industry).await,
            EvaluationMode::Document => {
                self.run_document(&client, document, &sections, industry)
                    .await
            }
        };

        let llm_usage = client.usage();
        tracing::info!(
            score = report.document_score,
            level = %report.document_match_level,
            failed_sections = report.failed_sections().len(),
            calls = llm_usage.llm_calls,
            failed_calls = llm_usage.failed_calls,
            "Compliance run finished"
        );

        Ok(RunReport { report, llm_usage })
    }

    async fn run_blocks(
        &self,
        client: &OracleClient,
        document: &str,
        sections: &[&ChecklistSection],
        industry: Option<&str>,
    ) -> ComplianceReport {
        let blocks = segment_for_evaluation(document, self.config.min_block_words);

        let plan: Vec<(&ChecklistSection, &TextBlock)> = sections
            .iter()
            .flat_map(|section| blocks.iter().map(move |block| (*section, block)))
            .collect();

        tracing::debug!(blocks = blocks.len(), calls = plan.len(), "Block plan ready");

        let results: Vec<Vec<RawVerdict>> = stream::iter(plan.iter().map(|(section, block)| async move {
            match client.evaluate_block(section, block, industry).await {
                Ok(verdicts) => verdicts,
                Err(e) => {
                    tracing::warn!(
                        section = %section.section_id,
                        block = %block.block_id,
                        kind = e.kind(),
                        error = %e,
                        "Block evaluation failed, contributing no verdicts"
                    );
                    Vec::new()
                }
            }
        }))
        .buffered(self.config.concurrency.max(1))
        .collect()
        .await;

        // Fold only after every call is back, in request order.
        let mut by_section: HashMap<&str, Vec<RawVerdict>> = HashMap::new();
        for ((section, _), verdicts) in plan.iter().zip(results) {
            by_section
                .entry(section.section_id.as_str())
                .or_default()
                .extend(verdicts);
        }

        let reports = sections
            .iter()
            .map(|section| {
                let verdicts = by_section
                    .remove(section.section_id.as_str())
                    .unwrap_or_default();
                let entries = aggregator::summarize(&verdicts, &section.item_ids());
                SectionReport::coverage(section, entries)
            })
            .collect();

        ComplianceReport::new(EvaluationMode::Block, blocks.len(), reports)
    }

    async fn run_document(
        &self,
        client: &OracleClient,
        document: &str,
        sections: &[&ChecklistSection],
        industry: Option<&str>,
    ) -> ComplianceReport {
        if document.trim().is_empty() {
            tracing::warn!("Document is empty, every item reported missing");
            let reports = sections
                .iter()
                .map(|section| SectionReport::Assessment(assess_section(section, SectionFindings::default())))
                .collect();
            return ComplianceReport::new(EvaluationMode::Document, 0, reports);
        }

        let reports: Vec<SectionReport> = stream::iter(sections.iter().map(|section| async move {
            let result = match client.evaluate_section(section, document, industry).await {
                Ok(findings) => assess_section(section, findings),
                Err(e) => {
                    tracing::warn!(
                        section = %section.section_id,
                        kind = e.kind(),
                        error = %e,
                        "Section assessment failed"
                    );
                    failed_section(section)
                }
            };
            SectionReport::Assessment(result)
        }))
        .buffered(self.config.concurrency.max(1))
        .collect()
        .await;

        ComplianceReport::new(EvaluationMode::Document, 0, reports)
    }
}

/// Builder for [`ComplianceRunner`].
#[derive(Default)]
pub struct ComplianceRunnerBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    registry: Option<ChecklistRegistry>,
    config: RuntimeConfig,
    model: Option<String>,
}

impl ComplianceRunnerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Checklist to evaluate against; defaults to the built-in DPDPA list.
    pub fn registry(mut self, registry: ChecklistRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn build(self) -> Result<ComplianceRunner, RuntimeError> {
        let provider = self
            .provider
            .ok_or_else(|| RuntimeError::ProviderNotConfigured("No provider set".to_string()))?;
        self.config.validate()?;

        let model = self
            .model
            .or_else(|| self.config.model.clone())
            .unwrap_or_else(|| CompletionConfig::default().model);

        Ok(ComplianceRunner::new(
            provider,
            self.registry.unwrap_or_else(ChecklistRegistry::dpdpa),
            self.config,
            model,
        ))
    }
}
