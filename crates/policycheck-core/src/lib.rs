//! # policycheck-core
//!
//! Deterministic compliance-evaluation pipeline for policy documents.
//!
//! This crate turns raw oracle verdicts into a compliance report:
//! - Which checklist requirements does the document address?
//! - How strongly (explicitly, partially, not at all)?
//! - What is the resulting section and document score?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: The same verdicts always produce the same report
//! 2. **No LLM calls**: Oracle access lives in `policycheck-runtime`
//! 3. **Complete**: Every checklist item gets exactly one report row
//! 4. **Monotone**: Folding more blocks never downgrades an item's coverage
//!
//! ## Example
//!
//! ```rust,ignore
//! use policycheck_core::{aggregator, segmenter, ChecklistRegistry};
//!
//! let registry = ChecklistRegistry::dpdpa();
//! let blocks = segmenter::segment_for_evaluation(&policy_text, 8);
//!
//! // ... collect RawVerdicts for section "6" from the oracle ...
//! let section = registry.require_section("6")?;
//! let entries = aggregator::summarize(&verdicts, &section.item_ids());
//! ```

pub mod aggregator;
pub mod checklist;
pub mod report;
pub mod scoring;
pub mod segmenter;
pub mod types;

// Re-export main types at crate root
pub use checklist::{ChecklistError, ChecklistItem, ChecklistRegistry, ChecklistSection};
pub use report::{ComplianceReport, SectionReport};
pub use segmenter::{is_valid_block, segment, segment_for_evaluation, DEFAULT_MIN_BLOCK_WORDS};
pub use types::{
    CanonicalEntry, Coverage, EvaluationMode, MatchLevel, MatchedDetail, RawVerdict,
    SectionFindings, SectionResult, TextBlock,
};
