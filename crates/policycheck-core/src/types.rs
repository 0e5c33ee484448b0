//! Core types for compliance evaluation.
//!
//! These are the data structures that flow through the pipeline: blocks of
//! document text, raw oracle verdicts, canonical per-item coverage and
//! whole-section assessments.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the oracle is asked to evaluate a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Mode A: each segmented block is evaluated against each section.
    Block,
    /// Mode B: the entire document is evaluated once per section.
    Document,
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationMode::Block => write!(f, "block"),
            EvaluationMode::Document => write!(f, "document"),
        }
    }
}

/// Per-item verdict.
///
/// Variants are declared in ascending order so `Ord` reflects strength:
/// `Missing < Partial < Explicit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Coverage {
    #[serde(alias = "missing", alias = "Not Mentioned")]
    Missing,
    #[serde(alias = "Partially Mentioned", alias = "partial")]
    Partial,
    #[serde(alias = "Explicitly Mentioned", alias = "explicit")]
    Explicit,
}

impl Coverage {
    /// Confidence score attached to this coverage level.
    pub fn confidence_score(self) -> f64 {
        match self {
            Coverage::Explicit => 1.0,
            Coverage::Partial => 0.5,
            Coverage::Missing => 0.0,
        }
    }

    /// Label used in formatted evidence strings.
    pub fn label(self) -> &'static str {
        match self {
            Coverage::Explicit => "Explicitly Mentioned",
            Coverage::Partial => "Partially Mentioned",
            Coverage::Missing => "Missing",
        }
    }

    /// Whether this verdict counts as evidence for the requirement.
    pub fn is_mentioned(self) -> bool {
        !matches!(self, Coverage::Missing)
    }

    /// Parse a status string as produced by the oracle.
    ///
    /// Accepts the short names and the "... Mentioned" spellings in any case.
    pub fn parse(status: &str) -> Option<Self> {
        match status.trim().to_ascii_lowercase().as_str() {
            "explicit" | "explicitly mentioned" => Some(Coverage::Explicit),
            "partial" | "partially mentioned" => Some(Coverage::Partial),
            "missing" | "not mentioned" => Some(Coverage::Missing),
            _ => None,
        }
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Section-level classification for whole-document evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchLevel {
    #[serde(rename = "Fully Compliant")]
    FullyCompliant,
    #[serde(rename = "Partially Compliant")]
    PartiallyCompliant,
    #[serde(rename = "Non-Compliant")]
    NonCompliant,
    /// The oracle call for this section failed.
    Error,
}

impl MatchLevel {
    /// Derive a level from a compliance score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 1.0 {
            MatchLevel::FullyCompliant
        } else if score <= 0.0 {
            MatchLevel::NonCompliant
        } else {
            MatchLevel::PartiallyCompliant
        }
    }

    /// Parse a level reported by the oracle. `Error` is never accepted from
    /// the oracle; it is reserved for failed calls.
    pub fn parse(level: &str) -> Option<Self> {
        let normalized = level.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "fully compliant" => Some(MatchLevel::FullyCompliant),
            "partially compliant" => Some(MatchLevel::PartiallyCompliant),
            "non compliant" => Some(MatchLevel::NonCompliant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchLevel::FullyCompliant => "Fully Compliant",
            MatchLevel::PartiallyCompliant => "Partially Compliant",
            MatchLevel::NonCompliant => "Non-Compliant",
            MatchLevel::Error => "Error",
        }
    }
}

impl fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contiguous span of document text evaluated as one unit in block mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Sequential id in document order ("B1", "B2", ...)
    pub block_id: String,

    /// Block text, lines joined by single spaces
    pub text: String,
}

impl TextBlock {
    /// Whitespace-delimited word count.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// One oracle judgment for one checklist item against one evaluated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawVerdict {
    pub checklist_id: String,

    pub status: Coverage,

    /// Verbatim quote from the evaluated text; empty when none
    #[serde(default)]
    pub matched_excerpt: String,

    #[serde(default)]
    pub justification: String,
}

impl RawVerdict {
    pub fn new(
        checklist_id: impl Into<String>,
        status: Coverage,
        matched_excerpt: impl Into<String>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            checklist_id: checklist_id.into(),
            status,
            matched_excerpt: matched_excerpt.into(),
            justification: justification.into(),
        }
    }

    /// Evidence line recorded for this verdict in a [`CanonicalEntry`].
    pub fn formatted_match(&self) -> String {
        format!(
            "{} matches this checklist item because {} ({})",
            self.matched_excerpt.trim(),
            self.justification.trim(),
            self.status.label()
        )
    }
}

/// Canonical per-item coverage after folding all verdicts of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntry {
    pub checklist_id: String,

    pub coverage: Coverage,

    /// Always `coverage.confidence_score()`
    pub confidence_score: f64,

    /// One formatted evidence line per non-missing verdict, in encounter order
    pub supporting_matches: Vec<String>,
}

impl CanonicalEntry {
    /// Entry for an item no evaluated unit mentioned.
    pub fn missing(checklist_id: impl Into<String>) -> Self {
        Self {
            checklist_id: checklist_id.into(),
            coverage: Coverage::Missing,
            confidence_score: Coverage::Missing.confidence_score(),
            supporting_matches: Vec::new(),
        }
    }
}

/// One checklist item as classified in a whole-document assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedDetail {
    pub item_id: String,
    pub item_text: String,
    pub status: Coverage,
    pub justification: String,
}

/// What the oracle reported for one section in document mode, after
/// validation. Absent fields stay `None` and are defaulted during scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionFindings {
    pub verdicts: Vec<RawVerdict>,
    pub match_level: Option<MatchLevel>,
    pub compliance_score: Option<f64>,
    pub suggested_rewrite: Option<String>,
    pub simplified_meaning: Option<String>,
}

/// Whole-document assessment of one checklist section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionResult {
    pub section_id: String,

    pub title: String,

    pub match_level: MatchLevel,

    /// `(explicit + 0.5 * partial) / total_items`
    pub compliance_score: f64,

    /// Score the oracle reported itself, kept for comparison
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_score: Option<f64>,

    /// One row per section item, in checklist order
    pub matched_details: Vec<MatchedDetail>,

    /// Rows of `matched_details` whose status is not Missing
    pub items_matched: Vec<MatchedDetail>,

    pub suggested_rewrite: String,

    pub simplified_meaning: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_ordering() {
        assert!(Coverage::Explicit > Coverage::Partial);
        assert!(Coverage::Partial > Coverage::Missing);
        assert_eq!(
            Coverage::Partial.max(Coverage::Explicit),
            Coverage::Explicit
        );
    }

    #[test]
    fn test_confidence_scores() {
        assert_eq!(Coverage::Explicit.confidence_score(), 1.0);
        assert_eq!(Coverage::Partial.confidence_score(), 0.5);
        assert_eq!(Coverage::Missing.confidence_score(), 0.0);
    }

    #[test]
    fn test_coverage_parse_accepts_long_and_short_forms() {
        assert_eq!(Coverage::parse("Explicitly Mentioned"), Some(Coverage::Explicit));
        assert_eq!(Coverage::parse("partial"), Some(Coverage::Partial));
        assert_eq!(Coverage::parse(" MISSING "), Some(Coverage::Missing));
        assert_eq!(Coverage::parse("maybe"), None);
    }

    #[test]
    fn test_coverage_serde_aliases() {
        let c: Coverage = serde_json::from_str("\"Explicitly Mentioned\"").unwrap();
        assert_eq!(c, Coverage::Explicit);
        assert_eq!(serde_json::to_string(&Coverage::Partial).unwrap(), "\"Partial\"");
    }

    #[test]
    fn test_match_level_from_score() {
        assert_eq!(MatchLevel::from_score(1.0), MatchLevel::FullyCompliant);
        assert_eq!(MatchLevel::from_score(0.0), MatchLevel::NonCompliant);
        assert_eq!(MatchLevel::from_score(0.7), MatchLevel::PartiallyCompliant);
    }

    #[test]
    fn test_match_level_parse() {
        assert_eq!(MatchLevel::parse("Non-Compliant"), Some(MatchLevel::NonCompliant));
        assert_eq!(MatchLevel::parse("non compliant"), Some(MatchLevel::NonCompliant));
        assert_eq!(MatchLevel::parse("Fully Compliant"), Some(MatchLevel::FullyCompliant));
        assert_eq!(MatchLevel::parse("Error"), None);
        assert_eq!(
            serde_json::to_string(&MatchLevel::NonCompliant).unwrap(),
            "\"Non-Compliant\""
        );
    }

    #[test]
    fn test_formatted_match() {
        let verdict = RawVerdict::new(
            "6.8",
            Coverage::Explicit,
            "You may withdraw consent at any time.",
            "it states the right to withdraw",
        );
        assert_eq!(
            verdict.formatted_match(),
            "You may withdraw consent at any time. matches this checklist item because \
             it states the right to withdraw (Explicitly Mentioned)"
        );
    }
}
