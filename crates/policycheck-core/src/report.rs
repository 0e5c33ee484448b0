//! Report model handed to presentation and export collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checklist::ChecklistSection;
use crate::scoring::{document_score, section_score};
use crate::types::{CanonicalEntry, EvaluationMode, MatchLevel, SectionResult};

/// Report rows for one checklist section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionReport {
    /// Block mode: canonical coverage per item.
    Coverage {
        section_id: String,
        title: String,
        score: f64,
        entries: Vec<CanonicalEntry>,
    },

    /// Document mode: the oracle's whole-section assessment.
    Assessment(SectionResult),
}

impl SectionReport {
    /// Wrap finalized block-mode entries for a section.
    pub fn coverage(section: &ChecklistSection, entries: Vec<CanonicalEntry>) -> Self {
        SectionReport::Coverage {
            section_id: section.section_id.clone(),
            title: section.title.clone(),
            score: section_score(&entries),
            entries,
        }
    }

    pub fn section_id(&self) -> &str {
        match self {
            SectionReport::Coverage { section_id, .. } => section_id,
            SectionReport::Assessment(result) => &result.section_id,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            SectionReport::Coverage { score, .. } => *score,
            SectionReport::Assessment(result) => result.compliance_score,
        }
    }

    /// Number of checklist items this section's score is spread over.
    /// Failed assessments contribute nothing.
    pub fn item_count(&self) -> usize {
        match self {
            SectionReport::Coverage { entries, .. } => entries.len(),
            SectionReport::Assessment(result) => result.matched_details.len(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            SectionReport::Assessment(SectionResult {
                match_level: MatchLevel::Error,
                ..
            })
        )
    }
}

/// Final output of one compliance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub mode: EvaluationMode,

    pub generated_at: DateTime<Utc>,

    /// Blocks sent to the oracle (block mode only; 0 in document mode)
    pub blocks_evaluated: usize,

    pub sections: Vec<SectionReport>,

    /// Item-weighted score across all sections that produced rows
    pub document_score: f64,

    pub document_match_level: MatchLevel,
}

impl ComplianceReport {
    /// Assemble a report from per-section rows.
    pub fn new(mode: EvaluationMode, blocks_evaluated: usize, sections: Vec<SectionReport>) -> Self {
        let scored: Vec<(f64, usize)> = sections
            .iter()
            .filter(|s| !s.is_error())
            .map(|s| (s.score(), s.item_count()))
            .collect();

        let document_match_level = if !sections.is_empty() && scored.is_empty() {
            MatchLevel::Error
        } else {
            MatchLevel::from_score(document_score(scored.iter().copied()))
        };

        Self {
            mode,
            generated_at: Utc::now(),
            blocks_evaluated,
            document_score: document_score(scored),
            document_match_level,
            sections,
        }
    }

    /// Look up the rows for one section.
    pub fn section(&self, section_id: &str) -> Option<&SectionReport> {
        self.sections.iter().find(|s| s.section_id() == section_id)
    }

    /// Sections whose oracle calls failed.
    pub fn failed_sections(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.is_error())
            .map(|s| s.section_id())
            .collect()
    }
}
