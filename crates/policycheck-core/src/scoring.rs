//! Section and document compliance scoring.
//!
//! Every score uses the same credit rule: an Explicit item earns 1.0, a
//! Partial item 0.5, a Missing item nothing, divided by the number of items
//! in scope.

use std::collections::HashMap;

use crate::checklist::ChecklistSection;
use crate::types::{
    CanonicalEntry, Coverage, MatchLevel, MatchedDetail, RawVerdict, SectionFindings,
    SectionResult,
};

/// `(explicit + 0.5 * partial) / total_items`, or 0.0 for an empty section.
pub fn compliance_score<I>(statuses: I, total_items: usize) -> f64
where
    I: IntoIterator<Item = Coverage>,
{
    if total_items == 0 {
        return 0.0;
    }
    let credit: f64 = statuses.into_iter().map(Coverage::confidence_score).sum();
    (credit / total_items as f64).clamp(0.0, 1.0)
}

/// Score of a block-mode section from its finalized entries.
pub fn section_score(entries: &[CanonicalEntry]) -> f64 {
    compliance_score(entries.iter().map(|e| e.coverage), entries.len())
}

/// Normalize oracle verdicts to one detail row per section item.
///
/// Rows follow checklist order and carry the registry's requirement text.
/// Items the oracle omitted become Missing with an empty justification.
/// Verdicts for ids outside the section are dropped; for a repeated id the
/// first verdict wins.
pub fn normalize_details(section: &ChecklistSection, verdicts: &[RawVerdict]) -> Vec<MatchedDetail> {
    let mut by_id: HashMap<&str, &RawVerdict> = HashMap::new();
    for verdict in verdicts {
        if !section.contains(&verdict.checklist_id) {
            tracing::debug!(
                section = %section.section_id,
                checklist_id = %verdict.checklist_id,
                "Dropping verdict for unknown checklist id"
            );
            continue;
        }
        by_id.entry(verdict.checklist_id.as_str()).or_insert(verdict);
    }

    section
        .items
        .iter()
        .map(|item| match by_id.get(item.id.as_str()) {
            Some(v) => MatchedDetail {
                item_id: item.id.clone(),
                item_text: item.requirement_text.clone(),
                status: v.status,
                justification: v.justification.clone(),
            },
            None => MatchedDetail {
                item_id: item.id.clone(),
                item_text: item.requirement_text.clone(),
                status: Coverage::Missing,
                justification: String::new(),
            },
        })
        .collect()
}

/// Build the whole-document assessment of one section.
///
/// The score is computed from the item classifications. Only when the
/// oracle returned no classifications at all does its own score stand in.
/// An oracle-supplied match level takes precedence over the derived one.
pub fn assess_section(section: &ChecklistSection, findings: SectionFindings) -> SectionResult {
    let matched_details = normalize_details(section, &findings.verdicts);

    let reported_score = findings
        .compliance_score
        .filter(|s| s.is_finite())
        .map(|s| s.clamp(0.0, 1.0));

    let compliance_score = if findings.verdicts.is_empty() {
        reported_score.unwrap_or(0.0)
    } else {
        compliance_score(matched_details.iter().map(|d| d.status), section.items.len())
    };

    let match_level = findings
        .match_level
        .filter(|level| *level != MatchLevel::Error)
        .unwrap_or_else(|| MatchLevel::from_score(compliance_score));

    let items_matched = matched_details
        .iter()
        .filter(|d| d.status.is_mentioned())
        .cloned()
        .collect();

    SectionResult {
        section_id: section.section_id.clone(),
        title: section.title.clone(),
        match_level,
        compliance_score,
        reported_score,
        matched_details,
        items_matched,
        suggested_rewrite: findings.suggested_rewrite.unwrap_or_default(),
        simplified_meaning: findings.simplified_meaning.unwrap_or_default(),
    }
}

/// Assessment recorded when the oracle call for a section failed.
pub fn failed_section(section: &ChecklistSection) -> SectionResult {
    SectionResult {
        section_id: section.section_id.clone(),
        title: section.title.clone(),
        match_level: MatchLevel::Error,
        compliance_score: 0.0,
        reported_score: None,
        matched_details: Vec::new(),
        items_matched: Vec::new(),
        suggested_rewrite: String::new(),
        simplified_meaning: String::new(),
    }
}

/// Aggregate `(credit, item_count)` pairs into one document score.
pub fn document_score<I>(sections: I) -> f64
where
    I: IntoIterator<Item = (f64, usize)>,
{
    let (credit, items) = sections
        .into_iter()
        .fold((0.0, 0usize), |(c, n), (score, count)| {
            (c + score * count as f64, n + count)
        });

    if items == 0 {
        0.0
    } else {
        (credit / items as f64).clamp(0.0, 1.0)
    }
}
