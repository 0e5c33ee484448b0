//! Plain-text rendering for terminal output.

use std::io::{self, Write};

use policycheck_core::{
    segmenter::has_min_words, ChecklistRegistry, ChecklistSection, Coverage, SectionReport,
    SectionResult, TextBlock,
};
use policycheck_runtime::RunReport;

fn status_tag(coverage: Coverage) -> &'static str {
    match coverage {
        Coverage::Explicit => "[explicit]",
        Coverage::Partial => "[partial] ",
        Coverage::Missing => "[missing] ",
    }
}

/// Human-readable compliance report.
pub fn report<W: Write>(out: &mut W, result: &RunReport, registry: &ChecklistRegistry) -> io::Result<()> {
    let report = &result.report;

    writeln!(
        out,
        "{} compliance report ({} mode, {} blocks evaluated)",
        registry.name, report.mode, report.blocks_evaluated
    )?;
    writeln!(
        out,
        "Document score: {:.2} ({})",
        report.document_score, report.document_match_level
    )?;

    for section in &report.sections {
        writeln!(out)?;
        match section {
            SectionReport::Coverage {
                section_id,
                title,
                score,
                entries,
            } => {
                writeln!(out, "Section {}: {}  score {:.2}", section_id, title, score)?;
                for entry in entries {
                    let text = registry
                        .item(&entry.checklist_id)
                        .map(|item| item.requirement_text.as_str())
                        .unwrap_or("");
                    writeln!(out, "  {} {:<5} {}", status_tag(entry.coverage), entry.checklist_id, text)?;
                    for matched in &entry.supporting_matches {
                        writeln!(out, "      - {}", matched)?;
                    }
                }
            }
            SectionReport::Assessment(assessment) => assessment_text(out, assessment)?,
        }
    }

    let usage = &result.llm_usage;
    writeln!(out)?;
    writeln!(
        out,
        "Oracle: {} calls, {} failed, {} cached, {} tokens, ~${:.4}",
        usage.llm_calls, usage.failed_calls, usage.cached_calls, usage.total_tokens, usage.estimated_cost
    )
}

fn assessment_text<W: Write>(out: &mut W, result: &SectionResult) -> io::Result<()> {
    writeln!(
        out,
        "Section {}: {}  {} ({:.2})",
        result.section_id, result.title, result.match_level, result.compliance_score
    )?;

    for detail in &result.matched_details {
        writeln!(out, "  {} {:<5} {}", status_tag(detail.status), detail.item_id, detail.item_text)?;
        if !detail.justification.is_empty() {
            writeln!(out, "      {}", detail.justification)?;
        }
    }

    if !result.simplified_meaning.is_empty() {
        writeln!(out, "  In plain terms: {}", result.simplified_meaning)?;
    }
    if !result.suggested_rewrite.is_empty() {
        writeln!(out, "  Suggested wording: {}", result.suggested_rewrite)?;
    }
    Ok(())
}

/// Segmentation preview: every block with its word count and whether it
/// would be sent to the oracle.
pub fn blocks<W: Write>(out: &mut W, blocks: &[TextBlock], min_words: usize) -> io::Result<()> {
    for block in blocks {
        let kept = has_min_words(&block.text, min_words);
        writeln!(
            out,
            "{:<4} {:>4} words {}  {}",
            block.block_id,
            block.word_count(),
            if kept { "sent   " } else { "dropped" },
            block.text
        )?;
    }
    Ok(())
}

/// Checklist listing.
pub fn sections<W: Write>(out: &mut W, sections: &[&ChecklistSection]) -> io::Result<()> {
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(
            out,
            "Section {}: {} ({} items)",
            section.section_id,
            section.title,
            section.items.len()
        )?;
        for item in &section.items {
            writeln!(out, "  {:<5} {}", item.id, item.requirement_text)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use policycheck_core::{
        scoring::failed_section, CanonicalEntry, ComplianceReport, EvaluationMode,
    };
    use policycheck_runtime::LlmUsage;

    fn render(result: &RunReport, registry: &ChecklistRegistry) -> String {
        let mut buf = Vec::new();
        report(&mut buf, result, registry).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_coverage_report_text() {
        let registry = ChecklistRegistry::dpdpa();
        let s4 = registry.section("4").unwrap();
        let mut entries: Vec<CanonicalEntry> = s4
            .item_ids()
            .iter()
            .map(|id| CanonicalEntry::missing(id.as_str()))
            .collect();
        entries[1] = CanonicalEntry {
            checklist_id: "4.2".to_string(),
            coverage: Coverage::Explicit,
            confidence_score: 1.0,
            supporting_matches: vec!["quote matches this checklist item because reason (Explicitly Mentioned)".into()],
        };

        let result = RunReport {
            report: ComplianceReport::new(
                EvaluationMode::Block,
                3,
                vec![SectionReport::coverage(s4, entries)],
            ),
            llm_usage: LlmUsage::default(),
        };
        let text = render(&result, &registry);

        assert!(text.starts_with("DPDPA 2023 compliance report (block mode, 3 blocks evaluated)"));
        assert!(text.contains("Document score: 0.20 (Partially Compliant)"));
        assert!(text.contains("[explicit] 4.2"));
        assert!(text.contains("      - quote matches this checklist item"));
        assert!(text.contains("Oracle: 0 calls, 0 failed"));
    }

    #[test]
    fn test_failed_assessment_text() {
        let registry = ChecklistRegistry::dpdpa();
        let s5 = registry.section("5").unwrap();
        let result = RunReport {
            report: ComplianceReport::new(
                EvaluationMode::Document,
                0,
                vec![SectionReport::Assessment(failed_section(s5))],
            ),
            llm_usage: LlmUsage::default(),
        };
        let text = render(&result, &registry);

        assert!(text.contains("Section 5: Notice  Error (0.00)"));
        assert!(text.contains("Document score: 0.00 (Error)"));
    }

    #[test]
    fn test_block_preview_marks_dropped() {
        let preview = vec![
            TextBlock {
                block_id: "B1".into(),
                text: "Short block".into(),
            },
            TextBlock {
                block_id: "B2".into(),
                text: "This block has more than enough words to be evaluated".into(),
            },
        ];
        let mut buf = Vec::new();
        blocks(&mut buf, &preview, 8).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].contains("dropped"));
        assert!(lines[1].contains("sent"));
    }

    #[test]
    fn test_checklist_listing() {
        let registry = ChecklistRegistry::dpdpa();
        let mut buf = Vec::new();
        sections(&mut buf, &[registry.section("4").unwrap()]).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("Section 4: Grounds for Processing Personal Data (5 items)"));
        assert_eq!(text.lines().count(), 6);
    }
}
