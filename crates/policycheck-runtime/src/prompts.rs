//! Oracle prompts.
//!
//! The system message carries everything that is fixed for a section (role,
//! output contract, checklist) so providers with prompt caching reuse it
//! across every block. The user message carries only the text under review.

use policycheck_core::{ChecklistSection, EvaluationMode, TextBlock};

/// Role framing shared by both evaluation modes.
pub const BASE_SYSTEM_PROMPT: &str = r#"
You are a legal compliance evaluator checking privacy policies against India's
Digital Personal Data Protection Act, 2023 (DPDPA).

## Rules
1. Judge ONLY the text you are given. Do not assume anything that is not written.
2. Evaluate every checklist item listed below, in order.
3. Quote the policy verbatim when you cite it. Never paraphrase inside a quote.
4. Keep each justification to one or two sentences.

## Status values
- "Explicitly Mentioned": the text clearly and directly satisfies the item
- "Partially Mentioned": the text touches the item but is vague or incomplete
- "Missing": the text does not address the item
"#;

/// Output contract for block-by-block evaluation.
pub const BLOCK_INSTRUCTIONS: &str = r#"
## Task
You will receive one block of a policy document. For each checklist item,
decide whether THIS BLOCK addresses it.

## Output Format
Return a JSON list and nothing else, one object per checklist item:
[
  {
    "checklist_id": "6.1",
    "status": "Explicitly Mentioned" | "Partially Mentioned" | "Missing",
    "matched_sentence": "verbatim quote from the block, or empty string",
    "justification": "short explanation"
  }
]
"#;

/// Output contract for whole-document evaluation.
pub const DOCUMENT_INSTRUCTIONS: &str = r#"
## Task
You will receive a complete policy document. Assess how well the document as a
whole satisfies this section of the Act.

## Output Format
Return one JSON object and nothing else:
{
  "evaluations": [
    {
      "checklist_id": "6.1",
      "status": "Explicitly Mentioned" | "Partially Mentioned" | "Missing",
      "matched_sentence": "verbatim quote, or empty string",
      "justification": "short explanation"
    }
  ],
  "match_level": "Fully Compliant" | "Partially Compliant" | "Non-Compliant",
  "compliance_score": 0.0-1.0,
  "suggested_rewrite": "policy wording that would satisfy the missing or partial items",
  "simplified_meaning": "what this section of the Act requires, in plain language"
}
"#;

/// Render a section's checklist as one `- id: text` line per item.
pub fn render_checklist(section: &ChecklistSection) -> String {
    section
        .items
        .iter()
        .map(|item| format!("- {}: {}", item.id, item.requirement_text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System message for every call against `section` in `mode`.
pub fn system_prompt(mode: EvaluationMode, section: &ChecklistSection) -> String {
    let instructions = match mode {
        EvaluationMode::Block => BLOCK_INSTRUCTIONS,
        EvaluationMode::Document => DOCUMENT_INSTRUCTIONS,
    };

    format!(
        "{}\n{}\n## Checklist (Section {}: {})\n{}\n",
        BASE_SYSTEM_PROMPT.trim(),
        instructions,
        section.section_id,
        section.title,
        render_checklist(section)
    )
}

/// User message for one block in block mode.
pub fn block_message(block: &TextBlock, industry: Option<&str>) -> String {
    format!(
        "{}Policy Block ({}):\n\"\"\"{}\"\"\"",
        industry_context(industry),
        block.block_id,
        block.text
    )
}

/// User message for the whole document in document mode.
pub fn document_message(document: &str, industry: Option<&str>) -> String {
    format!(
        "{}Policy Document:\n\"\"\"{}\"\"\"",
        industry_context(industry),
        document.trim()
    )
}

// Industry is framing only; it never changes the checklist.
fn industry_context(industry: Option<&str>) -> String {
    match industry.map(str::trim) {
        Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case("general") => format!(
            "Industry context: {}. Read the policy as written for this industry.\n\n",
            name
        ),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policycheck_core::ChecklistRegistry;

    #[test]
    fn test_checklist_rendered_in_order() {
        let registry = ChecklistRegistry::dpdpa();
        let section = registry.section("4").unwrap();
        let rendered = render_checklist(section);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("- 4.1: "));
        assert!(lines[4].starts_with("- 4.5: "));
    }

    #[test]
    fn test_system_prompt_per_mode() {
        let registry = ChecklistRegistry::dpdpa();
        let section = registry.section("6").unwrap();

        let block = system_prompt(EvaluationMode::Block, section);
        assert!(block.contains("JSON list"));
        assert!(block.contains("Section 6: Consent"));
        assert!(block.contains("- 6.16: "));

        let document = system_prompt(EvaluationMode::Document, section);
        assert!(document.contains("\"evaluations\""));
        assert!(document.contains("simplified_meaning"));
    }

    #[test]
    fn test_block_message_quotes_text() {
        let block = TextBlock {
            block_id: "B3".to_string(),
            text: "We keep data for a year.".to_string(),
        };
        let message = block_message(&block, None);
        assert_eq!(message, "Policy Block (B3):\n\"\"\"We keep data for a year.\"\"\"");
    }

    #[test]
    fn test_industry_framing() {
        assert_eq!(document_message("x", Some("General")), document_message("x", None));
        assert_eq!(document_message("x", Some("  ")), document_message("x", None));

        let message = document_message("x", Some("Fintech"));
        assert!(message.starts_with("Industry context: Fintech."));
    }
}
