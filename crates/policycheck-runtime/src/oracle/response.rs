//! Oracle reply validation.
//!
//! Every reply goes through the same steps: strip an optional Markdown code
//! fence, parse JSON, validate against the embedded schema for the mode,
//! then deserialize into typed verdicts. Entries whose status is not one of
//! the known spellings are dropped rather than failing the whole reply.

use lazy_static::lazy_static;
use policycheck_core::{Coverage, MatchLevel, RawVerdict, SectionFindings};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

use super::OracleError;

const BLOCK_VERDICTS_SCHEMA: &str = include_str!("../../schemas/block_verdicts.schema.json");
const SECTION_ASSESSMENT_SCHEMA: &str =
    include_str!("../../schemas/section_assessment.schema.json");

static BLOCK_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();
static SECTION_VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*[ \t]*\n?(.*?)\s*```\s*$").unwrap();
}

/// Which reply shape to validate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySchema {
    /// JSON list of per-item verdicts
    BlockVerdicts,
    /// JSON object with evaluations and section-level fields
    SectionAssessment,
}

impl ReplySchema {
    fn validator(self) -> Result<&'static jsonschema::Validator, OracleError> {
        let (cell, source) = match self {
            ReplySchema::BlockVerdicts => (&BLOCK_VALIDATOR, BLOCK_VERDICTS_SCHEMA),
            ReplySchema::SectionAssessment => (&SECTION_VALIDATOR, SECTION_ASSESSMENT_SCHEMA),
        };

        let compiled = cell.get_or_init(|| {
            let schema: JsonValue = serde_json::from_str(source)
                .map_err(|e| format!("Invalid schema JSON: {}", e))?;
            jsonschema::options()
                .build(&schema)
                .map_err(|e| format!("Failed to compile schema: {}", e))
        });

        compiled
            .as_ref()
            .map_err(|e| OracleError::SchemaViolation(vec![e.clone()]))
    }

    /// Validate a parsed reply, collecting every violation.
    pub fn validate(self, reply: &JsonValue) -> Result<(), OracleError> {
        let errors: Vec<String> = self
            .validator()?
            .iter_errors(reply)
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OracleError::SchemaViolation(errors))
        }
    }
}

/// The JSON payload of a reply, without a surrounding code fence.
pub fn strip_code_fence(content: &str) -> &str {
    match CODE_FENCE.captures(content).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => content.trim(),
    }
}

fn parse_json(content: &str) -> Result<JsonValue, OracleError> {
    let payload = strip_code_fence(content);
    if payload.is_empty() {
        return Err(OracleError::MalformedJson("empty reply".to_string()));
    }
    serde_json::from_str(payload).map_err(|e| OracleError::MalformedJson(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct WireVerdict {
    checklist_id: String,
    status: String,
    #[serde(default)]
    matched_sentence: Option<String>,
    #[serde(default)]
    matched_excerpt: Option<String>,
    #[serde(default)]
    justification: Option<String>,
}

impl WireVerdict {
    /// `matched_sentence` wins when both keys carry text.
    fn excerpt(&self) -> &str {
        [&self.matched_sentence, &self.matched_excerpt]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct WireAssessment {
    #[serde(default)]
    evaluations: Vec<WireVerdict>,
    #[serde(default)]
    match_level: Option<String>,
    #[serde(default)]
    compliance_score: Option<f64>,
    #[serde(default)]
    suggested_rewrite: Option<String>,
    #[serde(default)]
    simplified_meaning: Option<String>,
}

fn into_verdicts(wire: Vec<WireVerdict>) -> Vec<RawVerdict> {
    wire.into_iter()
        .filter_map(|v| match Coverage::parse(&v.status) {
            Some(status) => Some(RawVerdict::new(
                v.checklist_id.trim(),
                status,
                v.excerpt(),
                v.justification.as_deref().unwrap_or_default().trim(),
            )),
            None => {
                tracing::warn!(
                    checklist_id = %v.checklist_id,
                    status = %v.status,
                    "Dropping verdict with unrecognized status"
                );
                None
            }
        })
        .collect()
}

/// Parse a block-mode reply into raw verdicts.
///
/// A list wrapped in an `{"evaluations": [...]}` object is accepted too.
pub fn parse_block_verdicts(content: &str) -> Result<Vec<RawVerdict>, OracleError> {
    let reply = match parse_json(content)? {
        JsonValue::Object(mut wrapper)
            if wrapper.get("evaluations").is_some_and(|v| v.is_array()) =>
        {
            wrapper.remove("evaluations").unwrap_or_default()
        }
        other => other,
    };

    ReplySchema::BlockVerdicts.validate(&reply)?;

    let wire: Vec<WireVerdict> =
        serde_json::from_value(reply).map_err(|e| OracleError::MalformedJson(e.to_string()))?;
    Ok(into_verdicts(wire))
}

/// Parse a document-mode reply into section findings.
///
/// Fields the oracle left out stay `None`; scoring fills them in.
pub fn parse_section_findings(content: &str) -> Result<SectionFindings, OracleError> {
    let reply = parse_json(content)?;
    ReplySchema::SectionAssessment.validate(&reply)?;

    let wire: WireAssessment =
        serde_json::from_value(reply).map_err(|e| OracleError::MalformedJson(e.to_string()))?;

    let match_level = wire.match_level.as_deref().and_then(|raw| {
        let parsed = MatchLevel::parse(raw);
        if parsed.is_none() {
            tracing::debug!(match_level = raw, "Ignoring unrecognized match level");
        }
        parsed
    });

    Ok(SectionFindings {
        verdicts: into_verdicts(wire.evaluations),
        match_level,
        compliance_score: wire.compliance_score,
        suggested_rewrite: wire.suggested_rewrite,
        simplified_meaning: wire.simplified_meaning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(strip_code_fence("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fence("  [\"plain\"]  "), "[\"plain\"]");
    }

    #[test]
    fn test_block_verdicts_parsed() {
        let content = r#"```json
[
  {"checklist_id": "6.1", "status": "Explicitly Mentioned",
   "matched_sentence": "We ask for your consent.", "justification": "Direct statement."},
  {"checklist_id": "6.2", "status": "missing", "matched_sentence": "", "justification": "Not covered."}
]
```"#;
        let verdicts = parse_block_verdicts(content).unwrap();

        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[0].status, Coverage::Explicit);
        assert_eq!(verdicts[0].matched_excerpt, "We ask for your consent.");
        assert_eq!(verdicts[1].status, Coverage::Missing);
    }

    #[test]
    fn test_block_verdicts_accept_wrapped_list_and_nulls() {
        let content = r#"{"evaluations": [
            {"checklist_id": "4.1", "status": "Partial", "matched_sentence": null}
        ]}"#;
        let verdicts = parse_block_verdicts(content).unwrap();

        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].status, Coverage::Partial);
        assert_eq!(verdicts[0].matched_excerpt, "");
        assert_eq!(verdicts[0].justification, "");
    }

    #[test]
    fn test_both_excerpt_keys_in_one_entry() {
        let content = r#"[
            {"checklist_id": "6.8", "status": "Explicit",
             "matched_sentence": "You may withdraw consent.", "matched_excerpt": "withdraw consent"},
            {"checklist_id": "6.9", "status": "Partial",
             "matched_sentence": "  ", "matched_excerpt": "as easily as it was given"},
            {"checklist_id": "6.1", "status": "Partial", "matched_excerpt": "free consent"}
        ]"#;
        let verdicts = parse_block_verdicts(content).unwrap();

        assert_eq!(verdicts.len(), 3);
        assert_eq!(verdicts[0].matched_excerpt, "You may withdraw consent.");
        assert_eq!(verdicts[1].matched_excerpt, "as easily as it was given");
        assert_eq!(verdicts[2].matched_excerpt, "free consent");
    }

    #[test]
    fn test_unrecognized_status_dropped() {
        let content = r#"[
            {"checklist_id": "4.1", "status": "Probably"},
            {"checklist_id": "4.2", "status": "Explicit"}
        ]"#;
        let verdicts = parse_block_verdicts(content).unwrap();
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].checklist_id, "4.2");
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_block_verdicts("Sure! Here is my analysis of the block.").unwrap_err();
        assert!(matches!(err, OracleError::MalformedJson(_)));

        let err = parse_block_verdicts("").unwrap_err();
        assert!(matches!(err, OracleError::MalformedJson(_)));
    }

    #[test]
    fn test_schema_violation_reports_location() {
        let err = parse_block_verdicts(r#"[{"status": "Explicit"}]"#).unwrap_err();
        match err {
            OracleError::SchemaViolation(errors) => {
                assert!(!errors.is_empty());
                assert!(errors[0].contains("checklist_id"));
            }
            other => panic!("Expected SchemaViolation, got {:?}", other),
        }

        let err = parse_block_verdicts(r#"{"checklist_id": "4.1"}"#).unwrap_err();
        assert!(matches!(err, OracleError::SchemaViolation(_)));
    }

    #[test]
    fn test_section_findings_full() {
        let content = r#"{
            "evaluations": [
                {"checklist_id": "4.1", "status": "Explicitly Mentioned", "justification": "yes"}
            ],
            "match_level": "Non Compliant",
            "compliance_score": 0.2,
            "suggested_rewrite": "Add a lawful purpose clause.",
            "simplified_meaning": "Only process data lawfully."
        }"#;
        let findings = parse_section_findings(content).unwrap();

        assert_eq!(findings.verdicts.len(), 1);
        assert_eq!(findings.match_level, Some(MatchLevel::NonCompliant));
        assert_eq!(findings.compliance_score, Some(0.2));
        assert_eq!(findings.suggested_rewrite.as_deref(), Some("Add a lawful purpose clause."));
    }

    #[test]
    fn test_section_findings_defaults() {
        let findings = parse_section_findings("{}").unwrap();
        assert!(findings.verdicts.is_empty());
        assert_eq!(findings.match_level, None);
        assert_eq!(findings.compliance_score, None);

        let findings = parse_section_findings(r#"{"match_level": "Error"}"#).unwrap();
        assert_eq!(findings.match_level, None);
    }

    #[test]
    fn test_section_findings_wrong_types() {
        let err = parse_section_findings(r#"{"compliance_score": "high"}"#).unwrap_err();
        assert!(matches!(err, OracleError::SchemaViolation(_)));

        let err = parse_section_findings("[]").unwrap_err();
        assert!(matches!(err, OracleError::SchemaViolation(_)));
    }
}
