//! Checklist registry parsing and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a checklist registry.
#[derive(Error, Debug)]
pub enum ChecklistError {
    #[error("Failed to read checklist file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Checklist validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),
}

/// One atomic regulatory requirement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    /// Dotted `section.index` identifier (e.g., "6.9")
    pub id: String,

    /// The requirement the policy must satisfy
    #[serde(alias = "text")]
    pub requirement_text: String,
}

impl ChecklistItem {
    pub fn new(id: impl Into<String>, requirement_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            requirement_text: requirement_text.into(),
        }
    }
}

/// A named group of checklist items for one part of the statute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistSection {
    /// Legal section number (e.g., "6")
    pub section_id: String,

    /// Section heading (e.g., "Consent")
    pub title: String,

    /// Items in display and evaluation order
    pub items: Vec<ChecklistItem>,
}

impl ChecklistSection {
    /// Item ids in checklist order.
    pub fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }

    /// Whether this section defines the given item id.
    pub fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i.id == item_id)
    }
}

/// Static mapping from section id to its ordered checklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistRegistry {
    /// Statute or framework the checklist is derived from
    #[serde(default)]
    pub name: String,

    sections: Vec<ChecklistSection>,
}

impl ChecklistRegistry {
    /// Build a registry from sections, validating ids.
    pub fn new(name: impl Into<String>, sections: Vec<ChecklistSection>) -> Result<Self, ChecklistError> {
        let registry = Self::from_sections_unchecked(name, sections);
        registry.validate()?;
        Ok(registry)
    }

    pub(crate) fn from_sections_unchecked(
        name: impl Into<String>,
        sections: Vec<ChecklistSection>,
    ) -> Self {
        Self {
            name: name.into(),
            sections,
        }
    }

    /// Parse a registry from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ChecklistError> {
        let registry: ChecklistRegistry = serde_yaml::from_str(yaml)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Parse a registry from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ChecklistError> {
        let registry: ChecklistRegistry = serde_json::from_str(json)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Parse a registry from a file. `.json` files are read as JSON,
    /// everything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ChecklistError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Validate the registry structure.
    pub fn validate(&self) -> Result<(), ChecklistError> {
        if self.sections.is_empty() {
            return Err(ChecklistError::ValidationError(
                "registry defines no sections".to_string(),
            ));
        }

        let mut section_ids = HashSet::new();
        let mut item_ids = HashSet::new();

        for section in &self.sections {
            if section.section_id.is_empty() {
                return Err(ChecklistError::ValidationError(
                    "section with empty section_id".to_string(),
                ));
            }
            if !section_ids.insert(section.section_id.as_str()) {
                return Err(ChecklistError::ValidationError(format!(
                    "Duplicate section ID: {}",
                    section.section_id
                )));
            }
            if section.items.is_empty() {
                return Err(ChecklistError::ValidationError(format!(
                    "Section {} has no checklist items",
                    section.section_id
                )));
            }

            let prefix = format!("{}.", section.section_id);
            for item in &section.items {
                if !item.id.starts_with(&prefix) {
                    return Err(ChecklistError::ValidationError(format!(
                        "Item {} does not belong to section {}",
                        item.id, section.section_id
                    )));
                }
                if item.requirement_text.trim().is_empty() {
                    return Err(ChecklistError::ValidationError(format!(
                        "Item {} has empty requirement text",
                        item.id
                    )));
                }
                if !item_ids.insert(item.id.as_str()) {
                    return Err(ChecklistError::ValidationError(format!(
                        "Duplicate checklist ID: {}",
                        item.id
                    )));
                }
            }
        }

        Ok(())
    }

    /// All sections in registry order.
    pub fn sections(&self) -> &[ChecklistSection] {
        &self.sections
    }

    /// Look up a section by id.
    pub fn section(&self, section_id: &str) -> Option<&ChecklistSection> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }

    /// Look up a section by id, failing with [`ChecklistError::UnknownSection`].
    pub fn require_section(&self, section_id: &str) -> Result<&ChecklistSection, ChecklistError> {
        self.section(section_id)
            .ok_or_else(|| ChecklistError::UnknownSection(section_id.to_string()))
    }

    /// Section ids in registry order.
    pub fn section_ids(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.section_id.as_str()).collect()
    }

    /// Look up an item by its globally unique id.
    pub fn item(&self, item_id: &str) -> Option<&ChecklistItem> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .find(|i| i.id == item_id)
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_REGISTRY: &str = r#"
name: "Test Act"
sections:
  - section_id: "1"
    title: "Scope"
    items:
      - id: "1.1"
        text: "The policy must name the controller."
      - id: "1.2"
        text: "The policy must state its effective date."
  - section_id: "2"
    title: "Rights"
    items:
      - id: "2.1"
        requirement_text: "The policy must describe access rights."
"#;

    #[test]
    fn test_parse_valid_registry() {
        let registry = ChecklistRegistry::from_yaml(VALID_REGISTRY).unwrap();
        assert_eq!(registry.name, "Test Act");
        assert_eq!(registry.section_ids(), vec!["1", "2"]);
        assert_eq!(registry.item_count(), 3);
        assert_eq!(
            registry.item("1.2").unwrap().requirement_text,
            "The policy must state its effective date."
        );
    }

    #[test]
    fn test_parse_json_registry() {
        let json = r#"{"name":"J","sections":[{"section_id":"9","title":"T","items":[{"id":"9.1","text":"x"}]}]}"#;
        let registry = ChecklistRegistry::from_json(json).unwrap();
        assert!(registry.section("9").unwrap().contains("9.1"));
    }

    #[test]
    fn test_duplicate_item_ids() {
        let yaml = r#"
sections:
  - section_id: "1"
    title: "A"
    items:
      - id: "1.1"
        text: "one"
      - id: "1.1"
        text: "two"
"#;
        let result = ChecklistRegistry::from_yaml(yaml);
        assert!(matches!(result, Err(ChecklistError::ValidationError(_))));
    }

    #[test]
    fn test_item_outside_its_section() {
        let yaml = r#"
sections:
  - section_id: "1"
    title: "A"
    items:
      - id: "2.1"
        text: "misplaced"
"#;
        let result = ChecklistRegistry::from_yaml(yaml);
        assert!(matches!(result, Err(ChecklistError::ValidationError(_))));
    }

    #[test]
    fn test_empty_section_rejected() {
        let yaml = r#"
sections:
  - section_id: "1"
    title: "A"
    items: []
"#;
        assert!(ChecklistRegistry::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_require_unknown_section() {
        let registry = ChecklistRegistry::from_yaml(VALID_REGISTRY).unwrap();
        assert!(matches!(
            registry.require_section("42"),
            Err(ChecklistError::UnknownSection(_))
        ));
    }
}
