//! Checklist registry.
//!
//! A checklist is static configuration: sections of ordered requirement
//! items. The built-in registry covers DPDPA sections 4 to 8; custom
//! registries can be loaded from YAML or JSON.

mod dpdpa;
mod registry;

pub use registry::{ChecklistError, ChecklistItem, ChecklistRegistry, ChecklistSection};
