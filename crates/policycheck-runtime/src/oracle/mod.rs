//! Oracle client: the boundary between the deterministic pipeline and the
//! language model.
//!
//! Each call either returns typed verdicts or an [`OracleError`] naming what
//! went wrong. Callers decide how a failure shows up in the report.

use std::time::Duration;
use thiserror::Error;

use crate::providers::ProviderError;

mod client;
mod response;

pub use client::OracleClient;
pub use response::{
    parse_block_verdicts, parse_section_findings, strip_code_fence, ReplySchema,
};

/// Why an oracle call produced no usable verdicts.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Transport failure: {0}")]
    Transport(#[from] ProviderError),

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed oracle reply: {0}")]
    MalformedJson(String),

    #[error("Oracle reply violates schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Circuit open for section {0}")]
    CircuitOpen(String),

    #[error("Token budget exhausted")]
    BudgetExceeded,
}

impl OracleError {
    /// Short machine-readable name, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            OracleError::Transport(_) => "transport",
            OracleError::Timeout(_) => "timeout",
            OracleError::MalformedJson(_) => "malformed_json",
            OracleError::SchemaViolation(_) => "schema_violation",
            OracleError::CircuitOpen(_) => "circuit_open",
            OracleError::BudgetExceeded => "budget_exceeded",
        }
    }

    /// No reply reached us. Only these failures say anything about the
    /// provider's health; a reply that fails validation does not.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, OracleError::Transport(_) | OracleError::Timeout(_))
    }
}
