//! Per-section circuit breaker.
//!
//! Opt-in. When enabled, a section whose oracle calls keep failing at the
//! transport level stops being called for a while: its remaining blocks
//! report no verdicts and its document-mode assessment is recorded as an
//! error. Replies that arrive but fail validation never count, since they
//! say nothing about the provider's health.
//!
//! With concurrency above 1, which calls land after the circuit opens
//! depends on completion order.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::humantime_duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Off by default: every call is attempted
    pub enabled: bool,

    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,

    /// How long an open circuit rejects calls, e.g. "30s"
    #[serde(with = "humantime_duration")]
    pub recovery_timeout: Duration,

    /// Successes in half-open state needed to close again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    Closed { failures: u32 },
    Open { opened_at: Instant },
    HalfOpen { successes: u32 },
}

/// Circuit state per checklist section.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls for `section` should be skipped right now.
    ///
    /// An open circuit whose recovery timeout has elapsed moves to half-open
    /// and lets the next call through.
    pub fn is_open(&self, section: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        let mut states = self.states.write();
        let open_for = match states.get(section) {
            Some(CircuitState::Open { opened_at }) => opened_at.elapsed(),
            _ => return false,
        };

        if open_for < self.config.recovery_timeout {
            return true;
        }

        states.insert(section.to_string(), CircuitState::HalfOpen { successes: 0 });
        tracing::info!(section, "Circuit half-open, allowing a trial call");
        false
    }

    pub fn record_success(&self, section: &str) {
        if !self.config.enabled {
            return;
        }
        let mut states = self.states.write();
        let next = match states.get(section) {
            Some(CircuitState::HalfOpen { successes })
                if successes + 1 < self.config.success_threshold =>
            {
                CircuitState::HalfOpen {
                    successes: successes + 1,
                }
            }
            Some(CircuitState::HalfOpen { .. }) => {
                tracing::info!(section, "Circuit closed after successful recovery");
                CircuitState::Closed { failures: 0 }
            }
            Some(CircuitState::Open { .. }) => return,
            _ => CircuitState::Closed { failures: 0 },
        };
        states.insert(section.to_string(), next);
    }

    pub fn record_failure(&self, section: &str) {
        if !self.config.enabled {
            return;
        }
        let mut states = self.states.write();
        let next = match states.get(section) {
            Some(CircuitState::Closed { failures }) if failures + 1 < self.config.failure_threshold => {
                CircuitState::Closed {
                    failures: failures + 1,
                }
            }
            None if self.config.failure_threshold > 1 => CircuitState::Closed { failures: 1 },
            Some(CircuitState::Open { .. }) => return,
            Some(CircuitState::HalfOpen { .. }) => {
                tracing::warn!(section, "Circuit reopened after failed trial call");
                CircuitState::Open {
                    opened_at: Instant::now(),
                }
            }
            _ => {
                tracing::warn!(
                    section,
                    failures = self.config.failure_threshold,
                    "Circuit opened after repeated failures"
                );
                CircuitState::Open {
                    opened_at: Instant::now(),
                }
            }
        };
        states.insert(section.to_string(), next);
    }

    pub fn state(&self, section: &str) -> CircuitState {
        self.states
            .read()
            .get(section)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, recovery: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            enabled: true,
            failure_threshold: threshold,
            recovery_timeout: recovery,
            success_threshold: 1,
        })
    }

    #[test]
    fn test_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open("6"));
        assert_eq!(cb.state("6"), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_disabled_breaker_never_opens() {
        let cb = CircuitBreaker::default();
        for _ in 0..10 {
            cb.record_failure("6");
        }
        assert!(!cb.is_open("6"));
        assert_eq!(cb.state("6"), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_opens_after_threshold() {
        let cb = breaker(2, Duration::from_secs(60));

        cb.record_failure("6");
        assert!(!cb.is_open("6"));
        cb.record_failure("6");
        assert!(cb.is_open("6"));
    }

    #[test]
    fn test_threshold_of_one_opens_immediately() {
        let cb = breaker(1, Duration::from_secs(60));
        cb.record_failure("4");
        assert!(cb.is_open("4"));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = breaker(3, Duration::from_secs(60));

        cb.record_failure("6");
        cb.record_failure("6");
        cb.record_success("6");
        cb.record_failure("6");
        cb.record_failure("6");
        assert!(!cb.is_open("6"));
    }

    #[test]
    fn test_sections_are_independent() {
        let cb = breaker(2, Duration::from_secs(60));

        cb.record_failure("5");
        cb.record_failure("5");
        assert!(cb.is_open("5"));
        assert!(!cb.is_open("6"));
    }

    #[test]
    fn test_half_open_after_recovery_timeout() {
        let cb = breaker(1, Duration::ZERO);

        cb.record_failure("7");
        assert!(!cb.is_open("7"));
        assert_eq!(cb.state("7"), CircuitState::HalfOpen { successes: 0 });

        cb.record_success("7");
        assert_eq!(cb.state("7"), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_failed_trial_reopens() {
        let cb = breaker(1, Duration::ZERO);

        cb.record_failure("8");
        assert!(!cb.is_open("8"));
        cb.record_failure("8");
        assert!(matches!(cb.state("8"), CircuitState::Open { .. }));
    }
}
