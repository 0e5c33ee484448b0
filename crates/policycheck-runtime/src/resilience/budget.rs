//! Token budget and usage accounting for a compliance run.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::providers::TokenUsage;

/// Upper bound on tokens spent by one run.
///
/// Calls reserve their worst case before they are sent and settle to the
/// actual usage afterwards, so concurrent calls cannot jointly overshoot the
/// limit on the strength of the same remaining balance.
pub struct TokenBudget {
    pub max_tokens: u32,
    used: AtomicU32,
}

impl TokenBudget {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            used: AtomicU32::new(0),
        }
    }

    /// Claim `tokens` if they fit in what is left.
    pub fn try_reserve(&self, tokens: u32) -> bool {
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(tokens).filter(|total| *total <= self.max_tokens)
            })
            .is_ok()
    }

    /// Replace a reservation with the tokens actually spent.
    pub fn settle(&self, reserved: u32, actual: u32) {
        if actual >= reserved {
            self.used.fetch_add(actual - reserved, Ordering::SeqCst);
        } else {
            self.release(reserved - actual);
        }
    }

    /// Return an unused reservation.
    pub fn release(&self, tokens: u32) {
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| Some(used.saturating_sub(tokens)));
    }

    pub fn remaining(&self) -> u32 {
        self.max_tokens.saturating_sub(self.used.load(Ordering::SeqCst))
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }
}

/// Oracle usage attached to a run result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub total_tokens: u32,

    pub prompt_tokens: u32,

    pub completion_tokens: u32,

    /// Calls that reached the provider and returned
    pub llm_calls: u32,

    /// Calls that failed for any reason, including skipped ones
    pub failed_calls: u32,

    /// Calls answered from the response cache
    pub cached_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,

    pub cache_creation_tokens: u32,

    pub cache_read_tokens: u32,
}

impl LlmUsage {
    /// Add one provider reply.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;
        self.cache_creation_tokens += usage.cache_creation_tokens;
        self.cache_read_tokens += usage.cache_read_tokens;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Rough USD cost from per-million-token list prices.
    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        let (input_rate, output_rate, cache_write_rate, cache_read_rate) = match model {
            m if m.contains("sonnet-4-5") => (3.0, 15.0, 3.75, 0.3),
            m if m.contains("opus-4-5") => (5.0, 25.0, 6.25, 0.5),
            m if m.contains("haiku-4-5") => (1.0, 5.0, 1.25, 0.1),
            m if m.contains("gpt-4o-mini") => (0.15, 0.6, 0.0, 0.0),
            m if m.contains("gpt-4o") => (2.5, 10.0, 0.0, 0.0),
            m if m.contains("gpt-3.5-turbo") => (0.5, 1.5, 0.0, 0.0),
            _ => (3.0, 15.0, 3.75, 0.3),
        };

        let per_token = |tokens: u32, rate: f64| tokens as f64 / 1_000_000.0 * rate;

        per_token(usage.prompt_tokens, input_rate)
            + per_token(usage.completion_tokens, output_rate)
            + per_token(usage.cache_creation_tokens, cache_write_rate)
            + per_token(usage.cache_read_tokens, cache_read_rate)
    }
}

/// Token budget plus accumulated usage for the calls of one run.
pub struct BudgetTracker {
    global: TokenBudget,
    usage: RwLock<LlmUsage>,
}

impl BudgetTracker {
    pub fn new(global_max: u32) -> Self {
        Self {
            global: TokenBudget::new(global_max),
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    pub fn try_reserve(&self, tokens: u32) -> bool {
        self.global.try_reserve(tokens)
    }

    /// Settle a reservation against a reply's usage.
    pub fn record_usage(&self, reserved: u32, usage: &TokenUsage, model: &str) {
        self.global.settle(reserved, usage.total());
        self.usage.write().add(usage, model);
    }

    /// The call produced no usage; give the reservation back.
    pub fn release(&self, reserved: u32) {
        self.global.release(reserved);
    }

    pub fn record_failure(&self) {
        self.usage.write().failed_calls += 1;
    }

    pub fn record_cache_hit(&self) {
        self.usage.write().cached_calls += 1;
    }

    pub fn get_usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    pub fn remaining(&self) -> u32 {
        self.global.remaining()
    }
}

impl Default for BudgetTracker {
    fn default() -> Self {
        Self::new(super::DEFAULT_GLOBAL_MAX_TOKENS)
    }
}
