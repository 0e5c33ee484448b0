//! Guards around oracle calls: a circuit breaker per checklist section and a
//! global token budget.

mod budget;
mod circuit_breaker;

pub use budget::{BudgetTracker, LlmUsage, TokenBudget};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

/// Default ceiling on tokens spent by one run.
pub const DEFAULT_GLOBAL_MAX_TOKENS: u32 = 2_000_000;
