//! Cache of validated oracle replies.
//!
//! Keyed by mode, section, model and a hash of the full prompt, so a block
//! that appears twice in a document, or a document re-checked by the same
//! runner, does not cost a second call. Only replies that passed validation
//! are stored. Disabled unless `cache.enabled` is set.

use moka::future::Cache;
use policycheck_core::EvaluationMode;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::config::CacheConfig;
use crate::providers::OracleRequest;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    mode: EvaluationMode,
    section_id: String,
    model: String,
    prompt_hash: u64,
}

impl CacheKey {
    pub fn new(mode: EvaluationMode, section_id: &str, model: &str, request: &OracleRequest) -> Self {
        let mut hasher = DefaultHasher::new();
        request.system.hash(&mut hasher);
        request.user.hash(&mut hasher);

        Self {
            mode,
            section_id: section_id.to_string(),
            model: model.to_string(),
            prompt_hash: hasher.finish(),
        }
    }
}

/// In-memory reply cache backed by moka. Clones share the same entries.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Cache<CacheKey, String>,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// The configured cache, or `None` when caching is off.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_entries, config.ttl))
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, reply: String) {
        self.cache.insert(key, reply).await;
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}
