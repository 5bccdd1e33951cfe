use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::runtime::ExecFlow;
use crate::time::TimeProvider;

/// Bounds of the compiled-flow cache.
#[derive(Debug, Clone)]
pub struct FlowCacheConfig {
    pub max_entries: usize,
    pub ttl: Duration,
}

impl Default for FlowCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 512,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
}

struct CacheEntry {
    flow: Arc<ExecFlow>,
    inserted_at: Instant,
}

/// Context-path-keyed cache of executable flows.
///
/// Version comparison against the authoritative store is the caller's job;
/// the cache only answers "do I hold a fresh entry for this path". Writes
/// replace the whole entry atomically, so concurrent rebuilds of the same
/// path are tolerated with last-writer-wins.
pub struct ExecFlowCache {
    entries: DashMap<String, CacheEntry>,
    config: FlowCacheConfig,
    clock: Arc<dyn TimeProvider>,
}

impl ExecFlowCache {
    pub fn new(config: FlowCacheConfig, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            entries: DashMap::new(),
            config,
            clock,
        }
    }

    pub fn get(&self, context_path: &str) -> Option<Arc<ExecFlow>> {
        let expired = match self.entries.get(context_path) {
            Some(entry) => {
                if self.clock.now().duration_since(entry.inserted_at) < self.config.ttl {
                    return Some(entry.flow.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            self.entries.remove(context_path);
        }
        None
    }

    pub fn put(&self, context_path: &str, flow: Arc<ExecFlow>) {
        if self.entries.len() >= self.config.max_entries
            && !self.entries.contains_key(context_path)
        {
            self.evict_oldest();
        }
        self.entries.insert(
            context_path.to_string(),
            CacheEntry {
                flow,
                inserted_at: self.clock.now(),
            },
        );
    }

    pub fn invalidate(&self, context_path: &str) {
        self.entries.remove(context_path);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            tracing::debug!(context_path = %key, "flow cache full, evicting oldest entry");
            self.entries.remove(&key);
        }
    }
}
