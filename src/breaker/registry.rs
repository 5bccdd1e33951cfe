use std::sync::Arc;

use dashmap::DashMap;

use super::{BreakerConfig, CircuitBreaker, Clock};

/// Process-wide breaker registry keyed by node id.
///
/// Breakers survive recompiles of their project on purpose: accumulated
/// window state stays meaningful across cache rebuilds of the same flow.
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    clock: Clock,
}

impl BreakerRegistry {
    pub fn new(clock: Clock) -> Self {
        Self {
            breakers: DashMap::new(),
            clock,
        }
    }

    pub fn get_or_create(&self, node_id: &str, config: BreakerConfig) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(node_id.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(node_id, config, self.clock.clone()))
            })
            .value()
            .clone()
    }

    pub fn get(&self, node_id: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(node_id).map(|b| b.value().clone())
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
