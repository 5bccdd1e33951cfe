//! Clock injection.
//!
//! The compiled-flow cache and the circuit breakers both make time-based
//! decisions (TTL expiry, open-state cool-down). They read the clock through
//! [`TimeProvider`] so tests can drive those transitions deterministically
//! with [`FakeTimeProvider`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub trait TimeProvider: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock provider used in production.
#[derive(Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct FakeTimeProvider {
    base: Instant,
    offset: Mutex<Duration>,
}

impl FakeTimeProvider {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset += by;
    }
}

impl Default for FakeTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for FakeTimeProvider {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

pub fn system_clock() -> Arc<dyn TimeProvider> {
    Arc::new(SystemTimeProvider)
}
