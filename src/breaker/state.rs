use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;

use super::{BreakerConfig, Clock};

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Point-in-time view for logs and tests.
#[derive(Debug, Clone)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub recorded_calls: usize,
    pub failure_rate: f32,
}

enum Phase {
    Closed,
    Open { until: Instant },
    HalfOpen { admitted: usize, successes: usize },
}

struct Inner {
    phase: Phase,
    /// Outcomes of the most recent calls, `true` for failure.
    window: VecDeque<bool>,
}

/// Count-based sliding-window circuit breaker guarding one HTTP node.
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    clock: Clock,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig, clock: Clock) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                window: VecDeque::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask permission to make a call. `false` means the circuit is open and
    /// the call must fail fast without an outbound attempt.
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::Closed => true,
            Phase::Open { until } => {
                if self.clock.now() >= until {
                    tracing::debug!(breaker = %self.name, "open period elapsed, half-opening");
                    inner.phase = Phase::HalfOpen {
                        admitted: 1,
                        successes: 0,
                    };
                    true
                } else {
                    false
                }
            }
            Phase::HalfOpen {
                ref mut admitted, ..
            } => {
                if *admitted < self.config.half_open_permits {
                    *admitted += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::HalfOpen {
                ref mut successes, ..
            } => {
                *successes += 1;
                if *successes >= self.config.half_open_permits {
                    tracing::debug!(breaker = %self.name, "trial calls clean, closing");
                    inner.phase = Phase::Closed;
                    inner.window.clear();
                }
            }
            _ => self.record_outcome(&mut inner, false),
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.phase {
            Phase::HalfOpen { .. } => {
                // Any failed trial call re-opens immediately.
                tracing::warn!(breaker = %self.name, "trial call failed, re-opening");
                inner.phase = Phase::Open {
                    until: self.clock.now() + self.config.open_duration,
                };
            }
            _ => self.record_outcome(&mut inner, true),
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            state: match inner.phase {
                Phase::Closed => BreakerState::Closed,
                Phase::Open { .. } => BreakerState::Open,
                Phase::HalfOpen { .. } => BreakerState::HalfOpen,
            },
            recorded_calls: inner.window.len(),
            failure_rate: failure_rate(&inner.window),
        }
    }

    fn record_outcome(&self, inner: &mut Inner, failed: bool) {
        inner.window.push_back(failed);
        while inner.window.len() > self.config.sliding_window_size {
            inner.window.pop_front();
        }

        // The rate is evaluated once the window holds more samples than the
        // configured minimum.
        if inner.window.len() <= self.config.minimum_calls {
            return;
        }
        let rate = failure_rate(&inner.window);
        if rate >= self.config.failure_rate_threshold {
            tracing::warn!(
                breaker = %self.name,
                failure_rate = rate,
                "failure rate over threshold, opening"
            );
            inner.phase = Phase::Open {
                until: self.clock.now() + self.config.open_duration,
            };
        }
    }
}

fn failure_rate(window: &VecDeque<bool>) -> f32 {
    if window.is_empty() {
        return 0.0;
    }
    let failures = window.iter().filter(|failed| **failed).count();
    failures as f32 * 100.0 / window.len() as f32
}
