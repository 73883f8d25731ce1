//! Time abstraction so stages and tests never call wall-clock functions directly.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of time for the scheduler and for timestamps recorded in spans/actions.
///
/// Implementations must be cheap to call repeatedly (every stage tick reads it).
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the Unix epoch.
    fn epoch_ms(&self) -> i64;
}

/// Real wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests. Starts at a fixed instant and only advances
/// when told to, so assertions about ordering and timeouts are reproducible.
#[derive(Debug)]
pub struct FakeClock {
    now_ms: AtomicI64,
}

impl FakeClock {
    pub fn new(start_ms: i64) -> Self {
        Self { now_ms: AtomicI64::new(start_ms) }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Lets a clock be shared across spawned tasks (the scheduler holds one
/// `Arc<C>` and hands it to every stage worker) without losing the `Clock`
/// bound stage code depends on.
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn epoch_ms(&self) -> i64 {
        (**self).epoch_ms()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
