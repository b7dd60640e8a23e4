//! Time-bounded cache for loaded records

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of the current time in epoch milliseconds
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Single-value cache that expires `ttl_ms` after insertion
#[derive(Debug)]
pub struct TtlCache<T, C: Clock> {
    entry: Option<(T, i64)>,
    ttl_ms: i64,
    clock: C,
}

impl<T: Clone, C: Clock> TtlCache<T, C> {
    pub fn new(ttl_ms: i64, clock: C) -> Self {
        Self {
            entry: None,
            ttl_ms,
            clock,
        }
    }

    /// Cached value if it is younger than the TTL
    pub fn get(&self) -> Option<T> {
        let (value, stored_at) = self.entry.as_ref()?;
        let age = self.clock.now_millis().saturating_sub(*stored_at);
        (age < self.ttl_ms).then(|| value.clone())
    }

    pub fn insert(&mut self, value: T) {
        self.entry = Some((value, self.clock.now_millis()));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
