//! Fixed-window counter storage.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Result;

/// A key that uniquely identifies one counter: a tier evaluated for one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    /// The tier this counter belongs to
    pub tier: String,
    /// The client the counter partitions by
    pub client: String,
}

impl CounterKey {
    /// Create a new counter key.
    pub fn new(tier: &str, client: &str) -> Self {
        Self {
            tier: tier.to_string(),
            client: client.to_string(),
        }
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tier, self.client)
    }
}

/// Outcome of a single check-and-increment round.
#[derive(Debug, Clone, Copy)]
pub struct CounterDecision {
    /// Whether the call fits within the limit
    pub admitted: bool,
    /// Quota left in the current window after this call
    pub remaining: u64,
    /// Time until the current window resets
    pub retry_after: Duration,
}

/// Trait for counter store implementations.
///
/// Abstracts over the in-memory store and any serializing external backend.
/// Implementations must make the expiry-reset and increment a single atomic
/// step per key; rejected calls still count against the window.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Count one call against `(tier, client)` and report whether it fits
    /// within `limit` for the current window.
    ///
    /// Errors signal an unreachable or inconsistent backend and must never be
    /// treated as an admit-or-deny decision.
    async fn check_and_increment(
        &self,
        tier: &str,
        client: &str,
        window: Duration,
        limit: u64,
    ) -> Result<CounterDecision>;
}

/// Per-key counter state.
#[derive(Debug)]
struct WindowCounter {
    count: u64,
    window_start: Instant,
    window: Duration,
}

impl WindowCounter {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            window_start: now,
            window,
        }
    }
}

/// In-memory fixed-window counter store.
///
/// Counters are kept in a concurrent map of per-key locks, so contention is
/// limited to calls sharing the same `(tier, client)` pair.
pub struct MemoryCounterStore {
    entries: DashMap<CounterKey, Arc<Mutex<WindowCounter>>>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Get the current counter value for a `(tier, client)` pair.
    ///
    /// Returns `None` if no counter exists for the key.
    pub fn current_count(&self, tier: &str, client: &str) -> Option<u64> {
        self.entries
            .get(&CounterKey::new(tier, client))
            .map(|cell| cell.lock().count)
    }

    /// Drop counters that have sat idle past their window.
    ///
    /// An entry is only dropped after a full extra window beyond expiry, so a
    /// racing increment on a just-expired entry cannot be lost.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cell| {
            let counter = cell.lock();
            counter.window_start.elapsed() < counter.window.saturating_mul(2)
        });
        before.saturating_sub(self.entries.len())
    }

    /// Number of live counters.
    pub fn counter_count(&self) -> usize {
        self.entries.len()
    }

    /// Clear all counters.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn check_and_increment(
        &self,
        tier: &str,
        client: &str,
        window: Duration,
        limit: u64,
    ) -> Result<CounterDecision> {
        let key = CounterKey::new(tier, client);
        let now = Instant::now();

        let cell = self
            .entries
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(WindowCounter::new(now, window))))
            .clone();

        // The shard guard is released above; only calls for this exact key
        // serialize on the counter lock.
        let mut counter = cell.lock();
        if now.duration_since(counter.window_start) >= window {
            counter.count = 0;
            counter.window_start = now;
        }
        counter.window = window;
        counter.count += 1;

        let admitted = counter.count <= limit;
        let remaining = limit.saturating_sub(counter.count);
        let elapsed = now.duration_since(counter.window_start);

        Ok(CounterDecision {
            admitted,
            remaining,
            retry_after: window.saturating_sub(elapsed),
        })
    }
}
