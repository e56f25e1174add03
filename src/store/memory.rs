//! In-process counter store.
//!
//! Counters live in a `DashMap`; the shard lock held by `entry()` makes the
//! check-expiry-then-increment step atomic per key. Expired entries are reset
//! on their next increment and purged in bulk by [`MemoryStore::run_sweeper`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::store::{CounterStore, StoreResult};

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u64,
    expires_at: Instant,
}

impl CounterEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A thread-safe, single-process counter store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    counters: Arc<DashMap<String, CounterEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count for a live key.
    pub fn get(&self, key: &str) -> Option<u64> {
        let now = Instant::now();
        self.counters
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.count)
    }

    /// Number of tracked keys, expired or not.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Drop expired counters. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.counters.len();
        self.counters.retain(|_, e| !e.is_expired(now));
        before.saturating_sub(self.counters.len())
    }

    /// Periodically purge expired counters until shutdown.
    pub async fn run_sweeper(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval(interval);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.purge_expired();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = self.len(), "Purged expired counters");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Counter sweeper stopping");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn increment(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let now = Instant::now();
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert(CounterEntry {
                count: 0,
                expires_at: now + ttl,
            });

        if entry.is_expired(now) {
            *entry = CounterEntry {
                count: 0,
                expires_at: now + ttl,
            };
        }
        entry.count += 1;
        Ok(entry.count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        if let Some(mut entry) = self.counters.get_mut(key) {
            entry.expires_at = Instant::now() + ttl;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
