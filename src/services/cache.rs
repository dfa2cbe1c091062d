// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Concurrent TTL cache used for generated summaries and sun times.
//!
//! Entries are evicted lazily when a lookup finds them expired, and by an
//! optional periodic sweep. Writes replace whole values; last write wins.

use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    Fresh(V),
    /// Expired and now evicted; handed back so callers can still fall
    /// back to it if the refresh fails.
    Stale(V),
    Miss,
}

impl<V> Lookup<V> {
    pub fn fresh(self) -> Option<V> {
        match self {
            Lookup::Fresh(v) => Some(v),
            _ => None,
        }
    }
}

/// Thread-safe TTL cache. Clones share storage.
pub struct TtlCache<K, V> {
    entries: Arc<DashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value only.
    pub fn get(&self, key: &K) -> Option<V> {
        self.lookup(key).fresh()
    }

    pub fn lookup(&self, key: &K) -> Lookup<V> {
        self.lookup_at(key, Instant::now())
    }

    pub fn lookup_at(&self, key: &K, now: Instant) -> Lookup<V> {
        let ttl = self.ttl;
        if let Some((_, expired)) = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired(now, ttl))
        {
            return Lookup::Stale(expired.value);
        }

        match self.entries.get(key) {
            Some(entry) => Lookup::Fresh(entry.value.clone()),
            None => Lookup::Miss,
        }
    }

    pub fn set(&self, key: K, value: V) {
        self.set_at(key, value, Instant::now());
    }

    pub fn set_at(&self, key: K, value: V, inserted_at: Instant) {
        self.entries.insert(key, Entry { value, inserted_at });
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now())
    }

    pub fn cleanup_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run [`cleanup`](Self::cleanup) every `period` until `shutdown` fires.
    pub fn spawn_sweeper(
        &self,
        name: &'static str,
        period: Duration,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = cache.cleanup();
                        if removed > 0 {
                            tracing::debug!(cache = name, removed, "Swept expired cache entries");
                        }
                    }
                }
            }
        })
    }
}
