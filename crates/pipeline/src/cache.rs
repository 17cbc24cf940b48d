//! Time-bounded in-memory cache keyed by share token.
//!
//! Entries live for the process lifetime at most; there is no persistence.
//! Every operation takes the map lock once, so a `get` never observes a
//! half-written entry and concurrent `insert`s for the same key resolve to
//! one of the written values.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::{ResolvedArtifact, ShareToken};

/// Default time-to-live for resolved artifacts (20 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(1200);

/// Cache of resolved artifacts, shared by the orchestrator and the boundary.
pub type ArtifactCache = TtlCache<ShareToken, ResolvedArtifact>;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A map whose entries expire a fixed time after they were written.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The time-to-live applied by [`insert`](Self::insert).
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the value for `key` if it has not expired.
    ///
    /// An expired entry is removed.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                debug!("cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Stores `value` for `key` with the cache's TTL, replacing any prior entry.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.ttl);
    }

    /// Stores `value` for `key` with an explicit TTL.
    ///
    /// Expired entries for other keys are purged on the way.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.is_fresh(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "expired cache entries dropped on insert");
        }
        entries.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| e.is_fresh(now));
        before - entries.len()
    }

    /// Number of stored entries, including ones that expired but were not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
