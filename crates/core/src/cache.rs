//! Bounded memoization with a TTL measured from insertion and LRU eviction.

use crate::error::{InsightsError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Stable key derived from a call's serialized arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hashes `scope` and the JSON encoding of `args`. Distinct scopes never
    /// share keys even when their arguments serialize identically.
    pub fn of<T: Serialize + ?Sized>(scope: &str, args: &T) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(scope.as_bytes());
        hasher.update(&[0]);
        serde_json::to_writer(&mut hasher, args)
            .map_err(|e| InsightsError::Fingerprint(e.to_string()))?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub ttl_seconds: u64,
    pub hits: u64,
    pub misses: u64,
    /// Live entries dropped to make room.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
}

struct Entry<V> {
    value: Arc<V>,
    inserted_at: Instant,
    tick: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    // tick -> key, oldest first
    recency: BTreeMap<u64, K>,
    next_tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn remove(&mut self, key: &K) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        Some(entry)
    }

    fn purge_expired(&mut self, now: Instant, ttl: Duration) {
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, e)| now.duration_since(e.inserted_at) >= ttl)
            .map(|(k, _)| k.clone())
            .collect();
        if !expired.is_empty() {
            tracing::debug!("Purging {} expired cache entries", expired.len());
        }
        for key in expired {
            self.remove(&key);
            self.expirations += 1;
        }
    }

    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            self.entries.remove(&key);
            self.evictions += 1;
            tracing::debug!("Cache full, evicted least recently used entry");
        }
    }
}

/// Thread-safe memo table. Values are shared as `Arc<V>`; computations run
/// outside the lock, so concurrent misses on one key may compute twice.
pub struct MemoCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V> MemoCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                next_tick: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            capacity: capacity.max(1),
            ttl,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a live entry and marks it most recently used. The entry's
    /// expiry is not extended.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let now = self.clock.now();
        let mut inner = self.lock();
        let expired = inner
            .entries
            .get(key)
            .map(|entry| now.duration_since(entry.inserted_at) >= self.ttl);
        match expired {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(true) => {
                tracing::debug!("Cache entry expired");
                inner.remove(key);
                inner.expirations += 1;
                inner.misses += 1;
                return None;
            }
            Some(false) => {}
        }
        let tick = inner.tick();
        let entry = inner.entries.get_mut(key)?;
        let old_tick = std::mem::replace(&mut entry.tick, tick);
        let value = Arc::clone(&entry.value);
        inner.recency.remove(&old_tick);
        inner.recency.insert(tick, key.clone());
        inner.hits += 1;
        Some(value)
    }

    /// Stores `value` with a fresh timestamp, evicting expired entries first
    /// and then the least recently used one if still at capacity.
    pub fn insert(&self, key: K, value: V) -> Arc<V> {
        let now = self.clock.now();
        let value = Arc::new(value);
        let mut inner = self.lock();
        inner.purge_expired(now, self.ttl);
        if inner.remove(&key).is_none() && inner.entries.len() >= self.capacity {
            inner.evict_lru();
        }
        let tick = inner.tick();
        inner.recency.insert(tick, key.clone());
        inner.entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                inserted_at: now,
                tick,
            },
        );
        value
    }

    /// Cached value for `key`, computing and storing it on a miss. Errors from
    /// `compute` propagate and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, compute: F) -> std::result::Result<Arc<V>, E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = compute()?;
        Ok(self.insert(key, value))
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.lock()
            .entries
            .values()
            .filter(|e| now.duration_since(e.inserted_at) < self.ttl)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let size = self.len();
        let inner = self.lock();
        CacheStats {
            size,
            capacity: self.capacity,
            ttl_seconds: self.ttl.as_secs(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}
