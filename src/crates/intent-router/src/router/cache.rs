//! Classification result cache
//!
//! A bounded LRU map with a per-entry expiry timestamp. Expiry is checked
//! lazily on read; [`ResultCache::purge_expired`] sweeps the rest. Every
//! operation, including the recency update of a read, runs under one mutex.
//!
//! Inserts from the selector carry the configuration epoch they were
//! computed against. A reload bumps the cache epoch and wipes the entries,
//! and inserts from an older epoch are dropped.

use crate::context::{recent, ConversationTurn, CACHE_KEY_WINDOW};
use crate::router::types::{ClassificationResult, ClassifyOptions};
use crate::Result;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Cached value with its absolute expiry time
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub capacity: usize,
    pub epoch: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Outcome of [`ResultCache::insert_if_absent`]
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<V> {
    /// The value is now cached
    Inserted,
    /// A live value was already cached for the key; it is returned instead
    Existing(V),
    /// The value was computed against an older epoch and was dropped
    Stale,
}

struct CacheState<V> {
    entries: LruCache<String, CacheEntry<V>>,
    ttl: Duration,
    epoch: u64,
    stats: CacheStats,
}

/// Capacity- and TTL-bounded LRU cache
pub struct ResultCache<V = ClassificationResult> {
    state: Mutex<CacheState<V>>,
}

impl<V: Clone> ResultCache<V> {
    /// Create a cache holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                ttl,
                epoch: 0,
                stats: CacheStats {
                    capacity: capacity.get(),
                    ..CacheStats::default()
                },
            }),
        }
    }

    /// Look up `key`, refreshing its recency on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let now = Instant::now();

        let expired = match state.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                state.stats.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            state.entries.pop(key);
            state.stats.expirations += 1;
            trace!(key = %key, "Cache entry expired");
        }
        state.stats.misses += 1;
        None
    }

    /// Insert or overwrite `key`, evicting the least recently used entry
    /// when full
    pub fn set(&self, key: impl Into<String>, value: V) {
        let mut state = self.state.lock();
        Self::push(&mut state, key.into(), value);
    }

    /// Insert `key` unless a live entry exists or `epoch` is outdated
    pub fn insert_if_absent(&self, key: impl Into<String>, value: V, epoch: u64) -> InsertOutcome<V> {
        let key = key.into();
        let mut state = self.state.lock();

        if epoch != state.epoch {
            trace!(key = %key, epoch, current = state.epoch, "Dropping stale cache insert");
            return InsertOutcome::Stale;
        }

        let now = Instant::now();
        if let Some(entry) = state.entries.peek(&key) {
            if !entry.is_expired(now) {
                return InsertOutcome::Existing(entry.value.clone());
            }
        }

        Self::push(&mut state, key, value);
        InsertOutcome::Inserted
    }

    fn push(state: &mut CacheState<V>, key: String, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + state.ttl,
        };
        if let Some((evicted, _)) = state.entries.push(key.clone(), entry) {
            if evicted != key {
                state.stats.evictions += 1;
                trace!(key = %evicted, "Evicted least recently used cache entry");
            }
        }
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Remove every entry and move to a new epoch with new bounds
    pub fn reconfigure(&self, capacity: usize, ttl: Duration, epoch: u64) {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        let mut state = self.state.lock();
        state.entries.clear();
        state.entries.resize(capacity);
        state.ttl = ttl;
        state.epoch = epoch;
        state.stats.capacity = capacity.get();
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut state = self.state.lock();
        let now = Instant::now();

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.entries.pop(key);
        }
        state.stats.expirations += expired.len() as u64;
        expired.len()
    }

    /// Number of entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains(key)
    }

    pub fn ttl(&self) -> Duration {
        self.state.lock().ttl
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            epoch: state.epoch,
            ..state.stats.clone()
        }
    }
}

/// Digest of everything a classification depends on
///
/// Covers the message, the serialized options and the contents of the last
/// four context messages. Each part is length-prefixed so boundaries cannot
/// shift between parts.
pub fn cache_key(
    message: &str,
    options: &ClassifyOptions,
    context: &[ConversationTurn],
) -> Result<String> {
    let mut hasher = Sha256::new();

    let mut update = |bytes: &[u8]| {
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    };

    update(message.as_bytes());
    update(&serde_json::to_vec(options)?);
    for turn in recent(context, CACHE_KEY_WINDOW) {
        update(turn.content.as_bytes());
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> ResultCache<&'static str> {
        ResultCache::new(capacity, Duration::from_secs(300))
    }

    #[test]
    fn test_get_and_set() {
        let cache = cache(4);
        assert_eq!(cache.get("a"), None);

        cache.set("a", "one");
        assert_eq!(cache.get("a"), Some("one"));

        cache.set("a", "uno");
        assert_eq!(cache.get("a"), Some("uno"));
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = cache(3);
        cache.set("a", "1");
        cache.set("b", "2");
        cache.set("c", "3");
        cache.set("d", "4");

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_protects_from_eviction() {
        let cache = cache(3);
        cache.set("a", "1");
        cache.set("b", "2");
        cache.set("c", "3");
        assert_eq!(cache.get("a"), Some("1"));

        cache.set("d", "4");

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = cache(0);
        cache.set("a", "1");
        cache.set("b", "2");
        assert_eq!(cache.stats().capacity, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("b"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache: ResultCache<u32> = ResultCache::new(10, Duration::from_secs(5));
        cache.set("a", 1);

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(cache.get("a"), Some(1));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache: ResultCache<u32> = ResultCache::new(10, Duration::from_secs(5));
        cache.set("old-1", 1);
        cache.set("old-2", 2);
        tokio::time::advance(Duration::from_secs(3)).await;
        cache.set("fresh", 3);
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(cache.purge_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(3));
    }

    #[test]
    fn test_insert_if_absent_first_writer_wins() {
        let cache = cache(4);
        assert_eq!(cache.insert_if_absent("k", "first", 0), InsertOutcome::Inserted);
        assert_eq!(
            cache.insert_if_absent("k", "second", 0),
            InsertOutcome::Existing("first")
        );
        assert_eq!(cache.get("k"), Some("first"));
    }

    #[test]
    fn test_insert_from_old_epoch_dropped() {
        let cache = cache(4);
        cache.set("k", "v");
        cache.reconfigure(8, Duration::from_secs(60), 1);

        assert!(cache.is_empty());
        assert_eq!(cache.stats().capacity, 8);
        assert_eq!(cache.ttl(), Duration::from_secs(60));
        assert_eq!(cache.insert_if_absent("k", "old", 0), InsertOutcome::Stale);
        assert!(cache.is_empty());
        assert_eq!(cache.insert_if_absent("k", "new", 1), InsertOutcome::Inserted);
        assert_eq!(cache.epoch(), 1);
    }

    #[test]
    fn test_cache_key_depends_on_every_part() {
        let options = ClassifyOptions::default();
        let context = vec![ConversationTurn::user("earlier")];

        let base = cache_key("plan a task", &options, &context).unwrap();
        assert_eq!(base, cache_key("plan a task", &options, &context).unwrap());
        assert_eq!(base.len(), 64);

        assert_ne!(base, cache_key("plan a task!", &options, &context).unwrap());
        assert_ne!(base, cache_key("plan a task", &options, &[]).unwrap());
        assert_ne!(
            base,
            cache_key("plan a task", &options.clone().with_threshold(0.9), &context).unwrap()
        );
    }

    #[test]
    fn test_cache_key_uses_last_four_messages() {
        let options = ClassifyOptions::default();
        let tail: Vec<ConversationTurn> =
            (0..4).map(|i| ConversationTurn::user(format!("m{}", i))).collect();
        let mut longer = vec![ConversationTurn::user("ancient")];
        longer.extend(tail.clone());

        assert_eq!(
            cache_key("hi", &options, &tail).unwrap(),
            cache_key("hi", &options, &longer).unwrap()
        );
    }

    #[test]
    fn test_cache_key_part_boundaries() {
        let options = ClassifyOptions::default();
        let a = cache_key("ab", &options, &[ConversationTurn::user("c")]).unwrap();
        let b = cache_key("a", &options, &[ConversationTurn::user("bc")]).unwrap();
        assert_ne!(a, b);
    }
}
