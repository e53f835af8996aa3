//! In-process key/value store with per-entry time-to-live.
//!
//! Every `set` schedules a removal on the injected [`Scheduler`], so memory is
//! reclaimed when an entry expires rather than on its next read. Reads also
//! compare against the scheduler clock, which keeps an entry unobservable past
//! its deadline even when the removal task runs late.
//!
//! A bounded cache also evicts its least recently used entry once full.

use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use super::lock::{rw_read, rw_write};
use super::scheduler::{Scheduler, TimerHandle};

const SOURCE: &str = "cache::store";

pub(crate) const METRIC_CACHE_HIT: &str = "finblog_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "finblog_cache_miss_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "finblog_cache_expired_total";
pub(crate) const METRIC_CACHE_INVALIDATED: &str = "finblog_cache_invalidated_total";
pub(crate) const METRIC_CACHE_EVICTED: &str = "finblog_cache_evicted_total";

struct Entry<V> {
    value: V,
    expires_at: Instant,
    generation: u64,
    timer: TimerHandle,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

struct Entries<V> {
    map: LruCache<String, Entry<V>>,
    next_generation: u64,
}

/// TTL cache keyed by string.
///
/// Cloning is cheap and yields a handle to the same entries.
pub struct TtlCache<V> {
    name: &'static str,
    default_ttl: Duration,
    scheduler: Arc<dyn Scheduler>,
    entries: Arc<RwLock<Entries<V>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            default_ttl: self.default_ttl,
            scheduler: self.scheduler.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, default_ttl: Duration, scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_map(name, default_ttl, scheduler, LruCache::unbounded())
    }

    /// Like [`TtlCache::new`], but holds at most `capacity` entries.
    pub fn bounded(
        name: &'static str,
        default_ttl: Duration,
        capacity: NonZeroUsize,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self::with_map(name, default_ttl, scheduler, LruCache::new(capacity))
    }

    fn with_map(
        name: &'static str,
        default_ttl: Duration,
        scheduler: Arc<dyn Scheduler>,
        map: LruCache<String, Entry<V>>,
    ) -> Self {
        Self {
            name,
            default_ttl,
            scheduler,
            entries: Arc::new(RwLock::new(Entries {
                map,
                next_generation: 0,
            })),
        }
    }

    pub fn capacity(&self) -> NonZeroUsize {
        rw_read(&self.entries, SOURCE, "capacity").map.cap()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Look up a live entry. Never-set, deleted and expired keys are all a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        // Write lock: a read promotes the entry in the LRU order.
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let now = self.scheduler.now();

        match entries.map.get(key) {
            Some(entry) if entry.is_live(now) => {
                counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
                Some(entry.value.clone())
            }
            _ => {
                counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl` (or the cache default).
    ///
    /// Any previous value and its pending expiry are replaced under the same
    /// write lock, so the old timer can neither fire against the new value nor
    /// leave a window where both are armed.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let ttl = ttl.unwrap_or(self.default_ttl);

        let mut entries = rw_write(&self.entries, SOURCE, "set");
        entries.next_generation += 1;
        let generation = entries.next_generation;

        if let Some(previous) = entries.map.pop(&key) {
            previous.timer.cancel();
        }

        let expires_at = self.scheduler.now() + ttl;
        let timer = self.schedule_expiry(key.clone(), generation, ttl);
        let evicted = entries.map.push(
            key,
            Entry {
                value,
                expires_at,
                generation,
                timer,
            },
        );

        // The key was popped above, so anything handed back is a capacity eviction.
        if let Some((evicted_key, entry)) = evicted {
            entry.timer.cancel();
            counter!(METRIC_CACHE_EVICTED, "cache" => self.name).increment(1);
            debug!(cache = self.name, key = %evicted_key, "Cache entry evicted");
        }

        debug!(
            cache = self.name,
            ttl_ms = ttl.as_millis() as u64,
            entries = entries.map.len(),
            "Cache entry stored"
        );
    }

    /// Remove `key` and cancel its expiry. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        let removed = rw_write(&self.entries, SOURCE, "delete").map.pop(key);
        if let Some(entry) = removed {
            entry.timer.cancel();
            counter!(METRIC_CACHE_INVALIDATED, "cache" => self.name).increment(1);
            debug!(cache = self.name, key, "Cache entry deleted");
        }
    }

    /// Remove every entry and cancel every pending expiry.
    pub fn flush(&self) {
        let drained: Vec<Entry<V>> = {
            let mut entries = rw_write(&self.entries, SOURCE, "flush");
            std::iter::from_fn(|| entries.map.pop_lru())
                .map(|(_, entry)| entry)
                .collect()
        };

        let removed = drained.len();
        for entry in drained {
            entry.timer.cancel();
        }

        if removed > 0 {
            counter!(METRIC_CACHE_INVALIDATED, "cache" => self.name).increment(removed as u64);
        }
        debug!(cache = self.name, removed, "Cache flushed");
    }

    pub fn has(&self, key: &str) -> bool {
        let now = self.scheduler.now();
        rw_read(&self.entries, SOURCE, "has")
            .map
            .peek(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Number of live entries.
    pub fn size(&self) -> usize {
        let now = self.scheduler.now();
        rw_read(&self.entries, SOURCE, "size")
            .map
            .iter()
            .filter(|(_, entry)| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn schedule_expiry(&self, key: String, generation: u64, ttl: Duration) -> TimerHandle {
        let entries = Arc::downgrade(&self.entries);
        let name = self.name;

        self.scheduler.after(
            ttl,
            Box::new(move || {
                let Some(entries) = entries.upgrade() else {
                    return;
                };
                let mut guard = rw_write(&entries, SOURCE, "expire");
                // A newer `set` for the same key carries a higher generation.
                let current = guard
                    .map
                    .peek(&key)
                    .is_some_and(|entry| entry.generation == generation);
                if current {
                    guard.map.pop(&key);
                    counter!(METRIC_CACHE_EXPIRED, "cache" => name).increment(1);
                    debug!(cache = name, key = %key, "Cache entry expired");
                }
            }),
        )
    }
}
