//! Expiring storage for rendered index responses.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::clock::Clock;
use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::rw_write;

/// A rendered response held verbatim until its window elapses.
#[derive(Clone)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

struct Entry {
    page: CachedPage,
    expires_at: Instant,
}

/// key → (response, expiry) map with LRU capping.
///
/// Writes to the underlying entities never touch this store; entries age
/// out on their own or disappear via [`ResponseStore::invalidate_all`].
/// Concurrent repopulation after expiry is allowed to race: the value is
/// derived and recomputable, so the last writer simply wins.
pub struct ResponseStore {
    entries: RwLock<LruCache<CacheKey, Entry>>,
    ttl: std::time::Duration,
    clock: Arc<dyn Clock>,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            ttl: config.ttl,
            clock,
        }
    }

    /// Fetch a live entry. Expired entries are dropped on the way out and
    /// reported as misses.
    pub fn get(&self, key: &CacheKey) -> Option<CachedPage> {
        let now = self.clock.now();
        let mut entries = rw_write(&self.entries, "get");

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                counter!("rostra_cache_hit_total").increment(1);
                Some(entry.page.clone())
            }
            Some(_) => {
                entries.pop(key);
                counter!("rostra_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("rostra_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn insert(&self, key: CacheKey, page: CachedPage) {
        let expires_at = self.clock.now() + self.ttl;
        let mut entries = rw_write(&self.entries, "insert");
        if entries.push(key, Entry { page, expires_at }).is_some() {
            counter!("rostra_cache_evict_total").increment(1);
        }
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.entries, "invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        rw_write(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::time::Duration;

    use super::super::clock::ManualClock;
    use super::*;

    fn page(body: &str) -> CachedPage {
        CachedPage {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    fn store_with_clock() -> (ResponseStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = ResponseStore::new(&CacheConfig::default(), clock.clone());
        (store, clock)
    }

    #[test]
    fn serves_entry_within_window() {
        let (store, clock) = store_with_clock();
        let key = CacheKey::for_request("/", "");

        store.insert(key.clone(), page("rendered"));
        clock.advance(Duration::from_secs(19));

        let cached = store.get(&key).expect("entry still live");
        assert_eq!(cached.body, Bytes::from("rendered"));
    }

    #[test]
    fn entry_expires_after_window() {
        let (store, clock) = store_with_clock();
        let key = CacheKey::for_request("/", "");

        store.insert(key.clone(), page("rendered"));
        clock.advance(Duration::from_secs(21));

        assert!(store.get(&key).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn entry_survives_writes_until_expiry() {
        // The defining trade of this cache: nothing that happens to the
        // underlying posts changes a live entry.
        let (store, clock) = store_with_clock();
        let key = CacheKey::for_request("/", "");

        store.insert(key.clone(), page("post body"));
        clock.advance(Duration::from_secs(5));
        let stale = store.get(&key).expect("entry live");
        assert_eq!(stale.body, Bytes::from("post body"));

        store.invalidate_all();
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn last_writer_wins_on_repopulation() {
        let (store, _clock) = store_with_clock();
        let key = CacheKey::for_request("/", "");

        store.insert(key.clone(), page("first render"));
        store.insert(key.clone(), page("second render"));

        let cached = store.get(&key).expect("entry live");
        assert_eq!(cached.body, Bytes::from("second render"));
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let store = ResponseStore::new(&config, clock);

        let first = CacheKey::for_request("/", "page=1");
        let second = CacheKey::for_request("/", "page=2");
        let third = CacheKey::for_request("/", "page=3");

        store.insert(first.clone(), page("1"));
        store.insert(second.clone(), page("2"));
        store.insert(third.clone(), page("3"));

        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
        assert!(store.get(&third).is_some());
    }

    #[test]
    fn store_recovers_from_poisoned_lock() {
        let (store, _clock) = store_with_clock();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.write().expect("lock acquired");
            panic!("poison entries lock");
        }));

        let key = CacheKey::for_request("/", "");
        store.insert(key.clone(), page("after poison"));
        assert!(store.get(&key).is_some());
    }
}
