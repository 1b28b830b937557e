//! Cache storage.
//!
//! Each derived listing lives in its own bounded LRU with a per-entry
//! deadline. Expired entries are dropped on read.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;

use crate::domain::availability::FacetAvailability;
use crate::domain::categories::CategoryNode;
use crate::domain::entities::Author;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

pub const METRIC_CACHE_HIT: &str = "resource_facets_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "resource_facets_cache_miss_total";
pub const METRIC_CACHE_EVICT: &str = "resource_facets_cache_evict_total";
pub const METRIC_CACHE_EXPIRED: &str = "resource_facets_cache_expired_total";

#[derive(Clone)]
struct Entry<V> {
    value: V,
    /// `None` when the lifetime reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// Bounded LRU whose entries expire after a fixed time-to-live.
pub struct TtlCache<V> {
    name: &'static str,
    ttl: Duration,
    entries: RwLock<LruCache<u64, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(name: &'static str, capacity: std::num::NonZeroUsize, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.get_at(key.signature(), Instant::now())
    }

    fn get_at(&self, signature: u64, now: Instant) -> Option<V> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(&signature) {
            Some(entry) if entry.expires_at.is_none_or(|deadline| deadline > now) => {
                counter!(METRIC_CACHE_HIT, "cache" => self.name).increment(1);
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.pop(&signature);
                counter!(METRIC_CACHE_EXPIRED, "cache" => self.name).increment(1);
                counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
                None
            }
            None => {
                counter!(METRIC_CACHE_MISS, "cache" => self.name).increment(1);
                None
            }
        }
    }

    pub fn put(&self, key: &CacheKey, value: V) {
        let signature = key.signature();
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(self.ttl),
        };
        let evicted = rw_write(&self.entries, SOURCE, "put").push(signature, entry);
        if let Some((evicted_signature, _)) = evicted
            && evicted_signature != signature
        {
            counter!(METRIC_CACHE_EVICT, "cache" => self.name).increment(1);
        }
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The caches behind facet availability, category trees and author lists.
pub struct ListingCache {
    enabled: bool,
    availability: TtlCache<FacetAvailability>,
    trees: TtlCache<Vec<CategoryNode>>,
    authors: TtlCache<Vec<Author>>,
}

impl ListingCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            availability: TtlCache::new(
                "availability",
                config.availability_limit_non_zero(),
                config.ttl,
            ),
            trees: TtlCache::new("category_tree", config.tree_limit_non_zero(), config.ttl),
            authors: TtlCache::new("authors", config.author_limit_non_zero(), config.ttl),
        }
    }

    /// A cache that stores nothing and always misses.
    pub fn disabled() -> Self {
        Self::new(&CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get_availability(&self, key: &CacheKey) -> Option<FacetAvailability> {
        self.enabled.then(|| self.availability.get(key)).flatten()
    }

    pub fn put_availability(&self, key: &CacheKey, value: FacetAvailability) {
        if self.enabled {
            self.availability.put(key, value);
        }
    }

    pub fn get_tree(&self, key: &CacheKey) -> Option<Vec<CategoryNode>> {
        self.enabled.then(|| self.trees.get(key)).flatten()
    }

    pub fn put_tree(&self, key: &CacheKey, value: Vec<CategoryNode>) {
        if self.enabled {
            self.trees.put(key, value);
        }
    }

    pub fn get_authors(&self, key: &CacheKey) -> Option<Vec<Author>> {
        self.enabled.then(|| self.authors.get(key)).flatten()
    }

    pub fn put_authors(&self, key: &CacheKey, value: Vec<Author>) {
        if self.enabled {
            self.authors.put(key, value);
        }
    }

    /// Drop every cached listing, e.g. after the corpus changed.
    pub fn clear(&self) {
        self.availability.clear();
        self.trees.clear();
        self.authors.clear();
    }
}
