//! Cache storage.
//!
//! Two stores back the revalidation layer:
//!
//! - [`QueryCache`]: store query results keyed by (query, params), each
//!   entry carrying its tag set and a TTL deadline.
//! - [`PageCache`]: rendered page payloads keyed by request path, standing
//!   in for the hosting platform's per-path page cache.
//!
//! Both use LRU eviction; expiry is observed lazily on read.

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use serde_json::Value;

use super::lock::{rw_read, rw_write};
use super::tags::CacheTag;

const SOURCE: &str = "cache::store";

const DEFAULT_QUERY_ENTRIES: NonZeroUsize = NonZeroUsize::new(256).unwrap();
const DEFAULT_PAGE_ENTRIES: NonZeroUsize = NonZeroUsize::new(128).unwrap();

/// Capacity limits for the cache stores.
#[derive(Debug, Clone, Copy)]
pub struct CacheLimits {
    pub query_entries: usize,
    pub page_entries: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self {
            query_entries: DEFAULT_QUERY_ENTRIES.get(),
            page_entries: DEFAULT_PAGE_ENTRIES.get(),
        }
    }
}

impl CacheLimits {
    fn query_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_entries).unwrap_or(DEFAULT_QUERY_ENTRIES)
    }

    fn page_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.page_entries).unwrap_or(DEFAULT_PAGE_ENTRIES)
    }
}

/// Identity of a cached query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub query_hash: u64,
    pub params_hash: u64,
}

impl QueryKey {
    pub fn new(query: &str, params: &Value) -> Self {
        Self {
            query_hash: hash_str(query),
            params_hash: hash_str(&params.to_string()),
        }
    }
}

fn hash_str(value: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

struct QueryEntry {
    payload: Value,
    tags: HashSet<CacheTag>,
    expires_at: Instant,
}

/// Tag-aware TTL cache for store query results.
pub struct QueryCache {
    entries: RwLock<LruCache<QueryKey, QueryEntry>>,
}

impl QueryCache {
    pub fn new(limits: &CacheLimits) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(limits.query_entries_non_zero())),
        }
    }

    /// Fresh payload for the key, or `None` when absent or past its
    /// deadline. Expired entries are dropped on observation.
    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        let mut entries = rw_write(&self.entries, SOURCE, "query_get");
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                counter!("vetrina_cache_query_hit_total").increment(1);
                Some(entry.payload.clone())
            }
            Some(_) => {
                entries.pop(key);
                counter!("vetrina_cache_query_expired_total").increment(1);
                None
            }
            None => {
                counter!("vetrina_cache_query_miss_total").increment(1);
                None
            }
        }
    }

    pub fn insert(&self, key: QueryKey, payload: Value, tags: HashSet<CacheTag>, ttl: Duration) {
        let entry = QueryEntry {
            payload,
            tags,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "query_insert").put(key, entry);
    }

    /// Drop every entry carrying `tag`. Returns the number of entries
    /// removed.
    pub fn invalidate_tag(&self, tag: &CacheTag) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "query_invalidate_tag");
        let affected: Vec<QueryKey> = entries
            .iter()
            .filter(|(_, entry)| entry.tags.contains(tag))
            .map(|(key, _)| *key)
            .collect();
        for key in &affected {
            entries.pop(key);
        }
        counter!("vetrina_cache_query_invalidated_total").increment(affected.len() as u64);
        affected.len()
    }

    /// Whether any live entry carries `tag`.
    pub fn has_tag(&self, tag: &CacheTag) -> bool {
        rw_read(&self.entries, SOURCE, "query_has_tag")
            .iter()
            .any(|(_, entry)| entry.tags.contains(tag))
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "query_clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "query_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cached rendered page payload.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

/// Path-keyed page cache invalidated by the revalidation webhook.
pub struct PageCache {
    pages: RwLock<LruCache<String, CachedPage>>,
}

impl PageCache {
    pub fn new(limits: &CacheLimits) -> Self {
        Self {
            pages: RwLock::new(LruCache::new(limits.page_entries_non_zero())),
        }
    }

    pub fn get(&self, path: &str) -> Option<CachedPage> {
        let mut pages = rw_write(&self.pages, SOURCE, "page_get");
        let hit = pages.get(path).cloned();
        match hit {
            Some(page) => {
                counter!("vetrina_cache_page_hit_total").increment(1);
                Some(page)
            }
            None => {
                counter!("vetrina_cache_page_miss_total").increment(1);
                None
            }
        }
    }

    pub fn insert(&self, path: impl Into<String>, page: CachedPage) {
        rw_write(&self.pages, SOURCE, "page_insert").put(path.into(), page);
    }

    /// Drop the cached payload for one path, if present.
    pub fn invalidate_path(&self, path: &str) -> bool {
        let removed = rw_write(&self.pages, SOURCE, "page_invalidate")
            .pop(path)
            .is_some();
        if removed {
            counter!("vetrina_cache_page_invalidated_total").increment(1);
        }
        removed
    }

    pub fn contains(&self, path: &str) -> bool {
        rw_read(&self.pages, SOURCE, "page_contains").contains(path)
    }

    pub fn clear(&self) {
        rw_write(&self.pages, SOURCE, "page_clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.pages, SOURCE, "page_len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
