//! Bounded in-memory translation cache.
//!
//! Key: the exact caption text. Eviction: oldest insert first once the
//! capacity is reached; entries never expire. Lookups go through `peek` and
//! inserts skip existing keys, so the recency list inside `LruCache` stays
//! in insertion order and the evicted tail is always the oldest entry.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Capacity used by the standard wiring.
pub const DEFAULT_CAPACITY: usize = 500;

pub struct TranslationCache {
    inner: Mutex<LruCache<String, String>>,
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).expect("cache capacity must be > 0"),
            )),
        }
    }

    /// Look up a cached translation without touching the eviction order.
    pub fn get(&self, text: &str) -> Option<String> {
        self.inner.lock().peek(text).cloned()
    }

    /// Insert a translation. A key that is already present keeps its
    /// original entry and position.
    pub fn insert(&self, text: &str, translated: &str) {
        let mut cache = self.inner.lock();
        if !cache.contains(text) {
            cache.put(text.to_string(), translated.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_insert_beyond_capacity() {
        let cache = TranslationCache::new(DEFAULT_CAPACITY);
        for i in 0..=DEFAULT_CAPACITY {
            cache.insert(&format!("key{i}"), &format!("value{i}"));
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        assert_eq!(cache.get("key0"), None);
        assert_eq!(cache.get("key1"), Some("value1".into()));
        assert_eq!(cache.get(&format!("key{DEFAULT_CAPACITY}")), Some(format!("value{DEFAULT_CAPACITY}")));
    }

    #[test]
    fn lookups_do_not_disturb_eviction_order() {
        let cache = TranslationCache::new(2);
        cache.insert("first", "1");
        cache.insert("second", "2");
        // a plain LRU would treat this as a use and evict "second" next
        assert_eq!(cache.get("first"), Some("1".into()));

        cache.insert("third", "3");
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("second"), Some("2".into()));
        assert_eq!(cache.get("third"), Some("3".into()));
    }

    #[test]
    fn duplicate_insert_keeps_original_entry() {
        let cache = TranslationCache::new(2);
        cache.insert("key", "original");
        cache.insert("key", "other");
        assert_eq!(cache.get("key"), Some("original".into()));
        assert_eq!(cache.len(), 1);
    }
}
