//! Bounded cache for resolved chapter maps
//!
//! Keyed by (attachment key, filename). Misses are cached too, so an
//! attachment with no extractable outline is probed once per process,
//! not once per rendered document.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::render::ChapterMap;

type CacheKey = (String, String);

pub struct ChapterMapCache {
    inner: Mutex<LruCache<CacheKey, Option<ChapterMap>>>,
}

impl ChapterMapCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(64).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Outer `None` = never probed; inner `None` = probed, no map.
    pub fn get(&self, key: &CacheKey) -> Option<Option<ChapterMap>> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: CacheKey, value: Option<ChapterMap>) {
        self.inner.lock().put(key, value);
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
    use crate::render::ChapterMapEntry;

    fn key(att: &str, file: &str) -> CacheKey {
        (att.to_string(), file.to_string())
    }

    #[test]
    fn test_round_trip() {
        let cache = ChapterMapCache::new(4);
        assert!(cache.get(&key("ATT001", "a.pdf")).is_none());

        let map = vec![ChapterMapEntry::new("Chapter 1", "1", 1)];
        cache.put(key("ATT001", "a.pdf"), Some(map.clone()));
        assert_eq!(cache.get(&key("ATT001", "a.pdf")), Some(Some(map)));
    }

    #[test]
    fn test_negative_result_is_cached() {
        let cache = ChapterMapCache::new(4);
        cache.put(key("ATT002", "b.pdf"), None);
        assert_eq!(cache.get(&key("ATT002", "b.pdf")), Some(None));
    }

    #[test]
    fn test_eviction_respects_capacity() {
        let cache = ChapterMapCache::new(2);
        cache.put(key("A", "a"), None);
        cache.put(key("B", "b"), None);
        cache.put(key("C", "c"), None);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("A", "a")).is_none());
    }
}
