//! Compiled selector cache using moka
//!
//! Patterns arrive as text on every call. Compiling them is cheap but not
//! free, and bulk callers send the same handful of patterns repeatedly.

use std::sync::Arc;

use moka::sync::Cache;
use script_query::{Selector, SelectorError};

/// Bounded cache of compiled selectors keyed by pattern text
///
/// Entries are never mutated after insertion, so one cache can be shared
/// by every thread using an engine.
#[derive(Debug, Clone)]
pub struct SelectorCache {
    inner: Option<Cache<String, Arc<Selector>>>,
}

impl SelectorCache {
    /// Create cache with max capacity; 0 disables caching
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: (max_capacity > 0).then(|| Cache::new(max_capacity)),
        }
    }

    /// Cache that compiles on every lookup
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Check if compiled selectors are kept
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Get a compiled selector, compiling and caching on miss
    ///
    /// Concurrent misses on one pattern compile it once. Failures are not
    /// cached.
    ///
    /// # Errors
    /// Returns [`SelectorError`] if the pattern does not compile
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Selector>, SelectorError> {
        let Some(cache) = &self.inner else {
            return Selector::parse(pattern).map(Arc::new);
        };

        cache
            .try_get_with_by_ref(pattern, || Selector::parse(pattern).map(Arc::new))
            .map_err(|e| SelectorError::clone(&e))
    }

    /// Check if a pattern is cached
    #[inline]
    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|cache| cache.contains_key(pattern))
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.as_ref().map_or(0, Cache::entry_count)
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

impl Default for SelectorCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_compiled_selector() {
        let cache = SelectorCache::new(16);
        let first = cache.get_or_compile("$..props").unwrap();
        let second = cache.get_or_compile("$..props").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains("$..props"));
    }

    #[test]
    fn concurrent_lookups_share_one_entry() {
        let cache = SelectorCache::new(16);
        let compiled: Vec<Arc<Selector>> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| cache.get_or_compile("$..identification").unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        });
        assert!(compiled.iter().all(|s| Arc::ptr_eq(s, &compiled[0])));
    }

    #[test]
    fn failure_keeps_error_position() {
        let cache = SelectorCache::new(16);
        let err = cache.get_or_compile("props").unwrap_err();
        assert_eq!(err, Selector::parse("props").unwrap_err());
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = SelectorCache::new(16);
        assert!(cache.get_or_compile("$..[?(").is_err());
        assert!(!cache.contains("$..[?("));
    }

    #[test]
    fn disabled_cache_still_compiles() {
        let cache = SelectorCache::new(0);
        assert!(!cache.is_enabled());
        let selector = cache.get_or_compile("$..children").unwrap();
        assert_eq!(*selector, Selector::children());
        assert!(!cache.contains("$..children"));
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn invalidate_all_clears_entries() {
        let cache = SelectorCache::new(16);
        cache.get_or_compile("$..props").unwrap();
        cache.invalidate_all();
        assert!(!cache.contains("$..props"));
    }
}
