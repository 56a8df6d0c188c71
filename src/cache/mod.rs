//! Kernel cache
//!
//! LRU cache for kernel matrix entries used while solving one SMO problem.
//! Kernel matrices are symmetric, so K(i, j) and K(j, i) share one slot.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Bytes budgeted per cached entry (key, value and LRU bookkeeping)
const BYTES_PER_ENTRY: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    i: usize,
    j: usize,
}

impl CacheKey {
    /// Normalized key with i <= j
    fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self { i, j }
        } else {
            Self { i: j, j: i }
        }
    }
}

/// LRU cache for kernel matrix values
pub struct KernelCache {
    cache: LruCache<CacheKey, f64>,
    hits: u64,
    misses: u64,
}

impl KernelCache {
    /// Create a new kernel cache holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a kernel cache sized from a memory budget in bytes, never larger
    /// than the full upper triangle of an `n_samples` kernel matrix
    pub fn for_problem(memory_bytes: usize, n_samples: usize) -> Self {
        let full_matrix = n_samples.saturating_mul(n_samples + 1) / 2;
        Self::new((memory_bytes / BYTES_PER_ENTRY).min(full_matrix.max(1)))
    }

    /// Get a kernel value from cache
    pub fn get(&mut self, i: usize, j: usize) -> Option<f64> {
        match self.cache.get(&CacheKey::new(i, j)) {
            Some(&value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Put a kernel value into cache
    pub fn put(&mut self, i: usize, j: usize, value: f64) {
        self.cache.put(CacheKey::new(i, j), value);
    }

    /// Return the cached K(i, j) or compute and remember it
    pub fn get_or_compute<F>(&mut self, i: usize, j: usize, compute: F) -> f64
    where
        F: FnOnce() -> f64,
    {
        if let Some(value) = self.get(i, j) {
            return value;
        }
        let value = compute();
        self.put(i, j, value);
        value
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(CacheKey::new(1, 5), CacheKey::new(5, 1));
        assert_eq!(CacheKey::new(5, 1).i, 1);
    }

    #[test]
    fn test_kernel_cache_symmetric_access() {
        let mut cache = KernelCache::new(3);

        assert_eq!(cache.get(0, 1), None);
        cache.put(0, 1, 5.0);
        assert_eq!(cache.get(1, 0), Some(5.0));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_get_or_compute_only_computes_once() {
        let mut cache = KernelCache::new(4);
        let mut calls = 0;

        let first = cache.get_or_compute(2, 3, || {
            calls += 1;
            7.5
        });
        let second = cache.get_or_compute(3, 2, || {
            calls += 1;
            0.0
        });

        assert_eq!(first, 7.5);
        assert_eq!(second, 7.5);
        assert_eq!(calls, 1);
        assert_eq!(cache.hit_rate(), 0.5);
    }

    #[test]
    fn test_kernel_cache_lru_eviction() {
        let mut cache = KernelCache::new(2);

        cache.put(0, 1, 1.0);
        cache.put(1, 2, 2.0);
        cache.put(2, 3, 3.0); // evicts (0,1)

        assert_eq!(cache.get(0, 1), None);
        assert_eq!(cache.get(1, 2), Some(2.0));
        assert_eq!(cache.get(2, 3), Some(3.0));
    }

    #[test]
    fn test_cache_sized_for_problem() {
        // 4 samples -> at most 10 distinct entries no matter the budget
        let cache = KernelCache::for_problem(1_000_000, 4);
        assert_eq!(cache.stats().capacity, 10);

        let tiny = KernelCache::for_problem(0, 100);
        assert_eq!(tiny.stats().capacity, 1);
    }
}
