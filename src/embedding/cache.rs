//! Content-addressed LRU cache for embedding vectors

use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Cache occupancy and traffic counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

struct CacheInner {
    entries: LruCache<String, Vec<f32>>,
    hits: u64,
    misses: u64,
}

/// Bounded LRU cache keyed by a SHA-256 digest of the input text.
///
/// The embedding function is pure for identical input, so a hit returns the
/// same vector a fresh computation would. One lock covers each lookup or
/// insert; on overflow the least-recently-touched entry is evicted.
pub struct EmbeddingCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl EmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        let bounded = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(bounded),
                hits: 0,
                misses: 0,
            }),
            capacity: bounded.get(),
        }
    }

    fn key(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Look up the embedding for a text, marking the entry most recently
    /// used on a hit.
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        let key = Self::key(text);

        if let Ok(mut inner) = self.inner.lock() {
            let cached = inner.entries.get(&key).cloned();
            match cached {
                Some(embedding) => {
                    inner.hits += 1;
                    Some(embedding)
                }
                None => {
                    inner.misses += 1;
                    None
                }
            }
        } else {
            None
        }
    }

    pub fn put(&self, text: &str, embedding: Vec<f32>) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.entries.put(Self::key(text), embedding);
        }
    }

    pub fn stats(&self) -> CacheStats {
        if let Ok(inner) = self.inner.lock() {
            CacheStats {
                entries: inner.entries.len(),
                capacity: self.capacity,
                hits: inner.hits,
                misses: inner.misses,
            }
        } else {
            CacheStats {
                entries: 0,
                capacity: self.capacity,
                hits: 0,
                misses: 0,
            }
        }
    }
}
