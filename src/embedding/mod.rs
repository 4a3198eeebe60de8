//! Dense text embeddings with content-addressed caching

pub mod cache;
pub mod service;

pub use cache::{CacheStats, EmbeddingCache};
pub use service::EmbeddingService;
