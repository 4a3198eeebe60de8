//! Embedding backend built on Model2Vec

use crate::config::EmbeddingConfig;
use crate::embedding::cache::{CacheStats, EmbeddingCache};
use crate::error::{CandidateRankerError, Result};
use log::{info, warn};
use model2vec_rs::model::StaticModel;
use std::path::PathBuf;

/// Embedding service with an availability latch.
///
/// If the model fails to load, the service stays unavailable for the rest of
/// the process lifetime and every embed call returns `None`; there is no
/// retry. Callers treat `None` as "semantic signals are off" and fall back
/// to lexical scoring.
pub struct EmbeddingService {
    model: Option<StaticModel>,
    cache: EmbeddingCache,
    batch_size: usize,
    model_name: String,
}

impl EmbeddingService {
    /// Load the model described by the config. Looks for a local copy under
    /// the models directory first, then falls back to treating the name as a
    /// hub identifier.
    pub async fn new(config: &EmbeddingConfig) -> Self {
        if !config.enabled {
            info!("event=embedding_disabled model={}", config.model_name);
            return Self::unavailable(config);
        }

        let local_path = config.models_dir.join(&config.model_name);
        let source: PathBuf = if local_path.exists() {
            local_path
        } else {
            PathBuf::from(&config.model_name)
        };

        match StaticModel::from_pretrained(&source, None, None, None) {
            Ok(model) => {
                info!(
                    "event=embedding_model_loaded model={} source={}",
                    config.model_name,
                    source.display()
                );
                Self {
                    model: Some(model),
                    cache: EmbeddingCache::new(config.cache_capacity),
                    batch_size: config.batch_size.max(1),
                    model_name: config.model_name.clone(),
                }
            }
            Err(e) => {
                warn!(
                    "event=embedding_model_load_failed model={} error={}",
                    config.model_name, e
                );
                Self::unavailable(config)
            }
        }
    }

    /// Service without a backing model; every embed call returns `None`.
    pub fn unavailable(config: &EmbeddingConfig) -> Self {
        Self {
            model: None,
            cache: EmbeddingCache::new(config.cache_capacity),
            batch_size: config.batch_size.max(1),
            model_name: config.model_name.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Embed one text, serving from the cache when possible.
    pub fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let model = self.model.as_ref()?;

        if let Some(cached) = self.cache.get(text) {
            return Some(cached);
        }

        let embedding = model.encode_single(text);
        self.cache.put(text, embedding.clone());
        Some(embedding)
    }

    /// Embed a batch of texts, computing only the cache misses and returning
    /// vectors in input order.
    pub fn embed_batch(&self, texts: &[String]) -> Option<Vec<Vec<f32>>> {
        let model = self.model.as_ref()?;

        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        let mut uncached_texts: Vec<String> = Vec::new();
        let mut uncached_indices: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            if let Some(cached) = self.cache.get(text) {
                results[i] = Some(cached);
            } else {
                uncached_texts.push(text.clone());
                uncached_indices.push(i);
            }
        }

        let mut computed: Vec<Vec<f32>> = Vec::with_capacity(uncached_texts.len());
        for chunk in uncached_texts.chunks(self.batch_size) {
            computed.extend(model.encode(chunk));
        }

        for (index, embedding) in uncached_indices.into_iter().zip(computed.into_iter()) {
            self.cache.put(&texts[index], embedding.clone());
            results[index] = Some(embedding);
        }

        Some(results.into_iter().map(|r| r.unwrap_or_default()).collect())
    }

    /// Cosine similarity between two dense vectors.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(CandidateRankerError::Embedding(format!(
                "Embedding dimensions don't match: {} vs {}",
                a.len(),
                b.len()
            )));
        }

        if a.is_empty() {
            return Ok(0.0);
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            Ok(0.0)
        } else {
            Ok(dot_product / (norm_a * norm_b))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmbeddingConfig {
        EmbeddingConfig {
            models_dir: PathBuf::from("/nonexistent"),
            model_name: "test-model".to_string(),
            batch_size: 8,
            cache_capacity: 16,
            enabled: false,
        }
    }

    #[tokio::test]
    async fn test_disabled_service_is_unavailable() {
        let service = EmbeddingService::new(&test_config()).await;

        assert!(!service.is_available());
        assert!(service.embed("anything").is_none());
        assert!(service.embed_batch(&["a".to_string()]).is_none());
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let v = vec![0.5, 0.5, 0.1];
        let similarity = EmbeddingService::cosine_similarity(&v, &v).unwrap();

        assert!((similarity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];

        assert_eq!(EmbeddingService::cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_is_zero() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];

        assert_eq!(EmbeddingService::cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch_errors() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];

        assert!(EmbeddingService::cosine_similarity(&a, &b).is_err());
    }
}
