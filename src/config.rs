//! Configuration management for the candidate ranker

use crate::error::{CandidateRankerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub weights_file: String,
    pub feedback_file: String,
    pub index_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub models_dir: PathBuf,
    pub model_name: String,
    pub batch_size: usize,
    pub cache_capacity: usize,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub enabled: bool,
    /// Hard cap on bulk metadata scans to bound memory.
    pub list_cap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Rank with dense-embedding similarity instead of lexical similarity.
    pub use_semantic: bool,
    /// Look-back window for feedback statistics, in days.
    pub feedback_window_days: i64,
    /// Most recent feedback records considered by weight adjustment.
    pub adjustment_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("candidate-ranker");

        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".candidate-ranker")
            .join("models");

        Self {
            storage: StorageConfig {
                data_dir,
                weights_file: "ranking_weights.json".to_string(),
                feedback_file: "ranking_feedback.json".to_string(),
                index_file: "candidate_index.json".to_string(),
            },
            embedding: EmbeddingConfig {
                models_dir,
                model_name: "minishlab/M2V_base_output".to_string(),
                batch_size: 32,
                cache_capacity: 2048,
                enabled: true,
            },
            index: IndexConfig {
                enabled: true,
                list_cap: 500,
            },
            scoring: ScoringConfig {
                use_semantic: false,
                feedback_window_days: 30,
                adjustment_limit: 100,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                CandidateRankerError::Configuration(format!("Failed to parse config: {}", e))
            })?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load from an explicit path instead of the default location.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content).map_err(|e| {
            CandidateRankerError::Configuration(format!("Failed to parse config: {}", e))
        })?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            CandidateRankerError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("candidate-ranker")
            .join("config.toml")
    }

    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.storage.data_dir)?;
        Ok(())
    }

    pub fn weights_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.weights_file)
    }

    pub fn feedback_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.feedback_file)
    }

    pub fn index_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.index_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.embedding.enabled);
        assert_eq!(config.embedding.cache_capacity, 2048);
        assert_eq!(config.index.list_cap, 500);
        assert_eq!(config.scoring.feedback_window_days, 30);
        assert_eq!(config.scoring.adjustment_limit, 100);
    }

    #[test]
    fn test_storage_paths_join_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = PathBuf::from("/tmp/ranker");

        assert_eq!(
            config.weights_path(),
            PathBuf::from("/tmp/ranker/ranking_weights.json")
        );
        assert_eq!(
            config.feedback_path(),
            PathBuf::from("/tmp/ranker/ranking_feedback.json")
        );
        assert_eq!(
            config.index_path(),
            PathBuf::from("/tmp/ranker/candidate_index.json")
        );
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.embedding.model_name, config.embedding.model_name);
        assert_eq!(parsed.storage.weights_file, config.storage.weights_file);
        assert_eq!(parsed.scoring.use_semantic, config.scoring.use_semantic);
    }
}
