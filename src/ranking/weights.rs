//! Feedback-adaptive scoring weights with durable persistence

use crate::error::CandidateRankerError;
use chrono::{SecondsFormat, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The three-component mixture used to combine skill, experience, and text
/// similarity into one ranking score.
///
/// Invariant: after every mutation through [`WeightsManager`], the components
/// sum to 1.0 within floating tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub skills: f32,
    pub experience: f32,
    pub summary: f32,
}

impl WeightVector {
    /// Compiled-in defaults: skills 50%, experience 20%, summary 30%.
    pub const DEFAULT: WeightVector = WeightVector {
        skills: 0.50,
        experience: 0.20,
        summary: 0.30,
    };

    /// Lower clamp bound per component.
    pub const MIN: WeightVector = WeightVector {
        skills: 0.20,
        experience: 0.05,
        summary: 0.10,
    };

    /// Upper clamp bound per component.
    pub const MAX: WeightVector = WeightVector {
        skills: 0.80,
        experience: 0.50,
        summary: 0.70,
    };

    pub fn sum(&self) -> f32 {
        self.skills + self.experience + self.summary
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredWeights {
    weights: WeightVector,
    updated_at: String,
}

/// Owns the process-wide weight vector and its storage file.
///
/// Every get-modify-persist sequence runs under one lock so concurrent
/// updates cannot interleave partially applied weights.
pub struct WeightsManager {
    storage_path: PathBuf,
    state: Mutex<WeightVector>,
}

impl WeightsManager {
    /// Create a manager backed by the given storage file, loading persisted
    /// weights when present. Missing or corrupt storage falls back to the
    /// defaults without failing.
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let weights = Self::load(&storage_path);

        Self {
            storage_path,
            state: Mutex::new(weights),
        }
    }

    fn load(path: &Path) -> WeightVector {
        if !path.exists() {
            return WeightVector::DEFAULT;
        }

        let loaded = std::fs::read_to_string(path)
            .map_err(CandidateRankerError::from)
            .and_then(|text| {
                serde_json::from_str::<StoredWeights>(&text).map_err(CandidateRankerError::from)
            });

        match loaded {
            Ok(stored) => {
                info!(
                    "event=adaptive_weights_loaded skills={:.4} experience={:.4} summary={:.4}",
                    stored.weights.skills, stored.weights.experience, stored.weights.summary
                );
                stored.weights
            }
            Err(e) => {
                error!("event=adaptive_weights_load_failed error={}", e);
                WeightVector::DEFAULT
            }
        }
    }

    fn save_locked(&self, weights: &WeightVector) {
        let stored = StoredWeights {
            weights: *weights,
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };

        let result = serde_json::to_string_pretty(&stored)
            .map_err(CandidateRankerError::from)
            .and_then(|json| {
                std::fs::write(&self.storage_path, json).map_err(CandidateRankerError::from)
            });

        if let Err(e) = result {
            error!("event=adaptive_weights_save_failed error={}", e);
        }
    }

    /// Snapshot copy of the current weights.
    pub fn get(&self) -> WeightVector {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply a bounded update: each provided component is clamped into its
    /// [min,max] range, merged over the prior vector, then all three are
    /// renormalized proportionally to sum to 1.0. Persists synchronously and
    /// returns the resulting vector.
    pub fn update(
        &self,
        skills: Option<f32>,
        experience: Option<f32>,
        summary: Option<f32>,
    ) -> WeightVector {
        let mut weights = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(value) = skills {
            weights.skills = value.clamp(WeightVector::MIN.skills, WeightVector::MAX.skills);
        }
        if let Some(value) = experience {
            weights.experience =
                value.clamp(WeightVector::MIN.experience, WeightVector::MAX.experience);
        }
        if let Some(value) = summary {
            weights.summary = value.clamp(WeightVector::MIN.summary, WeightVector::MAX.summary);
        }

        let total = weights.sum();
        if total > 0.0 {
            weights.skills /= total;
            weights.experience /= total;
            weights.summary /= total;
        }

        self.save_locked(&weights);
        info!(
            "event=adaptive_weights_updated skills={:.4} experience={:.4} summary={:.4}",
            weights.skills, weights.experience, weights.summary
        );

        *weights
    }

    /// Restore the compiled-in default vector and persist it.
    pub fn reset(&self) -> WeightVector {
        let mut weights = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *weights = WeightVector::DEFAULT;

        self.save_locked(&weights);
        info!("event=adaptive_weights_reset_to_default");

        *weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> WeightsManager {
        WeightsManager::new(dir.path().join("weights.json"))
    }

    #[test]
    fn test_defaults_when_storage_missing() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        assert_eq!(manager.get(), WeightVector::DEFAULT);
    }

    #[test]
    fn test_update_normalizes_to_unit_sum() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        let weights = manager.update(Some(0.6), None, None);

        assert!((weights.sum() - 1.0).abs() < 1e-3);
        assert!(weights.skills >= WeightVector::MIN.skills);
        assert!(weights.skills <= WeightVector::MAX.skills);
    }

    #[test]
    fn test_update_clamps_out_of_range_values() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        let weights = manager.update(Some(5.0), Some(-1.0), None);

        // Pre-normalization the values were clamped to 0.80 and 0.05.
        let expected_total = 0.80 + 0.05 + 0.30;
        assert!((weights.skills - 0.80 / expected_total).abs() < 1e-5);
        assert!((weights.experience - 0.05 / expected_total).abs() < 1e-5);
    }

    #[test]
    fn test_reset_restores_exact_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        manager.update(Some(0.7), Some(0.1), Some(0.2));
        let weights = manager.reset();

        assert_eq!(weights, WeightVector::DEFAULT);
        assert_eq!(manager.get(), WeightVector::DEFAULT);
    }

    #[test]
    fn test_weights_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weights.json");

        let before = {
            let manager = WeightsManager::new(&path);
            manager.update(Some(0.65), None, None)
        };

        let reloaded = WeightsManager::new(&path);

        assert_eq!(reloaded.get(), before);
    }

    #[test]
    fn test_corrupt_storage_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, "not json at all").unwrap();

        let manager = WeightsManager::new(&path);

        assert_eq!(manager.get(), WeightVector::DEFAULT);
    }
}
