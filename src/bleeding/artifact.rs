//! Persisted bleeding-risk model.
//!
//! The artifact is a single JSON document. It is loaded once at startup and
//! never mutated afterwards; a missing file is `Unavailable`, anything that
//! fails to parse or verify is `Corrupt`. Neither case falls back to a
//! default score.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::gbm::{GbmParams, GradientBoostedTrees};
use super::training::ValidationMetrics;
use super::{BleedingFeatures, BleedingPredictor, ModelError, FEATURE_NAMES};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub params: GbmParams,
    pub ensemble: GradientBoostedTrees,
    pub metrics: ValidationMetrics,
    pub trained_at: NaiveDateTime,
    /// Hex SHA-256 of the serialized ensemble.
    pub checksum: String,
}

impl TrainedModel {
    pub fn new(
        params: GbmParams,
        ensemble: GradientBoostedTrees,
        metrics: ValidationMetrics,
    ) -> Result<Self, ModelError> {
        let checksum = ensemble_checksum(&ensemble)?;
        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            params,
            ensemble,
            metrics,
            trained_at: chrono::Local::now().naive_local(),
            checksum,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let shown = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| ModelError::Unavailable {
            path: shown.clone(),
            reason: e.to_string(),
        })?;

        let model: TrainedModel =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::Corrupt {
                path: shown.clone(),
                reason: e.to_string(),
            })?;
        model.verify().map_err(|reason| ModelError::Corrupt {
            path: shown.clone(),
            reason,
        })?;

        tracing::info!(
            path = %shown,
            trees = model.ensemble.trees.len(),
            r2 = model.metrics.r2,
            "Bleeding model loaded"
        );
        Ok(model)
    }

    /// Write the artifact, replacing any previous one only once the new file
    /// is fully on disk.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "Bleeding model saved");
        Ok(())
    }

    /// Structural and checksum checks; `load` runs these before returning.
    pub fn verify(&self) -> Result<(), String> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {} (expected {ARTIFACT_FORMAT_VERSION})",
                self.format_version
            ));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(format!(
                "feature contract mismatch: {:?}",
                self.feature_names
            ));
        }
        if !self.ensemble.base_score.is_finite() {
            return Err("non-finite base score".into());
        }
        for (i, tree) in self.ensemble.trees.iter().enumerate() {
            tree.validate().map_err(|e| format!("tree {i}: {e}"))?;
        }
        let actual = ensemble_checksum(&self.ensemble).map_err(|e| e.to_string())?;
        if actual != self.checksum {
            return Err("checksum mismatch".into());
        }
        Ok(())
    }
}

impl BleedingPredictor for TrainedModel {
    fn name(&self) -> &str {
        "gradient_boosted_trees"
    }

    fn predict(&self, features: &BleedingFeatures) -> f64 {
        self.ensemble
            .predict(&features.to_vector())
            .clamp(0.0, 100.0)
    }
}

fn ensemble_checksum(ensemble: &GradientBoostedTrees) -> Result<String, ModelError> {
    let bytes = serde_json::to_vec(ensemble)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bleeding::gbm::{RegressionTree, TreeNode};

    fn tiny_model() -> TrainedModel {
        // One split on INR: below 3.5 predicts base, above adds 40.
        let ensemble = GradientBoostedTrees {
            base_score: 20.0,
            trees: vec![RegressionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 1,
                        threshold: 3.5,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 0.0 },
                    TreeNode::Leaf { value: 40.0 },
                ],
            }],
        };
        let metrics = ValidationMetrics {
            rmse: 3.0,
            r2: 0.95,
            train_rows: 8,
            validation_rows: 2,
        };
        TrainedModel::new(GbmParams::default(), ensemble, metrics).unwrap()
    }

    #[test]
    fn save_then_load_preserves_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");
        let model = tiny_model();
        model.save(&path).unwrap();

        let loaded = TrainedModel::load(&path).unwrap();
        assert_eq!(loaded.ensemble, model.ensemble);
        assert_eq!(loaded.checksum, model.checksum);
    }

    #[test]
    fn predictions_are_clamped() {
        let mut model = tiny_model();
        model.ensemble.base_score = 90.0;
        let f = BleedingFeatures {
            inr: 5.0,
            ..BleedingFeatures::default()
        };
        assert_eq!(model.predict(&f), 100.0);

        model.ensemble.base_score = -30.0;
        assert_eq!(model.predict(&BleedingFeatures::default()), 0.0);
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match TrainedModel::load(&path).unwrap_err() {
            ModelError::Unavailable { path: shown, .. } => {
                assert_eq!(shown, path.display().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(matches!(
            TrainedModel::load(&path).unwrap_err(),
            ModelError::Corrupt { .. }
        ));
    }

    #[test]
    fn tampered_leaf_fails_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = tiny_model();
        model.ensemble.trees[0].nodes[2] = TreeNode::Leaf { value: 99.0 };
        model.save(&path).unwrap();

        let err = TrainedModel::load(&path).unwrap_err();
        match err {
            ModelError::Corrupt { reason, .. } => assert!(reason.contains("checksum")),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn wrong_feature_contract_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = tiny_model();
        model.feature_names.swap(0, 1);
        model.save(&path).unwrap();
        assert!(matches!(
            TrainedModel::load(&path).unwrap_err(),
            ModelError::Corrupt { .. }
        ));
    }

    #[test]
    fn future_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = tiny_model();
        model.format_version = 99;
        model.save(&path).unwrap();
        assert!(matches!(
            TrainedModel::load(&path).unwrap_err(),
            ModelError::Corrupt { .. }
        ));
    }

    #[test]
    fn trained_model_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = crate::bleeding::training::train_and_save(
            &crate::bleeding::training::quick_config(),
            &path,
        )
        .unwrap();
        let loaded = TrainedModel::load(&path).unwrap();
        let f = BleedingFeatures {
            age: 70.0,
            inr: 4.0,
            anticoagulant: true,
            ..BleedingFeatures::default()
        };
        assert_eq!(loaded.predict(&f), model.predict(&f));
    }
}
