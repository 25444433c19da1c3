//! Offline training pipeline: generate, split, fit, evaluate, gate.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::artifact::TrainedModel;
use super::dataset::{self, Dataset, SyntheticConfig};
use super::gbm::{GbmParams, GradientBoostedTrees};
use super::ModelError;

/// Minimum quality a retrained model must reach before it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCriteria {
    pub min_r2: f64,
    pub max_rmse: f64,
}

impl Default for AcceptanceCriteria {
    fn default() -> Self {
        Self {
            min_r2: 0.80,
            max_rmse: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub synthetic: SyntheticConfig,
    pub train_fraction: f64,
    pub split_seed: u64,
    pub params: GbmParams,
    pub acceptance: AcceptanceCriteria,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            synthetic: SyntheticConfig::default(),
            train_fraction: 0.8,
            split_seed: 42,
            params: GbmParams::default(),
            acceptance: AcceptanceCriteria::default(),
        }
    }
}

/// Held-out error of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub rmse: f64,
    pub r2: f64,
    pub train_rows: usize,
    pub validation_rows: usize,
}

impl ValidationMetrics {
    pub fn meets(&self, criteria: &AcceptanceCriteria) -> bool {
        self.r2 >= criteria.min_r2 && self.rmse <= criteria.max_rmse
    }
}

pub fn rmse(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let sse: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum();
    (sse / n as f64).sqrt()
}

/// Coefficient of determination. A constant target gives 0.
pub fn r_squared(predicted: &[f64], actual: &[f64]) -> f64 {
    let n = predicted.len().min(actual.len());
    if n == 0 {
        return 0.0;
    }
    let mean = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

pub fn evaluate(model: &GradientBoostedTrees, data: &Dataset) -> (f64, f64) {
    let predicted: Vec<f64> = data
        .features
        .iter()
        .map(|x| model.predict(x).clamp(0.0, 100.0))
        .collect();
    (rmse(&predicted, &data.labels), r_squared(&predicted, &data.labels))
}

/// Train a model and check it against the acceptance gate.
pub fn train(config: &TrainingConfig) -> Result<TrainedModel, ModelError> {
    let start = Instant::now();
    let data = dataset::generate(&config.synthetic);
    let (train_set, valid_set) = data.split(config.train_fraction, config.split_seed);
    if train_set.is_empty() || valid_set.is_empty() {
        return Err(ModelError::Training(format!(
            "split of {} rows left an empty partition",
            data.len()
        )));
    }

    let ensemble =
        GradientBoostedTrees::fit(&train_set.features, &train_set.labels, &config.params);
    let (rmse, r2) = evaluate(&ensemble, &valid_set);
    let metrics = ValidationMetrics {
        rmse,
        r2,
        train_rows: train_set.len(),
        validation_rows: valid_set.len(),
    };

    tracing::info!(
        rmse = metrics.rmse,
        r2 = metrics.r2,
        trees = ensemble.trees.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Bleeding model trained"
    );

    if !metrics.meets(&config.acceptance) {
        tracing::warn!(
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "Bleeding model below acceptance threshold"
        );
        return Err(ModelError::Rejected(format!(
            "R² {:.3} (min {:.2}), RMSE {:.3} (max {:.1})",
            metrics.r2, config.acceptance.min_r2, metrics.rmse, config.acceptance.max_rmse
        )));
    }

    TrainedModel::new(config.params.clone(), ensemble, metrics)
}

/// Train, gate and persist. Nothing is written when the gate fails.
pub fn train_and_save(config: &TrainingConfig, path: &Path) -> Result<TrainedModel, ModelError> {
    let model = train(config)?;
    model.save(path)?;
    Ok(model)
}

#[cfg(test)]
pub(crate) fn quick_config() -> TrainingConfig {
    TrainingConfig {
        synthetic: SyntheticConfig {
            n_samples: 1200,
            ..SyntheticConfig::default()
        },
        params: GbmParams {
            n_rounds: 40,
            learning_rate: 0.15,
            ..GbmParams::default()
        },
        ..TrainingConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bleeding::{BleedingFeatures, BleedingPredictor};

    #[test]
    fn rmse_and_r2_on_perfect_fit() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(rmse(&y, &y), 0.0);
        assert_eq!(r_squared(&y, &y), 1.0);
    }

    #[test]
    fn r2_of_mean_predictor_is_zero() {
        let y = [1.0, 2.0, 3.0];
        assert!(r_squared(&[2.0, 2.0, 2.0], &y).abs() < 1e-12);
    }

    #[test]
    fn rmse_known_value() {
        assert!((rmse(&[0.0, 0.0], &[3.0, 4.0]) - 12.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn quick_training_passes_gate() {
        let model = train(&quick_config()).unwrap();
        assert!(model.metrics.r2 >= 0.80, "r2 {}", model.metrics.r2);
        assert!(model.metrics.rmse <= 10.0, "rmse {}", model.metrics.rmse);
        assert_eq!(model.metrics.train_rows, 960);
        assert_eq!(model.metrics.validation_rows, 240);
    }

    #[test]
    fn trained_model_ranks_risky_patient_higher() {
        let model = train(&quick_config()).unwrap();
        let low = BleedingFeatures {
            age: 40.0,
            inr: 1.0,
            weight_kg: 75.0,
            ..BleedingFeatures::default()
        };
        let high = BleedingFeatures {
            age: 80.0,
            inr: 4.5,
            anticoagulant: true,
            gi_bleed: true,
            weight_kg: 75.0,
            ..BleedingFeatures::default()
        };
        assert!(model.predict(&high) > model.predict(&low) + 50.0);
    }

    #[test]
    fn impossible_gate_rejects_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let config = TrainingConfig {
            acceptance: AcceptanceCriteria {
                min_r2: 1.01,
                max_rmse: 10.0,
            },
            ..quick_config()
        };
        let err = train_and_save(&config, &path).unwrap_err();
        assert!(matches!(err, ModelError::Rejected(_)));
        assert!(!path.exists());
    }

    #[test]
    fn empty_partition_is_an_error() {
        let config = TrainingConfig {
            train_fraction: 1.0,
            ..quick_config()
        };
        assert!(matches!(train(&config), Err(ModelError::Training(_))));
    }
}
