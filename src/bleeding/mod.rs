//! Learned bleeding-risk regressor.
//!
//! The engine only sees [`BleedingPredictor`]; the shipped implementation is
//! [`TrainedModel`], a gradient-boosted tree ensemble trained offline on a
//! synthetic rule-labelled dataset and loaded read-only at startup.

pub mod artifact;
pub mod dataset;
pub mod gbm;
pub mod training;

pub use artifact::TrainedModel;
pub use dataset::{Dataset, SyntheticConfig};
pub use gbm::{GbmParams, GradientBoostedTrees};
pub use training::{AcceptanceCriteria, TrainingConfig, ValidationMetrics};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Gender, Observation};

pub const NUM_FEATURES: usize = 9;

/// Column order of the feature vector. Part of the artifact contract.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "age",
    "inr",
    "anticoagulant",
    "gi_bleed",
    "high_bp",
    "antiplatelet",
    "gender_female",
    "weight",
    "liver_disease",
];

pub type FeatureVector = [f64; NUM_FEATURES];

/// Systolic above this sets the high-BP flag.
pub const HIGH_BP_SYSTOLIC: f64 = 140.0;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Bleeding model unavailable at {path}: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("Bleeding model artifact corrupt ({path}): {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Retrained model rejected: {0}")]
    Rejected(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Anything that maps the fixed feature vector to a 0-100 risk score.
///
/// Implementations must be pure: no side effects, safe to call from many
/// threads at once.
pub trait BleedingPredictor: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, features: &BleedingFeatures) -> f64;
}

/// The nine model inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BleedingFeatures {
    pub age: f64,
    pub inr: f64,
    pub anticoagulant: bool,
    pub gi_bleed: bool,
    /// Systolic BP above 140 mmHg.
    pub high_bp: bool,
    /// Not captured by the observation form yet; always false at inference.
    pub antiplatelet: bool,
    pub female: bool,
    pub weight_kg: f64,
    pub liver_disease: bool,
}

impl BleedingFeatures {
    /// Build features from an observation. Absent numeric inputs become 0,
    /// which sits outside every training range and so never adds risk.
    pub fn from_observation(obs: &Observation) -> Self {
        Self {
            age: obs.age.map_or(0.0, f64::from),
            inr: obs.labs.inr.unwrap_or(0.0),
            anticoagulant: obs.history.anticoagulant,
            gi_bleed: obs.history.gi_bleed,
            high_bp: obs
                .vitals
                .systolic_bp
                .is_some_and(|s| s > HIGH_BP_SYSTOLIC),
            antiplatelet: false,
            female: obs.gender == Some(Gender::Female),
            weight_kg: obs.weight_kg.unwrap_or(0.0),
            liver_disease: obs.history.liver_disease,
        }
    }

    pub fn to_vector(&self) -> FeatureVector {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            self.age,
            self.inr,
            flag(self.anticoagulant),
            flag(self.gi_bleed),
            flag(self.high_bp),
            flag(self.antiplatelet),
            flag(self.female),
            self.weight_kg,
            flag(self.liver_disease),
        ]
    }

    pub fn from_vector(v: &FeatureVector) -> Self {
        let flag = |x: f64| x >= 0.5;
        Self {
            age: v[0],
            inr: v[1],
            anticoagulant: flag(v[2]),
            gi_bleed: flag(v[3]),
            high_bp: flag(v[4]),
            antiplatelet: flag(v[5]),
            female: flag(v[6]),
            weight_kg: v[7],
            liver_disease: flag(v[8]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_from_observation() {
        let mut obs = Observation::default();
        obs.age = Some(72);
        obs.gender = Some(Gender::Female);
        obs.weight_kg = Some(61.0);
        obs.vitals.systolic_bp = Some(150.0);
        obs.labs.inr = Some(3.8);
        obs.history.anticoagulant = true;
        obs.history.liver_disease = true;

        let f = BleedingFeatures::from_observation(&obs);
        assert_eq!(
            f.to_vector(),
            [72.0, 3.8, 1.0, 0.0, 1.0, 0.0, 1.0, 61.0, 1.0]
        );
    }

    #[test]
    fn high_bp_is_strictly_above_140() {
        let mut obs = Observation::default();
        obs.vitals.systolic_bp = Some(140.0);
        assert!(!BleedingFeatures::from_observation(&obs).high_bp);
        obs.vitals.systolic_bp = Some(140.5);
        assert!(BleedingFeatures::from_observation(&obs).high_bp);
    }

    #[test]
    fn antiplatelet_never_set_from_observation() {
        let mut obs = Observation::default();
        obs.history.anticoagulant = true;
        obs.history.nsaid = true;
        assert!(!BleedingFeatures::from_observation(&obs).antiplatelet);
    }

    #[test]
    fn vector_round_trip() {
        let f = BleedingFeatures {
            age: 80.0,
            inr: 2.2,
            anticoagulant: true,
            gi_bleed: false,
            high_bp: true,
            antiplatelet: false,
            female: true,
            weight_kg: 70.0,
            liver_disease: false,
        };
        assert_eq!(BleedingFeatures::from_vector(&f.to_vector()), f);
    }
}
