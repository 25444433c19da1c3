//! Risk scoring: runs every calculator plus the bleeding model over one
//! observation and folds the results into a [`RiskProfile`].

pub mod calculators;
pub mod news2;

pub use calculators::{aki_risk, hypoglycemia_risk, sepsis_score, sirs_score};
pub use news2::news2_score;

use std::path::Path;
use std::sync::Arc;

use crate::bleeding::{BleedingFeatures, BleedingPredictor, ModelError, TrainedModel};
use crate::models::{News2Band, News2Score, Observation, OverallStatus, RiskProfile};

/// Stateless scorer. Cheap to clone and safe to share across threads; the
/// model it holds is read-only.
#[derive(Clone)]
pub struct ScoringEngine {
    predictor: Arc<dyn BleedingPredictor>,
}

impl ScoringEngine {
    pub fn new(predictor: Arc<dyn BleedingPredictor>) -> Self {
        Self { predictor }
    }

    /// Load the trained artifact. Fails rather than scoring without a model.
    pub fn from_model_path(path: &Path) -> Result<Self, ModelError> {
        let model = TrainedModel::load(path)?;
        Ok(Self::new(Arc::new(model)))
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Compute the full profile. Deterministic for a given observation.
    ///
    /// Without both age and systolic BP every score is zero and the profile
    /// is flagged `insufficient_data`; derived hemodynamics are still filled.
    pub fn score(&self, obs: &Observation) -> RiskProfile {
        let hemodynamics = obs.hemodynamics();

        if obs.age.is_none() || obs.vitals.systolic_bp.is_none() {
            tracing::debug!("Scoring skipped: age or systolic BP missing");
            return RiskProfile {
                bleeding_risk_pct: 0.0,
                aki_risk_pct: 0,
                sepsis_score: 0,
                sirs_score: 0,
                hypoglycemia_risk_pct: 0,
                news2: News2Score {
                    total: 0,
                    max_parameter: 0,
                    band: News2Band::Low,
                },
                overall_status: OverallStatus::Stable,
                hemodynamics,
                insufficient_data: true,
            };
        }

        let raw_bleeding = self
            .predictor
            .predict(&BleedingFeatures::from_observation(obs));
        let bleeding_risk_pct = if raw_bleeding.is_finite() {
            raw_bleeding.clamp(0.0, 100.0)
        } else {
            tracing::warn!(
                predictor = self.predictor.name(),
                "Non-finite bleeding prediction, reporting 100"
            );
            100.0
        };

        let aki_risk_pct = aki_risk(obs);
        let sepsis = sepsis_score(obs);

        RiskProfile {
            bleeding_risk_pct,
            aki_risk_pct,
            sepsis_score: sepsis,
            sirs_score: sirs_score(obs),
            hypoglycemia_risk_pct: hypoglycemia_risk(obs),
            news2: news2_score(obs),
            overall_status: OverallStatus::from_scores(bleeding_risk_pct, aki_risk_pct, sepsis),
            hemodynamics,
            insufficient_data: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Predictor returning a fixed value, for tests that do not need a model.
    pub struct FixedPredictor(pub f64);

    impl BleedingPredictor for FixedPredictor {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict(&self, _features: &BleedingFeatures) -> f64 {
            self.0
        }
    }

    pub fn engine(bleeding: f64) -> ScoringEngine {
        ScoringEngine::new(Arc::new(FixedPredictor(bleeding)))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::engine;
    use super::*;

    fn stable_patient() -> Observation {
        let mut obs = Observation::default();
        obs.age = Some(45);
        obs.vitals.systolic_bp = Some(122.0);
        obs.vitals.diastolic_bp = Some(78.0);
        obs.vitals.heart_rate = Some(72.0);
        obs.vitals.resp_rate = Some(14.0);
        obs.vitals.temp_c = Some(36.8);
        obs.vitals.spo2 = Some(98.0);
        obs
    }

    #[test]
    fn stable_patient_is_stable() {
        let profile = engine(5.0).score(&stable_patient());
        assert_eq!(profile.overall_status, OverallStatus::Stable);
        assert_eq!(profile.sepsis_score, 0);
        assert_eq!(profile.news2.total, 0);
        assert!(!profile.insufficient_data);
    }

    #[test]
    fn high_bleeding_alone_is_critical() {
        let profile = engine(50.5).score(&stable_patient());
        assert_eq!(profile.overall_status, OverallStatus::Critical);
        let profile = engine(50.0).score(&stable_patient());
        assert_eq!(profile.overall_status, OverallStatus::Stable);
    }

    #[test]
    fn prediction_is_clamped() {
        assert_eq!(engine(140.0).score(&stable_patient()).bleeding_risk_pct, 100.0);
        assert_eq!(engine(-3.0).score(&stable_patient()).bleeding_risk_pct, 0.0);
        assert_eq!(engine(f64::NAN).score(&stable_patient()).bleeding_risk_pct, 100.0);
    }

    #[test]
    fn missing_age_skips_scoring() {
        let mut obs = stable_patient();
        obs.age = None;
        obs.vitals.resp_rate = Some(30.0);
        let profile = engine(80.0).score(&obs);
        assert!(profile.insufficient_data);
        assert_eq!(profile.bleeding_risk_pct, 0.0);
        assert_eq!(profile.sepsis_score, 0);
        assert_eq!(profile.overall_status, OverallStatus::Stable);
        assert!(profile.hemodynamics.mean_arterial_pressure.is_some());
    }

    #[test]
    fn missing_systolic_skips_scoring() {
        let mut obs = stable_patient();
        obs.vitals.systolic_bp = None;
        assert!(engine(80.0).score(&obs).insufficient_data);
    }

    #[test]
    fn scoring_is_deterministic() {
        let e = engine(33.3);
        let obs = stable_patient();
        assert_eq!(e.score(&obs), e.score(&obs));
    }

    #[test]
    fn septic_patient_profile() {
        let mut obs = stable_patient();
        obs.age = Some(72);
        obs.vitals.systolic_bp = Some(88.0);
        obs.vitals.resp_rate = Some(28.0);
        obs.vitals.heart_rate = Some(115.0);
        obs.vitals.temp_c = Some(39.2);
        obs.labs.wbc = Some(18.5);
        let profile = engine(10.0).score(&obs);
        assert_eq!(profile.sepsis_score, 2);
        assert_eq!(profile.sirs_score, 4);
        assert_eq!(profile.overall_status, OverallStatus::Critical);
    }

    #[test]
    fn model_path_missing_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScoringEngine::from_model_path(&dir.path().join("none.json"));
        assert!(matches!(result, Err(ModelError::Unavailable { .. })));
    }
}
