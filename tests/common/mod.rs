#![allow(dead_code)]

use std::sync::Arc;

use riskmonitor_lib::bleeding::{BleedingFeatures, BleedingPredictor};
use riskmonitor_lib::models::Observation;
use riskmonitor_lib::scoring::ScoringEngine;

/// Linear stand-in for the trained model: 10 points per INR unit above 1
/// plus 20 for an anticoagulant.
pub struct LinearPredictor;

impl BleedingPredictor for LinearPredictor {
    fn name(&self) -> &str {
        "linear_stub"
    }

    fn predict(&self, f: &BleedingFeatures) -> f64 {
        let mut score = (f.inr - 1.0).max(0.0) * 10.0;
        if f.anticoagulant {
            score += 20.0;
        }
        score
    }
}

/// Returns the same bleeding percentage for every patient.
pub struct FixedPredictor(pub f64);

impl BleedingPredictor for FixedPredictor {
    fn name(&self) -> &str {
        "fixed_stub"
    }

    fn predict(&self, _: &BleedingFeatures) -> f64 {
        self.0
    }
}

pub fn engine() -> ScoringEngine {
    ScoringEngine::new(Arc::new(LinearPredictor))
}

/// Age 40, normal vitals, nothing else.
pub fn healthy_adult() -> Observation {
    let mut obs = Observation::default();
    obs.age = Some(40);
    let v = &mut obs.vitals;
    v.systolic_bp = Some(120.0);
    v.diastolic_bp = Some(80.0);
    v.heart_rate = Some(70.0);
    v.resp_rate = Some(14.0);
    v.temp_c = Some(36.8);
    v.spo2 = Some(98.0);
    obs
}
