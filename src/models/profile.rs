use serde::{Deserialize, Serialize};

use super::enums::{News2Band, OverallStatus};
use super::observation::Hemodynamics;

/// Bleeding risk above this percentage makes the profile Critical.
pub const BLEEDING_CRITICAL_PCT: f64 = 50.0;
/// AKI risk above this percentage makes the profile Critical.
pub const AKI_CRITICAL_PCT: u8 = 50;
/// qSOFA at or above this score makes the profile Critical.
pub const SEPSIS_CRITICAL_SCORE: u8 = 2;

/// Immutable result of one scoring pass over a single Observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// 0-100, model output.
    pub bleeding_risk_pct: f64,
    /// 0-100, integer-valued policy score.
    pub aki_risk_pct: u8,
    /// qSOFA-style, 0-3.
    pub sepsis_score: u8,
    /// 0-4.
    pub sirs_score: u8,
    /// 0-100.
    pub hypoglycemia_risk_pct: u8,
    pub news2: News2Score,
    pub overall_status: OverallStatus,
    pub hemodynamics: Hemodynamics,
    /// Age or systolic BP missing: scores were not computed and are zero.
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct News2Score {
    /// 0-20.
    pub total: u8,
    /// Highest single-parameter contribution (a 3 escalates the band).
    pub max_parameter: u8,
    pub band: News2Band,
}

impl OverallStatus {
    /// Composite rule, evaluated independently of the alert cascade.
    pub fn from_scores(bleeding_risk_pct: f64, aki_risk_pct: u8, sepsis_score: u8) -> Self {
        if bleeding_risk_pct > BLEEDING_CRITICAL_PCT
            || aki_risk_pct > AKI_CRITICAL_PCT
            || sepsis_score >= SEPSIS_CRITICAL_SCORE
        {
            Self::Critical
        } else {
            Self::Stable
        }
    }
}

impl RiskProfile {
    pub fn is_critical(&self) -> bool {
        self.overall_status == OverallStatus::Critical
    }
}
