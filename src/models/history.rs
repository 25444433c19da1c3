use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Gender, OverallStatus};
use super::observation::Observation;
use super::profile::RiskProfile;

/// A stored scoring pass: a subset of the Observation plus the headline scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: Uuid,
    pub recorded_at: NaiveDateTime,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub systolic_bp: Option<f64>,
    pub aki_risk_pct: u8,
    pub bleeding_risk_pct: f64,
    pub sepsis_score: u8,
    pub sirs_score: u8,
    pub status: OverallStatus,
}

/// Fields supplied by the caller; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryRecord {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub systolic_bp: Option<f64>,
    pub aki_risk_pct: u8,
    pub bleeding_risk_pct: f64,
    pub sepsis_score: u8,
    pub sirs_score: u8,
    pub status: OverallStatus,
}

impl NewHistoryRecord {
    pub fn from_scoring(obs: &Observation, profile: &RiskProfile) -> Self {
        Self {
            age: obs.age,
            gender: obs.gender,
            systolic_bp: obs.vitals.systolic_bp,
            aki_risk_pct: profile.aki_risk_pct,
            bleeding_risk_pct: profile.bleeding_risk_pct,
            sepsis_score: profile.sepsis_score,
            sirs_score: profile.sirs_score,
            status: profile.overall_status,
        }
    }

    pub fn into_record(self, id: Uuid, recorded_at: NaiveDateTime) -> HistoryRecord {
        HistoryRecord {
            id,
            recorded_at,
            age: self.age,
            gender: self.gender,
            systolic_bp: self.systolic_bp,
            aki_risk_pct: self.aki_risk_pct,
            bleeding_risk_pct: self.bleeding_risk_pct,
            sepsis_score: self.sepsis_score,
            sirs_score: self.sirs_score,
            status: self.status,
        }
    }
}
