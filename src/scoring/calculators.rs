//! Deterministic bedside scores.
//!
//! Each calculator is a total function over an [`Observation`]: absent
//! values never satisfy a rule, and every output is clamped to its bound.

use crate::models::Observation;

// ═══════════════════════════════════════════════════════════
// AKI risk (0-100)
// ═══════════════════════════════════════════════════════════

/// Weighted contributions to AKI risk. Every weight is non-negative, so the
/// score is monotonic in each factor.
pub mod aki_weights {
    pub const AGE_65_PLUS: u32 = 15;
    /// Diuretic and ACEi/ARB taken together.
    pub const DIURETIC_WITH_ACEI: u32 = 20;
    pub const HYPOTENSION: u32 = 20;
    pub const ACTIVE_CHEMO: u32 = 15;
    pub const ELEVATED_CREATININE: u32 = 25;
    pub const NSAID: u32 = 15;
    pub const HEART_FAILURE: u32 = 15;
}

/// Age at which AKI and bleeding risk start to climb.
pub const ELDERLY_AGE: u32 = 65;
/// Systolic below this counts as hypotension for AKI purposes.
pub const AKI_HYPOTENSION_SBP: f64 = 100.0;
/// Creatinine (mg/dL) above this counts as elevated.
pub const AKI_CREATININE_MG_DL: f64 = 1.5;

pub fn aki_risk(obs: &Observation) -> u8 {
    use aki_weights::*;

    let h = &obs.history;
    let mut score = 0u32;

    if obs.age.is_some_and(|a| a >= ELDERLY_AGE) {
        score += AGE_65_PLUS;
    }
    if h.diuretic && h.acei_arb {
        score += DIURETIC_WITH_ACEI;
    }
    if obs.vitals.systolic_bp.is_some_and(|s| s < AKI_HYPOTENSION_SBP) {
        score += HYPOTENSION;
    }
    if h.active_chemo {
        score += ACTIVE_CHEMO;
    }
    if obs.labs.creatinine.is_some_and(|c| c > AKI_CREATININE_MG_DL) {
        score += ELEVATED_CREATININE;
    }
    if h.nsaid {
        score += NSAID;
    }
    if h.heart_failure {
        score += HEART_FAILURE;
    }

    score.min(100) as u8
}

// ═══════════════════════════════════════════════════════════
// qSOFA-style sepsis screen (0-3)
// ═══════════════════════════════════════════════════════════

pub const QSOFA_SBP_MAX: f64 = 100.0;
pub const QSOFA_RR_MIN: f64 = 22.0;

/// Canonical three-point qSOFA. Temperature is deliberately not scored here;
/// fever and hypothermia are carried by SIRS.
pub fn sepsis_score(obs: &Observation) -> u8 {
    let mut score = 0u8;
    if obs.vitals.systolic_bp.is_some_and(|s| s <= QSOFA_SBP_MAX) {
        score += 1;
    }
    if obs.vitals.resp_rate.is_some_and(|rr| rr >= QSOFA_RR_MIN) {
        score += 1;
    }
    if obs.history.altered_mental_status {
        score += 1;
    }
    score
}

// ═══════════════════════════════════════════════════════════
// SIRS (0-4)
// ═══════════════════════════════════════════════════════════

pub fn sirs_score(obs: &Observation) -> u8 {
    let v = &obs.vitals;
    let mut score = 0u8;
    if v.temp_c.is_some_and(|t| !(36.0..=38.0).contains(&t)) {
        score += 1;
    }
    if v.heart_rate.is_some_and(|hr| hr > 90.0) {
        score += 1;
    }
    if v.resp_rate.is_some_and(|rr| rr > 20.0) {
        score += 1;
    }
    if obs.labs.wbc.is_some_and(|w| !(4.0..=12.0).contains(&w)) {
        score += 1;
    }
    score
}

// ═══════════════════════════════════════════════════════════
// Hypoglycemia risk (0-100)
// ═══════════════════════════════════════════════════════════

pub mod hypoglycemia_weights {
    pub const INSULIN: u32 = 40;
    pub const RENAL_IMPAIRMENT: u32 = 30;
    pub const POORLY_CONTROLLED_DIABETES: u32 = 20;
}

/// Creatinine (mg/dL) above which insulin clearance is assumed impaired.
pub const RENAL_IMPAIRMENT_CREATININE: f64 = 1.3;

pub fn hypoglycemia_risk(obs: &Observation) -> u8 {
    use hypoglycemia_weights::*;

    let mut score = 0u32;
    if obs.history.insulin {
        score += INSULIN;
    }
    if obs
        .labs
        .creatinine
        .is_some_and(|c| c > RENAL_IMPAIRMENT_CREATININE)
    {
        score += RENAL_IMPAIRMENT;
    }
    if obs.history.poorly_controlled_diabetes {
        score += POORLY_CONTROLLED_DIABETES;
    }
    score.min(100) as u8
}
