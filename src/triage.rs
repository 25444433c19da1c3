//! Waiting-room triage board.
//!
//! A coarse pre-filter over SIRS and SpO2 only. It does not consult the
//! bleeding model or qSOFA and is deliberately independent of the cascade.

use serde::{Deserialize, Serialize};

use crate::models::{Observation, PriorityTier, RiskProfile};

/// SIRS at or above this is Critical.
pub const CRITICAL_SIRS: u8 = 3;
/// SpO2 strictly below this is Critical.
pub const CRITICAL_SPO2: f64 = 90.0;
/// SIRS at or above this is Urgent.
pub const URGENT_SIRS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageEntry {
    pub patient_id: String,
    pub complaint: String,
    pub sirs_score: u8,
    /// `None` when not measured; never counts as hypoxemia.
    pub spo2: Option<f64>,
}

impl TriageEntry {
    pub fn new(
        patient_id: impl Into<String>,
        complaint: impl Into<String>,
        sirs_score: u8,
        spo2: Option<f64>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            complaint: complaint.into(),
            sirs_score,
            spo2,
        }
    }

    /// Build from a scored observation.
    pub fn from_profile(
        patient_id: impl Into<String>,
        complaint: impl Into<String>,
        obs: &Observation,
        profile: &RiskProfile,
    ) -> Self {
        Self::new(patient_id, complaint, profile.sirs_score, obs.vitals.spo2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriagedPatient {
    pub entry: TriageEntry,
    pub tier: PriorityTier,
}

pub fn assign_tier(sirs_score: u8, spo2: Option<f64>) -> PriorityTier {
    if sirs_score >= CRITICAL_SIRS || spo2.is_some_and(|s| s < CRITICAL_SPO2) {
        PriorityTier::Critical
    } else if sirs_score >= URGENT_SIRS {
        PriorityTier::Urgent
    } else {
        PriorityTier::NonUrgent
    }
}

/// Tier every entry and order Critical, Urgent, Non-urgent. Arrival order
/// is kept within a tier.
pub fn prioritize(entries: Vec<TriageEntry>) -> Vec<TriagedPatient> {
    let mut board: Vec<TriagedPatient> = entries
        .into_iter()
        .map(|entry| TriagedPatient {
            tier: assign_tier(entry.sirs_score, entry.spo2),
            entry,
        })
        .collect();
    board.sort_by_key(|p| p.tier);

    tracing::debug!(
        patients = board.len(),
        critical = board.iter().filter(|p| p.tier == PriorityTier::Critical).count(),
        "Triage board ordered"
    );
    board
}

/// The five-patient demo board.
pub fn waiting_room_fixture() -> Vec<TriageEntry> {
    vec![
        TriageEntry::new("PT-1092", "Chest pain", 1, Some(98.0)),
        TriageEntry::new("PT-1093", "Fever/confusion", 4, Some(88.0)),
        TriageEntry::new("PT-1094", "Ankle pain", 0, Some(99.0)),
        TriageEntry::new("PT-1095", "Shortness of breath", 3, Some(91.0)),
        TriageEntry::new("PT-1096", "Medication refill", 0, Some(99.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(board: &[TriagedPatient]) -> Vec<&str> {
        board.iter().map(|p| p.entry.patient_id.as_str()).collect()
    }

    #[test]
    fn fixture_board_order() {
        let board = prioritize(waiting_room_fixture());
        assert_eq!(ids(&board), vec!["PT-1093", "PT-1095", "PT-1092", "PT-1094", "PT-1096"]);
        let tiers: Vec<_> = board.iter().map(|p| p.tier).collect();
        assert_eq!(
            tiers,
            vec![
                PriorityTier::Critical,
                PriorityTier::Critical,
                PriorityTier::NonUrgent,
                PriorityTier::NonUrgent,
                PriorityTier::NonUrgent,
            ]
        );
    }

    #[test]
    fn tier_thresholds() {
        assert_eq!(assign_tier(3, Some(99.0)), PriorityTier::Critical);
        assert_eq!(assign_tier(0, Some(89.9)), PriorityTier::Critical);
        assert_eq!(assign_tier(0, Some(90.0)), PriorityTier::NonUrgent);
        assert_eq!(assign_tier(2, Some(95.0)), PriorityTier::Urgent);
        assert_eq!(assign_tier(1, None), PriorityTier::NonUrgent);
    }

    #[test]
    fn urgent_sits_between() {
        let board = prioritize(vec![
            TriageEntry::new("a", "", 0, None),
            TriageEntry::new("b", "", 2, None),
            TriageEntry::new("c", "", 3, None),
            TriageEntry::new("d", "", 2, None),
        ]);
        assert_eq!(ids(&board), vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn empty_board() {
        assert!(prioritize(Vec::new()).is_empty());
    }

    #[test]
    fn entry_from_profile_uses_sirs_and_spo2() {
        use crate::scoring::test_support::engine;

        let mut obs = Observation::default();
        obs.age = Some(60);
        obs.vitals.systolic_bp = Some(120.0);
        obs.vitals.heart_rate = Some(110.0);
        obs.vitals.resp_rate = Some(24.0);
        obs.vitals.spo2 = Some(95.0);
        let profile = engine(0.0).score(&obs);
        let entry = TriageEntry::from_profile("x", "cough", &obs, &profile);
        assert_eq!(entry.sirs_score, 2);
        assert_eq!(entry.spo2, Some(95.0));
        assert_eq!(assign_tier(entry.sirs_score, entry.spo2), PriorityTier::Urgent);
    }
}
