//! Canned "load patient from EHR" record.
//!
//! Stands in for an EHR integration: a fixed, deteriorating septic patient
//! used by demos and end-to-end tests. There is no FHIR or HL7 parsing here.

use super::normalize::ObservationInput;
use crate::models::{Gender, Observation, WeightUnit};

pub fn ehr_import_input() -> ObservationInput {
    ObservationInput {
        age: Some(68.0),
        gender: Some(Gender::Male),
        weight: Some(82.5),
        weight_unit: Some(WeightUnit::Kg),
        systolic_bp: Some(88.0),
        diastolic_bp: Some(50.0),
        heart_rate: Some(115.0),
        resp_rate: Some(28.0),
        temp_c: Some(39.2),
        spo2: Some(89.0),
        creatinine: Some(2.4),
        bun: Some(45.0),
        potassium: Some(5.2),
        glucose: Some(145.0),
        wbc: Some(18.5),
        hemoglobin: Some(9.2),
        platelets: Some(140.0),
        inr: Some(1.1),
        lactate: Some(4.2),
        anticoagulant: true,
        heart_failure: true,
        ..ObservationInput::default()
    }
}

pub fn ehr_import_fixture() -> Observation {
    ehr_import_input().normalize().observation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_normalizes_cleanly() {
        let n = ehr_import_input().normalize();
        assert!(n.issues.is_empty());
        let obs = n.observation;
        assert_eq!(obs.age, Some(68));
        assert_eq!(obs.vitals.systolic_bp, Some(88.0));
        assert_eq!(obs.labs.lactate, Some(4.2));
        assert!(obs.history.anticoagulant && obs.history.heart_failure);
        assert!(!obs.history.altered_mental_status);
    }

    #[test]
    fn fixture_hemodynamics() {
        let h = ehr_import_fixture().hemodynamics();
        assert!((h.mean_arterial_pressure.unwrap() - 62.666).abs() < 0.01);
        assert_eq!(h.pulse_pressure, Some(38.0));
        assert!((h.shock_index.unwrap() - 1.3068).abs() < 0.001);
        assert!((h.bun_creatinine_ratio.unwrap() - 18.75).abs() < 1e-9);
    }
}
