//! Unit inference, presence mapping and range validation.
//!
//! Unit inference is a value-range heuristic, not metadata: glucose below
//! 30 is read as mmol/L and creatinine above 20 as µmol/L. A genuine
//! extreme reading in conventional units (glucose 25 mg/dL, say) will be
//! converted wrongly. The batch path accepts that trade-off; the single
//! observation path takes explicit units and skips the heuristic.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::columns::Field;
use super::ValidationIssue;
use crate::models::{Gender, Observation, WeightUnit};

/// Glucose below this is assumed to be mmol/L.
pub const GLUCOSE_MMOL_CUTOFF: f64 = 30.0;
pub const GLUCOSE_MMOL_TO_MG_DL: f64 = 18.0;
/// Creatinine above this is assumed to be µmol/L.
pub const CREATININE_UMOL_CUTOFF: f64 = 20.0;
pub const CREATININE_UMOL_PER_MG_DL: f64 = 88.4;
pub const LBS_TO_KG: f64 = 0.453592;

pub fn normalize_glucose(value: f64) -> f64 {
    if value < GLUCOSE_MMOL_CUTOFF {
        value * GLUCOSE_MMOL_TO_MG_DL
    } else {
        value
    }
}

pub fn normalize_creatinine(value: f64) -> f64 {
    if value > CREATININE_UMOL_CUTOFF {
        value / CREATININE_UMOL_PER_MG_DL
    } else {
        value
    }
}

pub fn weight_to_kg(value: f64, unit: WeightUnit) -> f64 {
    match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lbs => value * LBS_TO_KG,
    }
}

/// Plausible input window per numeric field, checked after unit conversion.
pub fn valid_range(field: Field) -> Option<RangeInclusive<f64>> {
    let range = match field {
        Field::Age => 0.0..=120.0,
        Field::Weight => 0.0..=400.0,
        Field::Height => 0.0..=250.0,
        Field::SystolicBp => 0.0..=300.0,
        Field::DiastolicBp => 0.0..=200.0,
        Field::HeartRate => 0.0..=300.0,
        Field::RespRate => 0.0..=60.0,
        Field::Temperature => 0.0..=45.0,
        Field::Spo2 => 0.0..=100.0,
        Field::Creatinine => 0.0..=20.0,
        Field::Bun => 0.0..=200.0,
        Field::Potassium => 0.0..=10.0,
        Field::Glucose => 0.0..=1000.0,
        Field::Wbc => 0.0..=50.0,
        Field::Hemoglobin => 0.0..=20.0,
        Field::Platelets => 0.0..=1000.0,
        Field::Inr => 0.0..=10.0,
        Field::Lactate => 0.0..=20.0,
        _ => return None,
    };
    Some(range)
}

/// Accepts `1/true/yes/y/x` as set and `0/false/no/n` or blank as clear.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "x" | "1.0" => Some(true),
        "" | "0" | "false" | "no" | "n" | "0.0" => Some(false),
        _ => None,
    }
}

/// Whether the heuristic unit conversions run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPolicy {
    /// Values are already in mg/dL and kg (or the stated weight unit).
    Explicit,
    /// Infer glucose and creatinine units from magnitude.
    Heuristic,
}

/// Accumulates one observation field by field, recording every value it
/// had to drop.
#[derive(Debug)]
pub struct ObservationBuilder {
    obs: Observation,
    policy: UnitPolicy,
    issues: Vec<ValidationIssue>,
}

impl ObservationBuilder {
    pub fn new(policy: UnitPolicy) -> Self {
        Self {
            obs: Observation::default(),
            policy,
            issues: Vec::new(),
        }
    }

    /// Set a field from a text cell. Blank cells are "not provided".
    pub fn set_text(&mut self, field: Field, unit: WeightUnit, raw: &str) {
        let trimmed = raw.trim();
        if field.is_flag() {
            match parse_flag(trimmed) {
                Some(value) => self.set_flag(field, value),
                None => self.reject(field, trimmed, "unrecognised flag value"),
            }
            return;
        }
        if field == Field::Gender {
            if trimmed.is_empty() {
                return;
            }
            match Gender::parse_loose(trimmed) {
                Some(g) => self.obs.gender = Some(g),
                None => self.reject(field, trimmed, "unrecognised gender"),
            }
            return;
        }
        if trimmed.is_empty() {
            return;
        }
        match trimmed.parse::<f64>() {
            Ok(value) => self.set_number(field, unit, value),
            Err(_) => self.reject(field, trimmed, "not a number"),
        }
    }

    /// Set a numeric field. Zero means "not provided" and leaves it absent.
    pub fn set_number(&mut self, field: Field, unit: WeightUnit, value: f64) {
        if !value.is_finite() {
            self.reject(field, &value.to_string(), "not a finite number");
            return;
        }
        if value == 0.0 {
            return;
        }

        let converted = match (field, self.policy) {
            (Field::Weight, _) => weight_to_kg(value, unit),
            (Field::Glucose, UnitPolicy::Heuristic) => normalize_glucose(value),
            (Field::Creatinine, UnitPolicy::Heuristic) => normalize_creatinine(value),
            _ => value,
        };

        let Some(range) = valid_range(field) else {
            self.reject(field, &value.to_string(), "not a numeric field");
            return;
        };
        if !range.contains(&converted) {
            self.reject(
                field,
                &value.to_string(),
                &format!("outside {}..={}", range.start(), range.end()),
            );
            return;
        }

        let slot = Some(converted);
        let (v, l) = (&mut self.obs.vitals, &mut self.obs.labs);
        match field {
            Field::Age => self.obs.age = Some(converted.round() as u32),
            Field::Weight => self.obs.weight_kg = slot,
            Field::Height => self.obs.height_cm = slot,
            Field::SystolicBp => v.systolic_bp = slot,
            Field::DiastolicBp => v.diastolic_bp = slot,
            Field::HeartRate => v.heart_rate = slot,
            Field::RespRate => v.resp_rate = slot,
            Field::Temperature => v.temp_c = slot,
            Field::Spo2 => v.spo2 = slot,
            Field::Creatinine => l.creatinine = slot,
            Field::Bun => l.bun = slot,
            Field::Potassium => l.potassium = slot,
            Field::Glucose => l.glucose = slot,
            Field::Wbc => l.wbc = slot,
            Field::Hemoglobin => l.hemoglobin = slot,
            Field::Platelets => l.platelets = slot,
            Field::Inr => l.inr = slot,
            Field::Lactate => l.lactate = slot,
            _ => {}
        }
    }

    pub fn set_flag(&mut self, field: Field, value: bool) {
        let h = &mut self.obs.history;
        match field {
            Field::Anticoagulant => h.anticoagulant = value,
            Field::LiverDisease => h.liver_disease = value,
            Field::HeartFailure => h.heart_failure = value,
            Field::GiBleed => h.gi_bleed = value,
            Field::Nsaid => h.nsaid = value,
            Field::ActiveChemo => h.active_chemo = value,
            Field::Diuretic => h.diuretic = value,
            Field::AceiArb => h.acei_arb = value,
            Field::Insulin => h.insulin = value,
            Field::PoorlyControlledDiabetes => h.poorly_controlled_diabetes = value,
            Field::AlteredMentalStatus => h.altered_mental_status = value,
            _ => {}
        }
    }

    pub fn set_gender(&mut self, gender: Option<Gender>) {
        self.obs.gender = gender;
    }

    fn reject(&mut self, field: Field, raw: &str, reason: &str) {
        tracing::debug!(field = %field, raw, reason, "Value dropped during normalization");
        self.issues.push(ValidationIssue {
            field,
            raw: raw.to_string(),
            reason: reason.to_string(),
        });
    }

    pub fn finish(self) -> Normalized {
        Normalized {
            observation: self.obs,
            issues: self.issues,
        }
    }
}

/// A normalized observation plus whatever was dropped on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub observation: Observation,
    pub issues: Vec<ValidationIssue>,
}

/// Field-by-field single-patient input, as a form or JSON body supplies it.
/// Zeros and absent keys both mean "not provided".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservationInput {
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub weight: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub height_cm: Option<f64>,
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub heart_rate: Option<f64>,
    pub resp_rate: Option<f64>,
    pub temp_c: Option<f64>,
    pub spo2: Option<f64>,
    pub creatinine: Option<f64>,
    pub bun: Option<f64>,
    pub potassium: Option<f64>,
    pub glucose: Option<f64>,
    pub wbc: Option<f64>,
    pub hemoglobin: Option<f64>,
    pub platelets: Option<f64>,
    pub inr: Option<f64>,
    pub lactate: Option<f64>,
    pub anticoagulant: bool,
    pub liver_disease: bool,
    pub heart_failure: bool,
    pub gi_bleed: bool,
    pub nsaid: bool,
    pub active_chemo: bool,
    pub diuretic: bool,
    pub acei_arb: bool,
    pub insulin: bool,
    pub poorly_controlled_diabetes: bool,
    pub altered_mental_status: bool,
}

impl ObservationInput {
    /// Validate and convert. Never fails; rejected values become issues.
    pub fn normalize(&self) -> Normalized {
        let mut b = ObservationBuilder::new(UnitPolicy::Explicit);
        let unit = self.weight_unit.unwrap_or(WeightUnit::Kg);

        let numbers = [
            (Field::Age, self.age),
            (Field::Weight, self.weight),
            (Field::Height, self.height_cm),
            (Field::SystolicBp, self.systolic_bp),
            (Field::DiastolicBp, self.diastolic_bp),
            (Field::HeartRate, self.heart_rate),
            (Field::RespRate, self.resp_rate),
            (Field::Temperature, self.temp_c),
            (Field::Spo2, self.spo2),
            (Field::Creatinine, self.creatinine),
            (Field::Bun, self.bun),
            (Field::Potassium, self.potassium),
            (Field::Glucose, self.glucose),
            (Field::Wbc, self.wbc),
            (Field::Hemoglobin, self.hemoglobin),
            (Field::Platelets, self.platelets),
            (Field::Inr, self.inr),
            (Field::Lactate, self.lactate),
        ];
        for (field, value) in numbers {
            if let Some(v) = value {
                b.set_number(field, unit, v);
            }
        }

        let flags = [
            (Field::Anticoagulant, self.anticoagulant),
            (Field::LiverDisease, self.liver_disease),
            (Field::HeartFailure, self.heart_failure),
            (Field::GiBleed, self.gi_bleed),
            (Field::Nsaid, self.nsaid),
            (Field::ActiveChemo, self.active_chemo),
            (Field::Diuretic, self.diuretic),
            (Field::AceiArb, self.acei_arb),
            (Field::Insulin, self.insulin),
            (Field::PoorlyControlledDiabetes, self.poorly_controlled_diabetes),
            (Field::AlteredMentalStatus, self.altered_mental_status),
        ];
        for (field, value) in flags {
            b.set_flag(field, value);
        }
        b.set_gender(self.gender);
        b.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glucose_mmol_converts() {
        assert!((normalize_glucose(5.5) - 99.0).abs() < 1e-9);
        assert_eq!(normalize_glucose(30.0), 30.0);
        assert_eq!(normalize_glucose(145.0), 145.0);
    }

    #[test]
    fn creatinine_umol_converts() {
        assert!((normalize_creatinine(150.0) - 1.696).abs() < 0.001);
        assert_eq!(normalize_creatinine(20.0), 20.0);
        assert_eq!(normalize_creatinine(2.4), 2.4);
    }

    #[test]
    fn pounds_convert_to_kg() {
        assert!((weight_to_kg(200.0, WeightUnit::Lbs) - 90.7184).abs() < 1e-4);
        assert_eq!(weight_to_kg(80.0, WeightUnit::Kg), 80.0);
    }

    #[test]
    fn flags_parse_loosely() {
        for yes in ["1", "TRUE", "Yes", " y ", "x"] {
            assert_eq!(parse_flag(yes), Some(true), "{yes}");
        }
        for no in ["0", "false", "No", "", "n"] {
            assert_eq!(parse_flag(no), Some(false), "{no}");
        }
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn zero_means_absent() {
        let mut b = ObservationBuilder::new(UnitPolicy::Heuristic);
        b.set_text(Field::SystolicBp, WeightUnit::Kg, "0");
        b.set_text(Field::Glucose, WeightUnit::Kg, "0");
        let n = b.finish();
        assert_eq!(n.observation.vitals.systolic_bp, None);
        assert_eq!(n.observation.labs.glucose, None);
        assert!(n.issues.is_empty());
    }

    #[test]
    fn heuristic_policy_converts_cells() {
        let mut b = ObservationBuilder::new(UnitPolicy::Heuristic);
        b.set_text(Field::Glucose, WeightUnit::Kg, "5.5");
        b.set_text(Field::Creatinine, WeightUnit::Kg, "150");
        let obs = b.finish().observation;
        assert!((obs.labs.glucose.unwrap() - 99.0).abs() < 1e-9);
        assert!((obs.labs.creatinine.unwrap() - 1.696).abs() < 0.001);
    }

    #[test]
    fn explicit_policy_leaves_units_alone() {
        let mut b = ObservationBuilder::new(UnitPolicy::Explicit);
        b.set_number(Field::Glucose, WeightUnit::Kg, 25.0);
        assert_eq!(b.finish().observation.labs.glucose, Some(25.0));
    }

    #[test]
    fn out_of_range_becomes_issue() {
        let mut b = ObservationBuilder::new(UnitPolicy::Heuristic);
        b.set_text(Field::Spo2, WeightUnit::Kg, "140");
        b.set_text(Field::HeartRate, WeightUnit::Kg, "fast");
        b.set_text(Field::Insulin, WeightUnit::Kg, "sometimes");
        let n = b.finish();
        assert_eq!(n.observation.vitals.spo2, None);
        assert_eq!(n.observation.vitals.heart_rate, None);
        assert!(!n.observation.history.insulin);
        let fields: Vec<_> = n.issues.iter().map(|i| i.field).collect();
        assert_eq!(fields, vec![Field::Spo2, Field::HeartRate, Field::Insulin]);
    }

    #[test]
    fn creatinine_window_checked_after_conversion() {
        // 1900 µmol/L is 21.5 mg/dL, outside the window.
        let mut b = ObservationBuilder::new(UnitPolicy::Heuristic);
        b.set_number(Field::Creatinine, WeightUnit::Kg, 1900.0);
        let n = b.finish();
        assert_eq!(n.observation.labs.creatinine, None);
        assert_eq!(n.issues.len(), 1);
    }

    #[test]
    fn non_finite_is_rejected() {
        let mut b = ObservationBuilder::new(UnitPolicy::Explicit);
        b.set_number(Field::Temperature, WeightUnit::Kg, f64::NAN);
        let n = b.finish();
        assert_eq!(n.observation.vitals.temp_c, None);
        assert_eq!(n.issues.len(), 1);
    }

    #[test]
    fn input_normalizes_with_pounds() {
        let input = ObservationInput {
            age: Some(72.0),
            weight: Some(176.0),
            weight_unit: Some(WeightUnit::Lbs),
            systolic_bp: Some(88.0),
            diastolic_bp: Some(0.0),
            anticoagulant: true,
            ..ObservationInput::default()
        };
        let n = input.normalize();
        assert_eq!(n.observation.age, Some(72));
        assert!((n.observation.weight_kg.unwrap() - 79.832).abs() < 0.01);
        assert_eq!(n.observation.vitals.diastolic_bp, None);
        assert!(n.observation.history.anticoagulant);
        assert!(n.issues.is_empty());
    }

    #[test]
    fn input_deserializes_from_partial_json() {
        let input: ObservationInput =
            serde_json::from_str(r#"{"age": 50, "gender": "female", "heart_failure": true}"#)
                .unwrap();
        let obs = input.normalize().observation;
        assert_eq!(obs.age, Some(50));
        assert_eq!(obs.gender, Some(Gender::Female));
        assert!(obs.history.heart_failure);
    }
}
