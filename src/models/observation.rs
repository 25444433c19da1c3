use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// One point-in-time patient snapshot.
///
/// Every vital and lab is optional: `None` means "not provided". A literal
/// zero coming from a form or spreadsheet is mapped to `None` at ingestion,
/// so nothing downstream has to guess whether 0 is a reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub vitals: Vitals,
    pub labs: Labs,
    pub history: HistoryFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub systolic_bp: Option<f64>,
    pub diastolic_bp: Option<f64>,
    pub heart_rate: Option<f64>,
    pub resp_rate: Option<f64>,
    pub temp_c: Option<f64>,
    /// Peripheral oxygen saturation, percent.
    pub spo2: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Labs {
    /// mg/dL
    pub creatinine: Option<f64>,
    /// mg/dL
    pub bun: Option<f64>,
    /// mmol/L
    pub potassium: Option<f64>,
    /// mg/dL
    pub glucose: Option<f64>,
    /// x10^9/L
    pub wbc: Option<f64>,
    /// g/dL
    pub hemoglobin: Option<f64>,
    /// x10^9/L
    pub platelets: Option<f64>,
    pub inr: Option<f64>,
    /// mmol/L
    pub lactate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFlags {
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

impl Observation {
    /// Any demographic field supplied (gender alone does not count).
    pub fn has_demographics(&self) -> bool {
        self.age.is_some() || self.weight_kg.is_some() || self.height_cm.is_some()
    }

    pub fn has_vitals(&self) -> bool {
        let v = &self.vitals;
        [
            v.systolic_bp,
            v.diastolic_bp,
            v.heart_rate,
            v.resp_rate,
            v.temp_c,
            v.spo2,
        ]
        .iter()
        .any(Option::is_some)
    }

    /// Derived hemodynamic and body-size indices.
    pub fn hemodynamics(&self) -> Hemodynamics {
        Hemodynamics::derive(self)
    }
}

/// Values computed once from an [`Observation`] and never re-entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Hemodynamics {
    pub mean_arterial_pressure: Option<f64>,
    pub pulse_pressure: Option<f64>,
    pub shock_index: Option<f64>,
    pub bun_creatinine_ratio: Option<f64>,
    pub bmi: Option<f64>,
}

impl Hemodynamics {
    pub fn derive(obs: &Observation) -> Self {
        let sbp = obs.vitals.systolic_bp.filter(|v| *v > 0.0);
        let dbp = obs.vitals.diastolic_bp;

        let (mean_arterial_pressure, pulse_pressure) = match (sbp, dbp) {
            (Some(s), Some(d)) => (Some((s + 2.0 * d) / 3.0), Some(s - d)),
            _ => (None, None),
        };
        let shock_index = match (obs.vitals.heart_rate, sbp) {
            (Some(hr), Some(s)) => Some(hr / s),
            _ => None,
        };
        let bun_creatinine_ratio = match (obs.labs.bun, obs.labs.creatinine) {
            (Some(bun), Some(cr)) if cr > 0.0 => Some(bun / cr),
            _ => None,
        };
        let bmi = match (obs.weight_kg, obs.height_cm) {
            (Some(w), Some(h)) if h > 0.0 => {
                let m = h / 100.0;
                Some(w / (m * m))
            }
            _ => None,
        };

        Self {
            mean_arterial_pressure,
            pulse_pressure,
            shock_index,
            bun_creatinine_ratio,
            bmi,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_bp(sbp: f64, dbp: f64) -> Observation {
        let mut obs = Observation::default();
        obs.vitals.systolic_bp = Some(sbp);
        obs.vitals.diastolic_bp = Some(dbp);
        obs
    }

    #[test]
    fn map_and_pulse_pressure() {
        let h = with_bp(120.0, 80.0).hemodynamics();
        let map = h.mean_arterial_pressure.unwrap();
        assert!((map - 93.333).abs() < 0.01);
        assert_eq!(h.pulse_pressure, Some(40.0));
    }

    #[test]
    fn map_undefined_without_systolic() {
        let mut obs = Observation::default();
        obs.vitals.diastolic_bp = Some(70.0);
        let h = obs.hemodynamics();
        assert!(h.mean_arterial_pressure.is_none());
        assert!(h.pulse_pressure.is_none());
    }

    #[test]
    fn shock_index_needs_both() {
        let mut obs = with_bp(100.0, 60.0);
        assert!(obs.hemodynamics().shock_index.is_none());
        obs.vitals.heart_rate = Some(120.0);
        assert_eq!(obs.hemodynamics().shock_index, Some(1.2));
    }

    #[test]
    fn bun_creatinine_ratio_and_bmi() {
        let mut obs = Observation::default();
        obs.labs.bun = Some(45.0);
        obs.labs.creatinine = Some(2.5);
        obs.weight_kg = Some(80.0);
        obs.height_cm = Some(200.0);
        let h = obs.hemodynamics();
        assert_eq!(h.bun_creatinine_ratio, Some(18.0));
        assert_eq!(h.bmi, Some(20.0));
    }

    #[test]
    fn presence_checks() {
        let mut obs = Observation::default();
        assert!(!obs.has_demographics());
        assert!(!obs.has_vitals());
        obs.gender = Some(Gender::Female);
        assert!(!obs.has_demographics());
        obs.age = Some(40);
        assert!(obs.has_demographics());
        obs.vitals.spo2 = Some(97.0);
        assert!(obs.has_vitals());
    }
}
