//! The protocol rule table.
//!
//! One entry per parameter band. Within a parameter, rules are listed from
//! the most to the least severe; the interpreter stops at the first match.
//! A rule that only adds commentary to a finding already reported under
//! another parameter uses `Counting::UnlessFlagged` so one physiological
//! cause is counted once.

use crate::models::{
    AlertSeverity, Hemodynamics, Observation, RiskProfile, RuleCategory, AKI_CRITICAL_PCT,
    BLEEDING_CRITICAL_PCT, SEPSIS_CRITICAL_SCORE,
};

use super::messages::MessageTemplates as M;

/// What a rule is about. At most one alert is emitted per parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Spo2,
    RespRate,
    Co2Retention,
    SystolicBp,
    MeanArterialPressure,
    HeartRate,
    ShockIndex,
    PulsePressure,
    Lactate,
    MentalStatus,
    Temperature,
    Glucose,
    Potassium,
    AceiHyperkalemia,
    Hemoglobin,
    Platelets,
    Inr,
    Wbc,
    Creatinine,
    Bun,
    BunCreatinineRatio,
    BleedingRisk,
    AkiRisk,
    Qsofa,
    Sirs,
    HypoglycemiaRisk,
}

/// Whether a fired rule adds to the violation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counting {
    Always,
    Never,
    /// Counts only if the named parameter has not already fired.
    UnlessFlagged(Parameter),
}

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub obs: &'a Observation,
    pub profile: &'a RiskProfile,
    pub hemo: Hemodynamics,
}

impl<'a> RuleContext<'a> {
    pub fn new(obs: &'a Observation, profile: &'a RiskProfile) -> Self {
        Self {
            obs,
            profile,
            hemo: obs.hemodynamics(),
        }
    }
}

pub struct Rule {
    pub code: &'static str,
    pub category: RuleCategory,
    pub parameter: Parameter,
    pub severity: AlertSeverity,
    pub condition: fn(&RuleContext) -> bool,
    pub message: fn(&RuleContext) -> String,
    pub action: &'static str,
    pub counting: Counting,
}

fn below(v: Option<f64>, limit: f64) -> bool {
    v.is_some_and(|x| x < limit)
}

fn above(v: Option<f64>, limit: f64) -> bool {
    v.is_some_and(|x| x > limit)
}

fn at_least(v: Option<f64>, limit: f64) -> bool {
    v.is_some_and(|x| x >= limit)
}

fn at_most(v: Option<f64>, limit: f64) -> bool {
    v.is_some_and(|x| x <= limit)
}

use AlertSeverity::{Critical, Info, Warning};
use Counting::{Always, Never, UnlessFlagged};
use RuleCategory::{
    AirwayBreathing, Circulation, DisabilityMetabolic, Hematology, ModelDerived, RenalPerfusion,
};

pub static RULES: &[Rule] = &[
    // ═══════════════════════════════════════════════════════════
    // Airway & breathing
    // ═══════════════════════════════════════════════════════════
    Rule {
        code: "SPO2_CRITICAL",
        category: AirwayBreathing,
        parameter: Parameter::Spo2,
        severity: Critical,
        condition: |c| below(c.obs.vitals.spo2, 88.0),
        message: |c| M::reading("SpO2", c.obs.vitals.spo2, "%", "critical hypoxemia"),
        action: "Apply high-flow oxygen, sit patient upright, call rapid response.",
        counting: Always,
    },
    Rule {
        code: "SPO2_LOW",
        category: AirwayBreathing,
        parameter: Parameter::Spo2,
        severity: Warning,
        condition: |c| below(c.obs.vitals.spo2, 92.0),
        message: |c| M::reading("SpO2", c.obs.vitals.spo2, "%", "hypoxemia"),
        action: "Titrate supplemental oxygen to target 94-98% and obtain ABG.",
        counting: Always,
    },
    Rule {
        code: "RR_SEVERE_TACHYPNEA",
        category: AirwayBreathing,
        parameter: Parameter::RespRate,
        severity: Critical,
        condition: |c| at_least(c.obs.vitals.resp_rate, 30.0),
        message: |c| M::reading("Respiratory rate", c.obs.vitals.resp_rate, "/min", "severe tachypnea"),
        action: "Assess airway and work of breathing; consider ventilatory support.",
        counting: Always,
    },
    Rule {
        code: "RR_BRADYPNEA",
        category: AirwayBreathing,
        parameter: Parameter::RespRate,
        severity: Critical,
        condition: |c| at_most(c.obs.vitals.resp_rate, 8.0),
        message: |c| M::reading("Respiratory rate", c.obs.vitals.resp_rate, "/min", "bradypnea"),
        action: "Check for opioid or sedative excess; prepare bag-valve-mask support.",
        counting: Always,
    },
    Rule {
        code: "RR_TACHYPNEA",
        category: AirwayBreathing,
        parameter: Parameter::RespRate,
        severity: Warning,
        condition: |c| at_least(c.obs.vitals.resp_rate, 22.0),
        message: |c| M::reading("Respiratory rate", c.obs.vitals.resp_rate, "/min", "tachypnea"),
        action: "Increase observation frequency; look for sepsis, pain or acidosis.",
        counting: Always,
    },
    Rule {
        code: "CO2_RETENTION_RISK",
        category: AirwayBreathing,
        parameter: Parameter::Co2Retention,
        severity: Warning,
        condition: |c| below(c.obs.vitals.resp_rate, 10.0),
        message: |_| M::commentary("Low respiratory rate: risk of CO2 retention and respiratory acidosis."),
        action: "Obtain venous or arterial blood gas.",
        counting: UnlessFlagged(Parameter::RespRate),
    },
    // ═══════════════════════════════════════════════════════════
    // Circulation
    // ═══════════════════════════════════════════════════════════
    Rule {
        code: "SBP_HYPOTENSION_CRITICAL",
        category: Circulation,
        parameter: Parameter::SystolicBp,
        severity: Critical,
        condition: |c| below(c.obs.vitals.systolic_bp, 90.0),
        message: |c| M::reading("Systolic BP", c.obs.vitals.systolic_bp, "mmHg", "hypotension"),
        action: "Start fluid resuscitation (30 mL/kg crystalloid if septic) and reassess perfusion.",
        counting: Always,
    },
    Rule {
        code: "SBP_HYPERTENSIVE_CRISIS",
        category: Circulation,
        parameter: Parameter::SystolicBp,
        severity: Critical,
        condition: |c| above(c.obs.vitals.systolic_bp, 180.0),
        message: |c| M::reading("Systolic BP", c.obs.vitals.systolic_bp, "mmHg", "hypertensive crisis"),
        action: "Screen for end-organ damage; controlled BP reduction per protocol.",
        counting: Always,
    },
    Rule {
        code: "SBP_LOW",
        category: Circulation,
        parameter: Parameter::SystolicBp,
        severity: Warning,
        condition: |c| below(c.obs.vitals.systolic_bp, 100.0),
        message: |c| M::reading("Systolic BP", c.obs.vitals.systolic_bp, "mmHg", "borderline hypotension"),
        action: "Repeat BP, review antihypertensives and fluid balance.",
        counting: Always,
    },
    Rule {
        code: "SBP_HIGH",
        category: Circulation,
        parameter: Parameter::SystolicBp,
        severity: Warning,
        condition: |c| above(c.obs.vitals.systolic_bp, 140.0),
        message: |c| M::reading("Systolic BP", c.obs.vitals.systolic_bp, "mmHg", "hypertension"),
        action: "Recheck after rest; review pain and medication timing.",
        counting: Always,
    },
    Rule {
        code: "MAP_LOW",
        category: Circulation,
        parameter: Parameter::MeanArterialPressure,
        severity: Critical,
        condition: |c| below(c.hemo.mean_arterial_pressure, 65.0),
        message: |c| M::reading("MAP", c.hemo.mean_arterial_pressure, "mmHg", "organ perfusion at risk"),
        action: "Target MAP >= 65 mmHg; consider vasopressors if fluid-refractory.",
        counting: UnlessFlagged(Parameter::SystolicBp),
    },
    Rule {
        code: "HR_SEVERE_TACHYCARDIA",
        category: Circulation,
        parameter: Parameter::HeartRate,
        severity: Critical,
        condition: |c| above(c.obs.vitals.heart_rate, 130.0),
        message: |c| M::reading("Heart rate", c.obs.vitals.heart_rate, "bpm", "severe tachycardia"),
        action: "12-lead ECG and continuous cardiac monitoring.",
        counting: Always,
    },
    Rule {
        code: "HR_SEVERE_BRADYCARDIA",
        category: Circulation,
        parameter: Parameter::HeartRate,
        severity: Critical,
        condition: |c| below(c.obs.vitals.heart_rate, 40.0),
        message: |c| M::reading("Heart rate", c.obs.vitals.heart_rate, "bpm", "severe bradycardia"),
        action: "12-lead ECG; have atropine and pacing available.",
        counting: Always,
    },
    Rule {
        code: "HR_TACHYCARDIA",
        category: Circulation,
        parameter: Parameter::HeartRate,
        severity: Warning,
        condition: |c| above(c.obs.vitals.heart_rate, 100.0),
        message: |c| M::reading("Heart rate", c.obs.vitals.heart_rate, "bpm", "tachycardia"),
        action: "Look for fever, pain, hypovolemia or arrhythmia.",
        counting: Always,
    },
    Rule {
        code: "HR_BRADYCARDIA",
        category: Circulation,
        parameter: Parameter::HeartRate,
        severity: Warning,
        condition: |c| below(c.obs.vitals.heart_rate, 50.0),
        message: |c| M::reading("Heart rate", c.obs.vitals.heart_rate, "bpm", "bradycardia"),
        action: "Review beta-blockers and conduction on ECG.",
        counting: Always,
    },
    Rule {
        code: "SHOCK_INDEX_CRITICAL",
        category: Circulation,
        parameter: Parameter::ShockIndex,
        severity: Critical,
        condition: |c| at_least(c.hemo.shock_index, 1.0),
        message: |c| M::reading("Shock index", c.hemo.shock_index, "", "occult shock likely"),
        action: "Assess for hemorrhage or sepsis; prepare for resuscitation.",
        counting: Always,
    },
    Rule {
        code: "SHOCK_INDEX_ELEVATED",
        category: Circulation,
        parameter: Parameter::ShockIndex,
        severity: Warning,
        condition: |c| above(c.hemo.shock_index, 0.9),
        message: |c| M::reading("Shock index", c.hemo.shock_index, "", "elevated"),
        action: "Trend heart rate and BP closely.",
        counting: Always,
    },
    Rule {
        code: "PULSE_PRESSURE_NARROW",
        category: Circulation,
        parameter: Parameter::PulsePressure,
        severity: Warning,
        condition: |c| below(c.hemo.pulse_pressure, 25.0),
        message: |c| M::reading("Pulse pressure", c.hemo.pulse_pressure, "mmHg", "narrowed"),
        action: "Consider low stroke volume, tamponade or tension physiology.",
        counting: Always,
    },
    Rule {
        code: "LACTATE_CRITICAL",
        category: Circulation,
        parameter: Parameter::Lactate,
        severity: Critical,
        condition: |c| at_least(c.obs.labs.lactate, 4.0),
        message: |c| M::reading("Lactate", c.obs.labs.lactate, "mmol/L", "tissue hypoperfusion"),
        action: "Initiate sepsis bundle; repeat lactate within 2 hours.",
        counting: Always,
    },
    Rule {
        code: "LACTATE_ELEVATED",
        category: Circulation,
        parameter: Parameter::Lactate,
        severity: Warning,
        condition: |c| at_least(c.obs.labs.lactate, 2.0),
        message: |c| M::reading("Lactate", c.obs.labs.lactate, "mmol/L", "elevated"),
        action: "Repeat lactate and review perfusion.",
        counting: Always,
    },
    // ═══════════════════════════════════════════════════════════
    // Disability & metabolic
    // ═══════════════════════════════════════════════════════════
    Rule {
        code: "ALTERED_MENTAL_STATUS",
        category: DisabilityMetabolic,
        parameter: Parameter::MentalStatus,
        severity: Critical,
        condition: |c| c.obs.history.altered_mental_status,
        message: |_| M::commentary("Altered mental status."),
        action: "Check glucose, GCS and neuro exam; protect airway.",
        counting: Always,
    },
    Rule {
        code: "TEMP_CRITICAL_HIGH",
        category: DisabilityMetabolic,
        parameter: Parameter::Temperature,
        severity: Critical,
        condition: |c| at_least(c.obs.vitals.temp_c, 40.0),
        message: |c| M::reading("Temperature", c.obs.vitals.temp_c, "°C", "hyperpyrexia"),
        action: "Active cooling, blood cultures, consider heat illness or NMS.",
        counting: Always,
    },
    Rule {
        code: "TEMP_CRITICAL_LOW",
        category: DisabilityMetabolic,
        parameter: Parameter::Temperature,
        severity: Critical,
        condition: |c| below(c.obs.vitals.temp_c, 35.0),
        message: |c| M::reading("Temperature", c.obs.vitals.temp_c, "°C", "hypothermia"),
        action: "Active rewarming and cardiac monitoring.",
        counting: Always,
    },
    Rule {
        code: "TEMP_FEVER",
        category: DisabilityMetabolic,
        parameter: Parameter::Temperature,
        severity: Warning,
        condition: |c| above(c.obs.vitals.temp_c, 38.3),
        message: |c| M::reading("Temperature", c.obs.vitals.temp_c, "°C", "fever"),
        action: "Blood cultures before antibiotics; antipyretics.",
        counting: Always,
    },
    Rule {
        code: "TEMP_LOW",
        category: DisabilityMetabolic,
        parameter: Parameter::Temperature,
        severity: Warning,
        condition: |c| below(c.obs.vitals.temp_c, 36.0),
        message: |c| M::reading("Temperature", c.obs.vitals.temp_c, "°C", "low temperature"),
        action: "Warm patient; consider sepsis in the elderly.",
        counting: Always,
    },
    Rule {
        code: "GLUCOSE_SEVERE_HYPO",
        category: DisabilityMetabolic,
        parameter: Parameter::Glucose,
        severity: Critical,
        condition: |c| below(c.obs.labs.glucose, 54.0),
        message: |c| M::reading("Glucose", c.obs.labs.glucose, "mg/dL", "severe hypoglycemia"),
        action: "Give IV dextrose or IM glucagon now; recheck in 15 minutes.",
        counting: Always,
    },
    Rule {
        code: "GLUCOSE_SEVERE_HYPER",
        category: DisabilityMetabolic,
        parameter: Parameter::Glucose,
        severity: Critical,
        condition: |c| above(c.obs.labs.glucose, 400.0),
        message: |c| M::reading("Glucose", c.obs.labs.glucose, "mg/dL", "severe hyperglycemia"),
        action: "Check ketones and osmolality; start DKA/HHS protocol if indicated.",
        counting: Always,
    },
    Rule {
        code: "GLUCOSE_LOW",
        category: DisabilityMetabolic,
        parameter: Parameter::Glucose,
        severity: Warning,
        condition: |c| below(c.obs.labs.glucose, 70.0),
        message: |c| M::reading("Glucose", c.obs.labs.glucose, "mg/dL", "hypoglycemia"),
        action: "Oral glucose if able to swallow; hold insulin.",
        counting: Always,
    },
    Rule {
        code: "GLUCOSE_HIGH",
        category: DisabilityMetabolic,
        parameter: Parameter::Glucose,
        severity: Warning,
        condition: |c| above(c.obs.labs.glucose, 250.0),
        message: |c| M::reading("Glucose", c.obs.labs.glucose, "mg/dL", "hyperglycemia"),
        action: "Correctional insulin and repeat glucose.",
        counting: Always,
    },
    Rule {
        code: "K_SEVERE_HYPER",
        category: DisabilityMetabolic,
        parameter: Parameter::Potassium,
        severity: Critical,
        condition: |c| at_least(c.obs.labs.potassium, 6.0),
        message: |c| M::reading("Potassium", c.obs.labs.potassium, "mmol/L", "severe hyperkalemia"),
        action: "ECG now; IV calcium, insulin-dextrose and stop potassium sources.",
        counting: Always,
    },
    Rule {
        code: "K_SEVERE_HYPO",
        category: DisabilityMetabolic,
        parameter: Parameter::Potassium,
        severity: Critical,
        condition: |c| below(c.obs.labs.potassium, 2.5),
        message: |c| M::reading("Potassium", c.obs.labs.potassium, "mmol/L", "severe hypokalemia"),
        action: "Cardiac monitoring and IV potassium replacement.",
        counting: Always,
    },
    Rule {
        code: "K_HIGH",
        category: DisabilityMetabolic,
        parameter: Parameter::Potassium,
        severity: Warning,
        condition: |c| above(c.obs.labs.potassium, 5.0),
        message: |c| M::reading("Potassium", c.obs.labs.potassium, "mmol/L", "hyperkalemia"),
        action: "Repeat level, review potassium-sparing drugs.",
        counting: Always,
    },
    Rule {
        code: "K_LOW",
        category: DisabilityMetabolic,
        parameter: Parameter::Potassium,
        severity: Warning,
        condition: |c| below(c.obs.labs.potassium, 3.5),
        message: |c| M::reading("Potassium", c.obs.labs.potassium, "mmol/L", "hypokalemia"),
        action: "Oral replacement and check magnesium.",
        counting: Always,
    },
    Rule {
        code: "ACEI_HYPERKALEMIA",
        category: DisabilityMetabolic,
        parameter: Parameter::AceiHyperkalemia,
        severity: Info,
        condition: |c| c.obs.history.acei_arb && above(c.obs.labs.potassium, 5.0),
        message: |_| M::commentary("Hyperkalemia on ACE inhibitor or ARB."),
        action: "Consider holding ACEi/ARB until potassium normalizes.",
        counting: Never,
    },
    // ═══════════════════════════════════════════════════════════
    // Hematology
    // ═══════════════════════════════════════════════════════════
    Rule {
        code: "HGB_CRITICAL",
        category: Hematology,
        parameter: Parameter::Hemoglobin,
        severity: Critical,
        condition: |c| below(c.obs.labs.hemoglobin, 7.0),
        message: |c| M::reading("Hemoglobin", c.obs.labs.hemoglobin, "g/dL", "severe anemia"),
        action: "Type and crossmatch; transfuse per threshold and look for bleeding.",
        counting: Always,
    },
    Rule {
        code: "HGB_LOW",
        category: Hematology,
        parameter: Parameter::Hemoglobin,
        severity: Warning,
        condition: |c| below(c.obs.labs.hemoglobin, 10.0),
        message: |c| M::reading("Hemoglobin", c.obs.labs.hemoglobin, "g/dL", "anemia"),
        action: "Trend hemoglobin; check iron studies and occult loss.",
        counting: Always,
    },
    Rule {
        code: "PLT_CRITICAL",
        category: Hematology,
        parameter: Parameter::Platelets,
        severity: Critical,
        condition: |c| below(c.obs.labs.platelets, 50.0),
        message: |c| M::reading("Platelets", c.obs.labs.platelets, "x10^9/L", "severe thrombocytopenia"),
        action: "Hold anticoagulants and antiplatelets; bleeding precautions.",
        counting: Always,
    },
    Rule {
        code: "PLT_LOW",
        category: Hematology,
        parameter: Parameter::Platelets,
        severity: Warning,
        condition: |c| below(c.obs.labs.platelets, 150.0),
        message: |c| M::reading("Platelets", c.obs.labs.platelets, "x10^9/L", "thrombocytopenia"),
        action: "Review heparin exposure (HIT) and repeat count.",
        counting: Always,
    },
    Rule {
        code: "INR_CRITICAL",
        category: Hematology,
        parameter: Parameter::Inr,
        severity: Critical,
        condition: |c| above(c.obs.labs.inr, 4.5),
        message: |c| M::reading("INR", c.obs.labs.inr, "", "high bleeding risk"),
        action: "Hold warfarin; consider vitamin K and reversal if bleeding.",
        counting: Always,
    },
    Rule {
        code: "INR_HIGH",
        category: Hematology,
        parameter: Parameter::Inr,
        severity: Warning,
        condition: |c| above(c.obs.labs.inr, 3.5),
        message: |c| M::reading("INR", c.obs.labs.inr, "", "supratherapeutic"),
        action: "Adjust anticoagulant dose and recheck INR.",
        counting: Always,
    },
    Rule {
        code: "WBC_CRITICAL",
        category: Hematology,
        parameter: Parameter::Wbc,
        severity: Critical,
        condition: |c| at_least(c.obs.labs.wbc, 30.0),
        message: |c| M::reading("WBC", c.obs.labs.wbc, "x10^9/L", "marked leukocytosis"),
        action: "Blood film; evaluate for leukemoid reaction or malignancy.",
        counting: Always,
    },
    Rule {
        code: "WBC_HIGH",
        category: Hematology,
        parameter: Parameter::Wbc,
        severity: Warning,
        condition: |c| above(c.obs.labs.wbc, 12.0),
        message: |c| M::reading("WBC", c.obs.labs.wbc, "x10^9/L", "leukocytosis"),
        action: "Search for infection source.",
        counting: Always,
    },
    Rule {
        code: "WBC_LOW",
        category: Hematology,
        parameter: Parameter::Wbc,
        severity: Warning,
        condition: |c| below(c.obs.labs.wbc, 4.0),
        message: |c| M::reading("WBC", c.obs.labs.wbc, "x10^9/L", "leukopenia"),
        action: "Check neutrophil count; neutropenic precautions if low.",
        counting: Always,
    },
    // ═══════════════════════════════════════════════════════════
    // Renal & perfusion
    // ═══════════════════════════════════════════════════════════
    Rule {
        code: "CREATININE_CRITICAL",
        category: RenalPerfusion,
        parameter: Parameter::Creatinine,
        severity: Critical,
        condition: |c| at_least(c.obs.labs.creatinine, 4.0),
        message: |c| M::reading("Creatinine", c.obs.labs.creatinine, "mg/dL", "severe renal impairment"),
        action: "Urgent nephrology review; assess for dialysis indications.",
        counting: Always,
    },
    Rule {
        code: "CREATININE_HIGH",
        category: RenalPerfusion,
        parameter: Parameter::Creatinine,
        severity: Warning,
        condition: |c| above(c.obs.labs.creatinine, 1.5),
        message: |c| M::reading("Creatinine", c.obs.labs.creatinine, "mg/dL", "renal impairment"),
        action: "Renally dose medications; avoid nephrotoxins; monitor urine output.",
        counting: Always,
    },
    Rule {
        code: "BUN_HIGH",
        category: RenalPerfusion,
        parameter: Parameter::Bun,
        severity: Warning,
        condition: |c| above(c.obs.labs.bun, 40.0),
        message: |c| M::reading("BUN", c.obs.labs.bun, "mg/dL", "azotemia"),
        action: "Assess hydration, GI bleeding and catabolic state.",
        counting: Always,
    },
    Rule {
        code: "BUN_CR_RATIO_PRERENAL",
        category: RenalPerfusion,
        parameter: Parameter::BunCreatinineRatio,
        severity: Info,
        condition: |c| above(c.hemo.bun_creatinine_ratio, 20.0),
        message: |c| M::reading("BUN/creatinine ratio", c.hemo.bun_creatinine_ratio, "", "suggests prerenal cause"),
        action: "Consider volume depletion or upper GI bleeding.",
        counting: Never,
    },
    // ═══════════════════════════════════════════════════════════
    // Model-derived scores
    // ═══════════════════════════════════════════════════════════
    Rule {
        code: "BLEEDING_RISK_HIGH",
        category: ModelDerived,
        parameter: Parameter::BleedingRisk,
        severity: Critical,
        condition: |c| c.profile.bleeding_risk_pct > BLEEDING_CRITICAL_PCT,
        message: |c| M::percent("Bleeding risk", c.profile.bleeding_risk_pct, "high"),
        action: "Review anticoagulation, check INR and platelets, bleeding precautions.",
        counting: Always,
    },
    Rule {
        code: "BLEEDING_RISK_MODERATE",
        category: ModelDerived,
        parameter: Parameter::BleedingRisk,
        severity: Warning,
        condition: |c| c.profile.bleeding_risk_pct > 30.0,
        message: |c| M::percent("Bleeding risk", c.profile.bleeding_risk_pct, "moderate"),
        action: "Reassess need for anticoagulant and antiplatelet therapy.",
        counting: Always,
    },
    Rule {
        code: "AKI_RISK_HIGH",
        category: ModelDerived,
        parameter: Parameter::AkiRisk,
        severity: Critical,
        condition: |c| c.profile.aki_risk_pct > AKI_CRITICAL_PCT,
        message: |c| M::percent("AKI risk", f64::from(c.profile.aki_risk_pct), "high"),
        action: "Stop nephrotoxins, optimize volume status, strict input/output.",
        counting: Always,
    },
    Rule {
        code: "AKI_RISK_MODERATE",
        category: ModelDerived,
        parameter: Parameter::AkiRisk,
        severity: Warning,
        condition: |c| c.profile.aki_risk_pct > 30,
        message: |c| M::percent("AKI risk", f64::from(c.profile.aki_risk_pct), "moderate"),
        action: "Daily creatinine and medication review.",
        counting: Always,
    },
    Rule {
        code: "QSOFA_POSITIVE",
        category: ModelDerived,
        parameter: Parameter::Qsofa,
        severity: Critical,
        condition: |c| c.profile.sepsis_score >= SEPSIS_CRITICAL_SCORE,
        message: |c| M::score("qSOFA", c.profile.sepsis_score, 3, "sepsis likely"),
        action: "Sepsis bundle: cultures, lactate, broad-spectrum antibiotics within 1 hour.",
        counting: Always,
    },
    Rule {
        code: "SIRS_POSITIVE",
        category: ModelDerived,
        parameter: Parameter::Sirs,
        severity: Warning,
        condition: |c| c.profile.sirs_score >= 2,
        message: |c| M::score("SIRS", c.profile.sirs_score, 4, "systemic inflammatory response"),
        action: "Evaluate for infection source.",
        counting: Always,
    },
    Rule {
        code: "HYPOGLYCEMIA_RISK_HIGH",
        category: ModelDerived,
        parameter: Parameter::HypoglycemiaRisk,
        severity: Warning,
        condition: |c| c.profile.hypoglycemia_risk_pct > 50,
        message: |c| M::percent("Hypoglycemia risk", f64::from(c.profile.hypoglycemia_risk_pct), "high"),
        action: "Reduce insulin dose and increase glucose checks.",
        counting: Always,
    },
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut seen = HashSet::new();
        for rule in RULES {
            assert!(seen.insert(rule.code), "duplicate code {}", rule.code);
        }
    }

    #[test]
    fn parameters_are_contiguous_and_ordered_by_severity() {
        // Rules for one parameter sit together, most severe first, so the
        // first match is always the strongest applicable band.
        let mut closed = HashSet::new();
        let mut current: Option<(Parameter, AlertSeverity)> = None;
        for rule in RULES {
            match current {
                Some((p, sev)) if p == rule.parameter => {
                    assert!(rule.severity <= sev, "{} out of order", rule.code);
                }
                Some((p, _)) => {
                    closed.insert(p);
                    assert!(!closed.contains(&rule.parameter), "{} split", rule.code);
                }
                None => {}
            }
            current = Some((rule.parameter, rule.severity));
        }
    }

    #[test]
    fn bun_and_map_appear_once() {
        let bun = RULES.iter().filter(|r| r.parameter == Parameter::Bun).count();
        let map = RULES
            .iter()
            .filter(|r| r.parameter == Parameter::MeanArterialPressure)
            .count();
        assert_eq!((bun, map), (1, 1));
    }

    #[test]
    fn flagged_parameters_precede_their_dependents() {
        for (i, rule) in RULES.iter().enumerate() {
            if let Counting::UnlessFlagged(p) = rule.counting {
                assert!(
                    RULES[..i].iter().any(|r| r.parameter == p),
                    "{} depends on a later parameter",
                    rule.code
                );
            }
        }
    }
}
