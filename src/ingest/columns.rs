//! Column-name aliasing for tabular input.
//!
//! Headers are matched case-insensitively in two passes: the whole folded
//! header against exact aliases, then, in table order, whole-word tokens
//! (`sys`, `hr`, `k`) and longer stems (`systol`, `creat`). Entries that
//! could collide (diastolic before systolic, SpO2 before heart rate) are
//! ordered so the more specific one wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::WeightUnit;

/// Every observation field a column can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Gender,
    Weight,
    Height,
    SystolicBp,
    DiastolicBp,
    HeartRate,
    RespRate,
    Temperature,
    Spo2,
    Creatinine,
    Bun,
    Potassium,
    Glucose,
    Wbc,
    Hemoglobin,
    Platelets,
    Inr,
    Lactate,
    Anticoagulant,
    LiverDisease,
    HeartFailure,
    GiBleed,
    Nsaid,
    ActiveChemo,
    Diuretic,
    AceiArb,
    Insulin,
    PoorlyControlledDiabetes,
    AlteredMentalStatus,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Weight => "weight",
            Self::Height => "height",
            Self::SystolicBp => "systolic_bp",
            Self::DiastolicBp => "diastolic_bp",
            Self::HeartRate => "heart_rate",
            Self::RespRate => "resp_rate",
            Self::Temperature => "temp_c",
            Self::Spo2 => "spo2",
            Self::Creatinine => "creatinine",
            Self::Bun => "bun",
            Self::Potassium => "potassium",
            Self::Glucose => "glucose",
            Self::Wbc => "wbc",
            Self::Hemoglobin => "hemoglobin",
            Self::Platelets => "platelets",
            Self::Inr => "inr",
            Self::Lactate => "lactate",
            Self::Anticoagulant => "anticoagulant",
            Self::LiverDisease => "liver_disease",
            Self::HeartFailure => "heart_failure",
            Self::GiBleed => "gi_bleed",
            Self::Nsaid => "nsaid",
            Self::ActiveChemo => "active_chemo",
            Self::Diuretic => "diuretic",
            Self::AceiArb => "acei_arb",
            Self::Insulin => "insulin",
            Self::PoorlyControlledDiabetes => "poorly_controlled_diabetes",
            Self::AlteredMentalStatus => "altered_mental_status",
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            Self::Anticoagulant
                | Self::LiverDisease
                | Self::HeartFailure
                | Self::GiBleed
                | Self::Nsaid
                | Self::ActiveChemo
                | Self::Diuretic
                | Self::AceiArb
                | Self::Insulin
                | Self::PoorlyControlledDiabetes
                | Self::AlteredMentalStatus
        )
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Alias {
    field: Field,
    /// Whole folded header.
    exact: &'static [&'static str],
    /// Whole tokens; short abbreviations live here so `age` never matches
    /// inside `average`.
    tokens: &'static [&'static str],
    /// Substrings of the folded header. Long stems only.
    stems: &'static [&'static str],
}

static ALIASES: &[Alias] = &[
    Alias {
        field: Field::PoorlyControlledDiabetes,
        exact: &["poorlycontrolleddiabetes", "uncontrolleddiabetes", "hba1chigh"],
        tokens: &["a1c", "dm"],
        stems: &["diabet", "hba1c"],
    },
    Alias {
        field: Field::AlteredMentalStatus,
        exact: &["alteredmentalstatus", "mentalstatus"],
        tokens: &["ams", "confusion", "confused"],
        stems: &["mentalstat", "confus", "altered"],
    },
    Alias {
        field: Field::Anticoagulant,
        exact: &["anticoagulant", "anticoag"],
        tokens: &["warfarin", "doac", "apixaban", "rivaroxaban"],
        stems: &["anticoag"],
    },
    Alias {
        field: Field::AceiArb,
        exact: &["aceiarb", "aceinhibitor"],
        tokens: &["acei", "arb", "acearb"],
        stems: &["aceinhib"],
    },
    Alias {
        field: Field::Diuretic,
        exact: &["diuretic"],
        tokens: &["furosemide", "lasix"],
        stems: &["diuret"],
    },
    Alias {
        field: Field::Nsaid,
        exact: &["nsaid"],
        tokens: &["nsaids", "ibuprofen"],
        stems: &["nsaid"],
    },
    Alias {
        field: Field::ActiveChemo,
        exact: &["activechemo"],
        tokens: &["chemo"],
        stems: &["chemo"],
    },
    Alias {
        field: Field::Insulin,
        exact: &["insulin"],
        tokens: &[],
        stems: &["insulin"],
    },
    Alias {
        field: Field::LiverDisease,
        exact: &["liverdisease"],
        tokens: &["liver", "cirrhosis"],
        stems: &["liver", "cirrho", "hepat"],
    },
    Alias {
        field: Field::HeartFailure,
        exact: &["heartfailure"],
        tokens: &["hf", "chf", "hfref", "hfpef"],
        stems: &["heartfail", "cardiacfail"],
    },
    Alias {
        field: Field::GiBleed,
        exact: &["gibleed", "gihistory", "bleedhistory"],
        tokens: &["gib", "ugib", "lgib"],
        stems: &["gibleed", "gihaemorr", "gihemorr"],
    },
    Alias {
        field: Field::DiastolicBp,
        exact: &["diastolicbp", "diabp"],
        tokens: &["dbp", "dia", "diastolic"],
        stems: &["diastol"],
    },
    Alias {
        field: Field::SystolicBp,
        exact: &["systolicbp", "sysbp"],
        tokens: &["sbp", "sys", "systolic"],
        stems: &["systol"],
    },
    Alias {
        field: Field::Spo2,
        exact: &["spo2", "o2sat", "sao2", "pulseox"],
        tokens: &["spo2", "sao2", "sats", "ox"],
        stems: &["o2sat", "saturation", "oximet"],
    },
    Alias {
        field: Field::HeartRate,
        exact: &["heartrate", "bpm"],
        tokens: &["hr", "pulse"],
        stems: &["heartrate", "pulserate"],
    },
    Alias {
        field: Field::RespRate,
        exact: &["resprate", "respiratoryrate"],
        tokens: &["rr", "resp"],
        stems: &["respir", "resprate"],
    },
    Alias {
        field: Field::Temperature,
        exact: &["tempc", "temperature"],
        tokens: &["temp", "t"],
        stems: &["temperat"],
    },
    Alias {
        field: Field::Bun,
        exact: &["bloodureanitrogen"],
        tokens: &["bun", "urea"],
        stems: &["ureanitrogen"],
    },
    Alias {
        field: Field::Creatinine,
        exact: &["creatinine"],
        tokens: &["cr", "scr", "creat"],
        stems: &["creat"],
    },
    Alias {
        field: Field::Potassium,
        exact: &["potassium", "kplus"],
        tokens: &["k"],
        stems: &["potass"],
    },
    Alias {
        field: Field::Glucose,
        exact: &["bloodglucose"],
        tokens: &["glu", "bg", "bsl", "cbg"],
        stems: &["gluc"],
    },
    Alias {
        field: Field::Wbc,
        exact: &["whitecells", "whitebloodcells"],
        tokens: &["wbc", "wcc"],
        stems: &["leuko", "leuco", "whitecell", "whiteblood"],
    },
    Alias {
        field: Field::Hemoglobin,
        exact: &["hemoglobin", "haemoglobin"],
        tokens: &["hb", "hgb"],
        stems: &["globin"],
    },
    Alias {
        field: Field::Platelets,
        exact: &["platelets"],
        tokens: &["plt", "plts"],
        stems: &["platelet"],
    },
    Alias {
        field: Field::Inr,
        exact: &["inr"],
        tokens: &["inr"],
        stems: &[],
    },
    Alias {
        field: Field::Lactate,
        exact: &["lacticacid"],
        tokens: &["lac", "lactate", "lactic"],
        stems: &["lactate"],
    },
    Alias {
        field: Field::Weight,
        exact: &["weight", "weightkg", "weightlbs", "weightlb", "kg", "lbs"],
        tokens: &["wt"],
        stems: &["weight"],
    },
    Alias {
        field: Field::Height,
        exact: &["heightcm", "cm"],
        tokens: &["ht"],
        stems: &["height"],
    },
    Alias {
        field: Field::Age,
        exact: &["ageyears", "years"],
        tokens: &["age", "yrs"],
        stems: &[],
    },
    Alias {
        field: Field::Gender,
        exact: &["gender", "sex"],
        tokens: &["sex", "gender"],
        stems: &["gender"],
    },
];

/// Derived or output columns. These look like inputs (`Pulse Pressure`
/// would otherwise read as a pulse) but are never bound.
static DERIVED: &[&str] = &[
    "pulsepressure",
    "meanarterial",
    "shockindex",
    "newsscore",
    "news2",
    "clinicalstatus",
    "bleedrisk",
];

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lower-to-upper case transitions, so `BpSys` tokenizes as `bp sys`.
static CAMEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

/// Pound markers in a weight header: `Weight (lbs)`, `wt_lb`, `weightlbs`.
static POUNDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^a-z])(?:lbs?|pounds?)(?:[^a-z]|$)|lbs?$").unwrap());

/// Lowercase alphanumeric form used for matching.
pub fn fold_header(header: &str) -> String {
    NON_ALNUM
        .replace_all(&header.trim().to_lowercase(), "")
        .into_owned()
}

/// Lowercase alphanumeric words of a header: `HR (bpm)` gives `hr`, `bpm`.
pub fn header_tokens(header: &str) -> Vec<String> {
    let spaced = CAMEL.replace_all(header.trim(), "$1 $2").to_lowercase();
    NON_ALNUM
        .split(&spaced)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve one header to a field, or `None` if nothing matches.
///
/// An exact match on the folded header wins outright. Otherwise the first
/// alias in table order with a matching token or stem is taken.
pub fn resolve(header: &str) -> Option<Field> {
    let key = fold_header(header);
    if key.is_empty() || DERIVED.iter().any(|d| key.contains(d)) {
        return None;
    }
    if let Some(alias) = ALIASES.iter().find(|a| a.exact.contains(&key.as_str())) {
        return Some(alias.field);
    }
    let tokens = header_tokens(header);
    ALIASES
        .iter()
        .find(|a| {
            a.tokens.iter().any(|t| tokens.iter().any(|h| h == t))
                || a.stems.iter().any(|s| key.contains(s))
        })
        .map(|a| a.field)
}

/// Unit implied by a weight header.
pub fn weight_unit(header: &str) -> WeightUnit {
    if POUNDS.is_match(header.trim()) {
        WeightUnit::Lbs
    } else {
        WeightUnit::Kg
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnBinding {
    pub field: Field,
    pub unit: WeightUnit,
}

/// Header-to-field mapping for a whole table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    bindings: Vec<Option<ColumnBinding>>,
}

impl ColumnMap {
    /// Map every header. When two headers resolve to the same field the
    /// leftmost one wins and the other is ignored.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = Vec::new();
        let mut bindings = Vec::new();
        for header in headers {
            let binding = match resolve(header) {
                Some(field) if seen.contains(&field) => {
                    tracing::debug!(header, field = %field, "Duplicate column ignored");
                    None
                }
                Some(field) => {
                    seen.push(field);
                    let unit = if field == Field::Weight {
                        weight_unit(header)
                    } else {
                        WeightUnit::Kg
                    };
                    Some(ColumnBinding { field, unit })
                }
                None => {
                    tracing::debug!(header, "Unrecognised column passed through");
                    None
                }
            };
            bindings.push(binding);
        }
        Self { bindings }
    }

    pub fn binding(&self, column: usize) -> Option<ColumnBinding> {
        self.bindings.get(column).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn mapped_fields(&self) -> Vec<Field> {
        self.bindings.iter().flatten().map(|b| b.field).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_punctuation() {
        assert_eq!(fold_header("  Heart Rate (bpm) "), "heartratebpm");
        assert_eq!(fold_header("Sys_BP"), "sysbp");
    }

    #[test]
    fn short_aliases_match_exactly() {
        assert_eq!(resolve("SBP"), Some(Field::SystolicBp));
        assert_eq!(resolve("sys"), Some(Field::SystolicBp));
        assert_eq!(resolve("DBP"), Some(Field::DiastolicBp));
        assert_eq!(resolve("HR"), Some(Field::HeartRate));
        assert_eq!(resolve("RR"), Some(Field::RespRate));
        assert_eq!(resolve("K"), Some(Field::Potassium));
        assert_eq!(resolve("Cr"), Some(Field::Creatinine));
        assert_eq!(resolve("Hb"), Some(Field::Hemoglobin));
    }

    #[test]
    fn descriptive_headers_match_by_keyword() {
        assert_eq!(resolve("Systolic Pressure"), Some(Field::SystolicBp));
        assert_eq!(resolve("Diastolic Pressure"), Some(Field::DiastolicBp));
        assert_eq!(resolve("Respiratory Rate"), Some(Field::RespRate));
        assert_eq!(resolve("Temperature (C)"), Some(Field::Temperature));
        assert_eq!(resolve("Serum Creatinine"), Some(Field::Creatinine));
        assert_eq!(resolve("Patient Age"), Some(Field::Age));
        assert_eq!(resolve("On Anticoagulants"), Some(Field::Anticoagulant));
    }

    #[test]
    fn diabetes_is_not_diastolic() {
        assert_eq!(resolve("Diabetes Poorly Controlled"), Some(Field::PoorlyControlledDiabetes));
        assert_eq!(resolve("dia"), Some(Field::DiastolicBp));
    }

    #[test]
    fn heart_failure_is_not_heart_rate() {
        assert_eq!(resolve("Heart Failure"), Some(Field::HeartFailure));
        assert_eq!(resolve("Heart Rate"), Some(Field::HeartRate));
    }

    #[test]
    fn unknown_headers_are_unmapped() {
        assert_eq!(resolve("Patient ID"), None);
        assert_eq!(resolve("   "), None);
    }

    #[test]
    fn abbreviations_with_units_match_by_token() {
        assert_eq!(resolve("BP_Sys"), Some(Field::SystolicBp));
        assert_eq!(resolve("BpSys"), Some(Field::SystolicBp));
        assert_eq!(resolve("BP Dia"), Some(Field::DiastolicBp));
        assert_eq!(resolve("HR (bpm)"), Some(Field::HeartRate));
        assert_eq!(resolve("RR (/min)"), Some(Field::RespRate));
        assert_eq!(resolve("BUN (mg/dL)"), Some(Field::Bun));
        assert_eq!(resolve("K (mmol/L)"), Some(Field::Potassium));
        assert_eq!(resolve("Cr (mg/dL)"), Some(Field::Creatinine));
        assert_eq!(resolve("PLT (x10^9/L)"), Some(Field::Platelets));
        assert_eq!(resolve("Hb (g/L)"), Some(Field::Hemoglobin));
        assert_eq!(resolve("Temp (C)"), Some(Field::Temperature));
    }

    #[test]
    fn age_is_a_whole_word() {
        assert_eq!(resolve("Triage Level"), None);
        assert_eq!(resolve("CKD Stage"), None);
        assert_eq!(resolve("Average HR"), Some(Field::HeartRate));
        assert_eq!(resolve("Age (yrs)"), Some(Field::Age));
        assert_eq!(resolve("AgeYears"), Some(Field::Age));
    }

    #[test]
    fn triage_column_does_not_steal_age() {
        let map = ColumnMap::from_headers(["Triage Level", "Age"]);
        assert_eq!(map.binding(0), None);
        assert_eq!(map.binding(1).map(|b| b.field), Some(Field::Age));
    }

    #[test]
    fn pulse_oximetry_is_saturation() {
        assert_eq!(resolve("Pulse Ox"), Some(Field::Spo2));
        assert_eq!(resolve("Pulse Oximetry (%)"), Some(Field::Spo2));
        assert_eq!(resolve("Pulse"), Some(Field::HeartRate));
        assert_eq!(resolve("Pulse Rate"), Some(Field::HeartRate));
    }

    #[test]
    fn derived_and_output_columns_are_unmapped() {
        assert_eq!(resolve("Pulse Pressure"), None);
        assert_eq!(resolve("Mean Arterial Pressure"), None);
        assert_eq!(resolve("NEWS_Score"), None);
        assert_eq!(resolve("Bleed_Risk_%"), None);
        assert_eq!(resolve("Clinical_Status"), None);
    }

    #[test]
    fn hba1c_is_diabetes_not_hemoglobin() {
        assert_eq!(resolve("HbA1c"), Some(Field::PoorlyControlledDiabetes));
    }

    #[test]
    fn tokens_split_on_punctuation_and_case() {
        assert_eq!(header_tokens("HR (bpm)"), vec!["hr", "bpm"]);
        assert_eq!(header_tokens("BpSys"), vec!["bp", "sys"]);
        assert!(header_tokens(" -- ").is_empty());
    }

    #[test]
    fn weight_unit_from_header() {
        assert_eq!(weight_unit("Weight (lbs)"), WeightUnit::Lbs);
        assert_eq!(weight_unit("weight_lb"), WeightUnit::Lbs);
        assert_eq!(weight_unit("WeightLbs"), WeightUnit::Lbs);
        assert_eq!(weight_unit("Weight (kg)"), WeightUnit::Kg);
        assert_eq!(weight_unit("Weight"), WeightUnit::Kg);
    }

    #[test]
    fn column_map_keeps_leftmost_duplicate() {
        let map = ColumnMap::from_headers(["MRN", "SBP", "Systolic", "Weight (lbs)"]);
        assert_eq!(map.len(), 4);
        assert_eq!(map.binding(0), None);
        assert_eq!(map.binding(1).map(|b| b.field), Some(Field::SystolicBp));
        assert_eq!(map.binding(2), None);
        assert_eq!(
            map.binding(3),
            Some(ColumnBinding {
                field: Field::Weight,
                unit: WeightUnit::Lbs
            })
        );
        assert_eq!(map.mapped_fields(), vec![Field::SystolicBp, Field::Weight]);
    }
}
