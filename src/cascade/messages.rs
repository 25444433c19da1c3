/// Message builder for cascade alerts. Keeps wording uniform across rules:
/// label, value with unit, then the finding.
pub struct MessageTemplates;

impl MessageTemplates {
    /// A raw vital or lab outside its band.
    pub fn reading(label: &str, value: Option<f64>, unit: &str, finding: &str) -> String {
        let value = value.map_or_else(|| "n/a".to_string(), format_value);
        if unit.is_empty() {
            format!("{label} {value}: {finding}")
        } else {
            format!("{label} {value} {unit}: {finding}")
        }
    }

    /// An integer score out of its maximum.
    pub fn score(label: &str, value: u8, max: u8, finding: &str) -> String {
        format!("{label} {value}/{max}: {finding}")
    }

    /// A percentage risk.
    pub fn percent(label: &str, pct: f64, finding: &str) -> String {
        format!("{label} {pct:.1}%: {finding}")
    }

    /// Context-only commentary with no single reading attached.
    pub fn commentary(text: &str) -> String {
        text.to_string()
    }

    pub fn no_data() -> String {
        "No vitals or demographics entered. Enter patient data to run the cascade.".into()
    }

    pub fn missing_vitals() -> String {
        "Demographics recorded but no vital signs. Scores are incomplete until vitals are entered."
            .into()
    }

    pub fn stable() -> String {
        "All evaluated parameters within protocol limits. No violations detected.".into()
    }
}

/// Up to two decimals with trailing zeros removed: 88, 1.1, 1.7.
pub fn format_value(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_drop_trailing_zeros() {
        assert_eq!(format_value(88.0), "88");
        assert_eq!(format_value(1.10), "1.1");
        assert_eq!(format_value(1.696), "1.7");
        assert_eq!(format_value(0.0), "0");
    }

    #[test]
    fn reading_includes_unit() {
        assert_eq!(
            MessageTemplates::reading("Systolic BP", Some(88.0), "mmHg", "hypotension"),
            "Systolic BP 88 mmHg: hypotension"
        );
        assert_eq!(
            MessageTemplates::reading("INR", Some(4.8), "", "over-anticoagulated"),
            "INR 4.8: over-anticoagulated"
        );
    }

    #[test]
    fn score_and_percent() {
        assert_eq!(MessageTemplates::score("qSOFA", 2, 3, "x"), "qSOFA 2/3: x");
        assert_eq!(MessageTemplates::percent("Bleeding risk", 62.345, "y"), "Bleeding risk 62.3%: y");
    }
}
