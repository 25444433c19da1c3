use serde::{Deserialize, Serialize};

use super::messages::MessageTemplates;
use super::rules::{Counting, Parameter, Rule, RuleContext, RULES};
use crate::models::{Alert, AlertSeverity, Observation, OverallStatus, RiskProfile, RuleCategory};

/// Outcome of one cascade pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Critical first, then Warning, then Info; table order within a level.
    pub alerts: Vec<Alert>,
    pub violation_count: usize,
    pub overall_status: OverallStatus,
}

impl CascadeReport {
    pub fn critical_count(&self) -> usize {
        self.alerts.iter().filter(|a| a.is_critical()).count()
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.alerts.iter().any(|a| a.code == code)
    }
}

/// Run the standard rule table.
pub fn evaluate(obs: &Observation, profile: &RiskProfile) -> CascadeReport {
    evaluate_rules(RULES, obs, profile)
}

/// Run an arbitrary rule table. Rules for the same parameter must be
/// ordered most severe first.
pub fn evaluate_rules(rules: &[Rule], obs: &Observation, profile: &RiskProfile) -> CascadeReport {
    let ctx = RuleContext::new(obs, profile);
    let mut fired: Vec<Parameter> = Vec::new();
    let mut alerts = Vec::new();
    let mut violation_count = 0;

    for rule in rules {
        if fired.contains(&rule.parameter) || !(rule.condition)(&ctx) {
            continue;
        }
        let counts = match rule.counting {
            Counting::Always => true,
            Counting::Never => false,
            Counting::UnlessFlagged(other) => !fired.contains(&other),
        };
        fired.push(rule.parameter);
        if counts {
            violation_count += 1;
        }
        alerts.push(Alert {
            severity: rule.severity,
            code: rule.code.to_string(),
            category: rule.category,
            message: (rule.message)(&ctx),
            recommended_action: rule.action.to_string(),
            contributes_to_violation_count: counts,
        });
    }

    if violation_count == 0 {
        alerts.push(summary_notice(obs));
    }

    // Stable: equal severities keep table order.
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));

    let overall_status = OverallStatus::from_scores(
        profile.bleeding_risk_pct,
        profile.aki_risk_pct,
        profile.sepsis_score,
    );

    tracing::debug!(
        alerts = alerts.len(),
        violations = violation_count,
        status = %overall_status,
        "Cascade evaluated"
    );

    CascadeReport {
        alerts,
        violation_count,
        overall_status,
    }
}

fn summary_notice(obs: &Observation) -> Alert {
    let (code, message, action) = if !obs.has_vitals() && !obs.has_demographics() {
        ("NO_DATA", MessageTemplates::no_data(), "Enter vitals and demographics.")
    } else if !obs.has_vitals() {
        (
            "MISSING_VITALS",
            MessageTemplates::missing_vitals(),
            "Record a full set of vital signs.",
        )
    } else {
        ("STABLE", MessageTemplates::stable(), "Continue routine monitoring.")
    };
    Alert {
        severity: AlertSeverity::Info,
        code: code.to_string(),
        category: RuleCategory::Summary,
        message,
        recommended_action: action.to_string(),
        contributes_to_violation_count: false,
    }
}
