use serde::{Deserialize, Serialize};

use super::enums::{AlertSeverity, RuleCategory};

/// One protocol alert produced by the cascade for an Observation + RiskProfile
/// pair. Transient: never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    /// Stable machine code, e.g. `SBP_HYPOTENSION_CRITICAL`.
    pub code: String,
    pub category: RuleCategory,
    pub message: String,
    pub recommended_action: String,
    pub contributes_to_violation_count: bool,
}

impl Alert {
    pub fn is_critical(&self) -> bool {
        self.severity == AlertSeverity::Critical
    }
}
