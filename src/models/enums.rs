use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
});

impl Gender {
    /// Lenient parse for form and spreadsheet input ("F", "Female", "w", ...).
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "m" | "male" | "man" => Some(Self::Male),
            "f" | "female" | "w" | "woman" => Some(Self::Female),
            _ => None,
        }
    }
}

str_enum!(WeightUnit {
    Kg => "kg",
    Lbs => "lbs",
});

str_enum!(
    /// Composite status of one scoring pass.
    OverallStatus {
        Stable => "Stable",
        Critical => "Critical",
    }
);

str_enum!(
    /// Ordered Info < Warning < Critical; the cascade sorts on this.
    #[derive(PartialOrd, Ord)]
    AlertSeverity {
        Info => "info",
        Warning => "warning",
        Critical => "critical",
    }
);

str_enum!(RuleCategory {
    AirwayBreathing => "airway_breathing",
    Circulation => "circulation",
    DisabilityMetabolic => "disability_metabolic",
    Hematology => "hematology",
    RenalPerfusion => "renal_perfusion",
    ModelDerived => "model_derived",
    Summary => "summary",
});

str_enum!(
    /// Waiting-room priority. Declared most urgent first so the derived
    /// ordering sorts Critical ahead of NonUrgent.
    #[derive(PartialOrd, Ord)]
    PriorityTier {
        Critical => "critical",
        Urgent => "urgent",
        NonUrgent => "non_urgent",
    }
);

impl PriorityTier {
    /// Board label, including the target time to assessment.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL (Immed)",
            Self::Urgent => "URGENT (15m)",
            Self::NonUrgent => "NON-URGENT",
        }
    }
}

str_enum!(
    /// NEWS-2 clinical response band.
    #[derive(PartialOrd, Ord)]
    News2Band {
        Low => "low",
        LowMedium => "low_medium",
        Medium => "medium",
        High => "high",
    }
);

impl News2Band {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::LowMedium => "Low-Medium Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}
