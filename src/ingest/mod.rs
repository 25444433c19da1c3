//! Observation ingestion: single records, delimited batches and the canned
//! EHR import.
//!
//! Bad values never abort ingestion. A value that cannot be used is dropped
//! to "not provided" and reported as a [`ValidationIssue`]; a batch row that
//! cannot be read at all is reported as a [`BatchRowError`] and the rest of
//! the batch carries on.

pub mod batch;
pub mod columns;
pub mod fixture;
pub mod normalize;

pub use batch::{BatchOptions, BatchReport, BatchRow, BatchSummary, RowOutcome};
pub use columns::{ColumnMap, Field};
pub use normalize::{Normalized, ObservationBuilder, ObservationInput, UnitPolicy};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch input has no header row")]
    MissingHeader,

    #[error("Invalid delimiter: {0:?}")]
    InvalidDelimiter(String),

    #[error("Invalid observation JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A value that was dropped during normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: Field,
    pub raw: String,
    pub reason: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?} ({})", self.field, self.raw, self.reason)
    }
}

/// A batch row that could not be scored. `row` is 1-based, header excluded.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("row {row}: {reason}")]
pub struct BatchRowError {
    pub row: usize,
    pub reason: String,
}

/// Parse a single observation from JSON and normalize it.
pub fn observation_from_json(json: &str) -> Result<Normalized, IngestError> {
    let input: ObservationInput = serde_json::from_str(json)?;
    Ok(input.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_observation_with_bad_value() {
        let n = observation_from_json(r#"{"age": 40, "spo2": 130, "systolic_bp": 0}"#).unwrap();
        assert_eq!(n.observation.age, Some(40));
        assert_eq!(n.observation.vitals.spo2, None);
        assert_eq!(n.observation.vitals.systolic_bp, None);
        assert_eq!(n.issues.len(), 1);
        assert_eq!(n.issues[0].field, Field::Spo2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            observation_from_json("{ age: "),
            Err(IngestError::Json(_))
        ));
    }

    #[test]
    fn row_error_display() {
        let e = BatchRowError {
            row: 3,
            reason: "expected 5 fields, found 4".into(),
        };
        assert_eq!(e.to_string(), "row 3: expected 5 fields, found 4");
    }
}
