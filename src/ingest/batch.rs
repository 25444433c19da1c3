//! Delimited batch scoring.
//!
//! Input is any delimited table with a header row. Output repeats every
//! input column verbatim and appends `NEWS_Score`, `Clinical_Status` and
//! `Bleed_Risk_%`. Rows are scored in parallel; output order always
//! matches input order.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use super::columns::ColumnMap;
use super::normalize::{ObservationBuilder, UnitPolicy};
use super::{BatchRowError, IngestError, ValidationIssue};
use crate::models::{Observation, RiskProfile};
use crate::scoring::{news2_score, ScoringEngine};

pub const NEWS_SCORE_COLUMN: &str = "NEWS_Score";
pub const CLINICAL_STATUS_COLUMN: &str = "Clinical_Status";
pub const BLEED_RISK_COLUMN: &str = "Bleed_Risk_%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub delimiter: u8,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl BatchOptions {
    /// Parse a delimiter argument: a single ASCII character or `tab`.
    pub fn with_delimiter(raw: &str) -> Result<Self, IngestError> {
        let delimiter = match raw {
            "tab" | "\\t" | "\t" => b'\t',
            s if s.len() == 1 && s.is_ascii() => s.as_bytes()[0],
            other => return Err(IngestError::InvalidDelimiter(other.to_string())),
        };
        Ok(Self { delimiter })
    }
}

/// Raw table as read, before any scoring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawRow {
    Cells(Vec<String>),
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Scored {
        observation: Observation,
        profile: RiskProfile,
        issues: Vec<ValidationIssue>,
    },
    Failed(BatchRowError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    /// 1-based, header excluded.
    pub row: usize,
    pub cells: Vec<String>,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub scored: usize,
    pub failed: usize,
    pub validation_issues: usize,
    pub critical: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub headers: Vec<String>,
    pub rows: Vec<BatchRow>,
}

pub fn read_batch<R: Read>(reader: R, options: BatchOptions) -> Result<RawBatch, IngestError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        match record {
            Ok(r) => rows.push(RawRow::Cells(r.iter().map(str::to_string).collect())),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => rows.push(RawRow::Unreadable(e.to_string())),
        }
    }
    Ok(RawBatch { headers, rows })
}

/// Normalize one row of cells against the column map.
pub fn normalize_row(map: &ColumnMap, cells: &[String]) -> (Observation, Vec<ValidationIssue>) {
    let mut builder = ObservationBuilder::new(UnitPolicy::Heuristic);
    for (i, cell) in cells.iter().enumerate() {
        if let Some(binding) = map.binding(i) {
            builder.set_text(binding.field, binding.unit, cell);
        }
    }
    let n = builder.finish();
    (n.observation, n.issues)
}

pub fn score_batch(raw: RawBatch, engine: &ScoringEngine) -> BatchReport {
    let map = ColumnMap::from_headers(raw.headers.iter().map(String::as_str));
    let width = raw.headers.len();

    let rows: Vec<BatchRow> = raw
        .rows
        .into_par_iter()
        .enumerate()
        .map(|(i, raw_row)| {
            let row = i + 1;
            match raw_row {
                RawRow::Unreadable(reason) => BatchRow {
                    row,
                    cells: Vec::new(),
                    outcome: RowOutcome::Failed(BatchRowError { row, reason }),
                },
                RawRow::Cells(cells) if cells.len() != width => {
                    let reason = format!("expected {width} fields, found {}", cells.len());
                    BatchRow {
                        row,
                        cells,
                        outcome: RowOutcome::Failed(BatchRowError { row, reason }),
                    }
                }
                RawRow::Cells(cells) => {
                    let (observation, issues) = normalize_row(&map, &cells);
                    let profile = engine.score(&observation);
                    BatchRow {
                        row,
                        cells,
                        outcome: RowOutcome::Scored {
                            observation,
                            profile,
                            issues,
                        },
                    }
                }
            }
        })
        .collect();

    BatchReport {
        headers: raw.headers,
        rows,
    }
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut s = BatchSummary {
            rows: self.rows.len(),
            ..BatchSummary::default()
        };
        for row in &self.rows {
            match &row.outcome {
                RowOutcome::Scored {
                    profile, issues, ..
                } => {
                    s.scored += 1;
                    s.validation_issues += issues.len();
                    if profile.is_critical() {
                        s.critical += 1;
                    }
                }
                RowOutcome::Failed(_) => s.failed += 1,
            }
        }
        s
    }

    pub fn row_errors(&self) -> Vec<&BatchRowError> {
        self.rows
            .iter()
            .filter_map(|r| match &r.outcome {
                RowOutcome::Failed(e) => Some(e),
                RowOutcome::Scored { .. } => None,
            })
            .collect()
    }

    /// Write the augmented table. Rows are padded or cut to the header width
    /// so the score columns stay aligned; failed rows get empty score cells.
    pub fn write_csv<W: Write>(&self, writer: W, options: BatchOptions) -> Result<(), IngestError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .flexible(true)
            .from_writer(writer);

        let mut header = self.headers.clone();
        header.extend(
            [NEWS_SCORE_COLUMN, CLINICAL_STATUS_COLUMN, BLEED_RISK_COLUMN].map(String::from),
        );
        wtr.write_record(&header)?;

        for row in &self.rows {
            let mut record = row.cells.clone();
            record.resize(self.headers.len(), String::new());
            record.extend(score_cells(&row.outcome));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// `NEWS_Score`, `Clinical_Status`, `Bleed_Risk_%` for one row.
///
/// NEWS-2 needs only vitals, so it is reported even when the profile was
/// skipped for missing age or systolic; the bleeding cell is left empty then.
fn score_cells(outcome: &RowOutcome) -> [String; 3] {
    match outcome {
        RowOutcome::Failed(_) => Default::default(),
        RowOutcome::Scored {
            observation,
            profile,
            ..
        } => {
            let news = news2_score(observation);
            let bleed = if profile.insufficient_data {
                String::new()
            } else {
                format!("{:.1}", profile.bleeding_risk_pct)
            };
            [news.total.to_string(), news.band.label().to_string(), bleed]
        }
    }
}

/// Read, score and write in one pass.
pub fn process<R: Read, W: Write>(
    input: R,
    output: W,
    engine: &ScoringEngine,
    options: BatchOptions,
) -> Result<BatchSummary, IngestError> {
    let start = Instant::now();
    let raw = read_batch(input, options)?;
    let report = score_batch(raw, engine);
    report.write_csv(output, options)?;

    let summary = report.summary();
    for err in report.row_errors() {
        tracing::warn!(row = err.row, reason = %err.reason, "Batch row skipped");
    }
    tracing::info!(
        rows = summary.rows,
        scored = summary.scored,
        failed = summary.failed,
        critical = summary.critical,
        issues = summary.validation_issues,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch scored"
    );
    Ok(summary)
}

pub fn process_file(
    input: &Path,
    output: &Path,
    engine: &ScoringEngine,
    options: BatchOptions,
) -> Result<BatchSummary, IngestError> {
    let reader = File::open(input)?;
    let writer = File::create(output)?;
    process(reader, writer, engine, options)
}
