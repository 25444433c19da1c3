use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, RwLock};

use chrono::{NaiveDateTime, Timelike};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{Gender, HistoryRecord, NewHistoryRecord, OverallStatus};

/// Append-only record of computed profiles.
///
/// Writes are serialized by each implementation so `fetch_all` always
/// returns records in insertion order.
pub trait HistoryStore: Send + Sync {
    /// Append a record; the store assigns id and timestamp.
    fn append(&self, record: &NewHistoryRecord) -> Result<HistoryRecord, DatabaseError>;

    /// All records, oldest first.
    fn fetch_all(&self) -> Result<Vec<HistoryRecord>, DatabaseError>;

    /// Remove every record. Returns how many were deleted.
    fn clear(&self) -> Result<usize, DatabaseError>;
}

// ═══════════════════════════════════════════════════════════
// SQLite-backed store
// ═══════════════════════════════════════════════════════════

/// SQLite history store. The connection sits behind a `Mutex`, giving the
/// single-writer discipline the trend view depends on.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = open_database(path)?;
        tracing::debug!(path = %path.display(), "History store opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn append(&self, record: &NewHistoryRecord) -> Result<HistoryRecord, DatabaseError> {
        let stored = record
            .clone()
            .into_record(Uuid::new_v4(), now_truncated());

        let conn = self.conn.lock().map_err(|_| DatabaseError::LockFailed)?;
        conn.execute(
            "INSERT INTO patient_history (id, recorded_at, age, gender, systolic_bp, aki_risk, bleeding_risk, sepsis_score, sirs_score, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                stored.id.to_string(),
                stored.recorded_at,
                stored.age,
                stored.gender.map(|g| g.as_str()),
                stored.systolic_bp,
                stored.aki_risk_pct,
                stored.bleeding_risk_pct,
                stored.sepsis_score,
                stored.sirs_score,
                stored.status.as_str(),
            ],
        )?;
        Ok(stored)
    }

    fn fetch_all(&self) -> Result<Vec<HistoryRecord>, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockFailed)?;
        let mut stmt = conn.prepare(
            "SELECT id, recorded_at, age, gender, systolic_bp, aki_risk, bleeding_risk, sepsis_score, sirs_score, status
             FROM patient_history
             ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, NaiveDateTime>(1)?,
                row.get::<_, Option<u32>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, u8>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, u8>(7)?,
                row.get::<_, u8>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, recorded_at, age, gender, systolic_bp, aki, bleeding, sepsis, sirs, status) =
                row?;
            records.push(HistoryRecord {
                id: Uuid::parse_str(&id)
                    .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
                recorded_at,
                age,
                gender: gender.as_deref().map(Gender::from_str).transpose()?,
                systolic_bp,
                aki_risk_pct: aki,
                bleeding_risk_pct: bleeding,
                sepsis_score: sepsis,
                sirs_score: sirs,
                status: OverallStatus::from_str(&status)?,
            });
        }
        Ok(records)
    }

    fn clear(&self) -> Result<usize, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockFailed)?;
        let deleted = conn.execute("DELETE FROM patient_history", [])?;
        tracing::info!(deleted, "History cleared");
        Ok(deleted)
    }
}

// ═══════════════════════════════════════════════════════════
// In-memory store
// ═══════════════════════════════════════════════════════════

/// In-memory store backed by RwLock, for sessions that do not persist.
#[derive(Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, record: &NewHistoryRecord) -> Result<HistoryRecord, DatabaseError> {
        let stored = record
            .clone()
            .into_record(Uuid::new_v4(), now_truncated());
        let mut records = self.records.write().map_err(|_| DatabaseError::LockFailed)?;
        records.push(stored.clone());
        Ok(stored)
    }

    fn fetch_all(&self) -> Result<Vec<HistoryRecord>, DatabaseError> {
        let records = self.records.read().map_err(|_| DatabaseError::LockFailed)?;
        Ok(records.clone())
    }

    fn clear(&self) -> Result<usize, DatabaseError> {
        let mut records = self.records.write().map_err(|_| DatabaseError::LockFailed)?;
        let deleted = records.len();
        records.clear();
        Ok(deleted)
    }
}

/// Current local time at second precision, matching what SQLite round-trips.
fn now_truncated() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
