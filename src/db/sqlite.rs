use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};

use super::DatabaseError;

/// Versioned schema steps, applied in order. Append only.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, include_str!("../../resources/migrations/001_history.sql")),
    (2, include_str!("../../resources/migrations/002_history_status_index.sql")),
];

/// Writers wait this long on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (creating parent directories) and migrate a database file.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    prepare(Connection::open(path)?)
}

/// Migrated in-memory database, used by tests and non-persistent sessions.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(conn: Connection) -> Result<Connection, DatabaseError> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=DELETE; PRAGMA foreign_keys=ON;")?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the stored version, each in its own
/// transaction. Returns how many were applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, DatabaseError> {
    let current = schema_version(conn)?;
    let mut applied = 0;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        let fail = |e: rusqlite::Error| DatabaseError::MigrationFailed {
            version,
            reason: e.to_string(),
        };
        let tx = conn.unchecked_transaction().map_err(fail)?;
        tx.execute_batch(sql).map_err(fail)?;
        tx.commit().map_err(fail)?;
        tracing::info!(version, "Schema migration applied");
        applied += 1;
    }
    Ok(applied)
}

/// Highest applied migration, or 0 on a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(0);
    }
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

/// User tables, sorted by name.
pub fn table_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_has_history_schema() {
        let conn = open_memory_database().unwrap();
        assert_eq!(table_names(&conn).unwrap(), vec!["patient_history", "schema_version"]);
        assert_eq!(schema_version(&conn).unwrap(), 2);
    }

    #[test]
    fn empty_connection_is_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
        assert_eq!(run_migrations(&conn).unwrap(), MIGRATIONS.len());
    }

    #[test]
    fn rerun_applies_nothing() {
        let conn = open_memory_database().unwrap();
        assert_eq!(run_migrations(&conn).unwrap(), 0);
        assert_eq!(table_names(&conn).unwrap().len(), 2);
    }

    #[test]
    fn status_check_constraint_enforced() {
        let conn = open_memory_database().unwrap();
        let result = conn.execute(
            "INSERT INTO patient_history (id, recorded_at, aki_risk, bleeding_risk, sepsis_score, sirs_score, status)
             VALUES ('x', '2026-01-01 00:00:00', 0, 0, 0, 0, 'Unknown')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn open_on_disk_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");
        let conn = open_database(&path).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);
        assert!(path.exists());
    }
}
