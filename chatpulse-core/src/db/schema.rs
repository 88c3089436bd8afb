//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: raw record tables
    r#"
    -- Raw records exactly as exported by the chat and content systems.
    -- `ts` is the parsed timestamp (RFC 3339, UTC) used for window
    -- filtering; NULL when the importer could not read one.

    CREATE TABLE IF NOT EXISTS interaction_records (
        row_id           INTEGER PRIMARY KEY AUTOINCREMENT,
        record_id        TEXT UNIQUE,
        ts               TEXT,
        raw_data         JSON NOT NULL,
        imported_at      TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS content_records (
        row_id           INTEGER PRIMARY KEY AUTOINCREMENT,
        record_id        TEXT UNIQUE,
        ts               TEXT,
        raw_data         JSON NOT NULL,
        imported_at      TEXT NOT NULL
    );
    "#,
    // Version 2: window lookups
    r#"
    CREATE INDEX IF NOT EXISTS idx_interaction_records_ts ON interaction_records(ts);
    CREATE INDEX IF NOT EXISTS idx_content_records_ts ON content_records(ts);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |r| r.get(0))
        .unwrap_or(0);

    tracing::debug!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in ["interaction_records", "content_records"] {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }
}
