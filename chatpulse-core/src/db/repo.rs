//! Record store
//!
//! Raw records are kept exactly as imported. The stored `ts` column exists
//! only so a window can be selected with an index; records whose timestamp
//! could not be read at import time are returned with every window and left
//! for the normalizer to reject.

use crate::error::{Error, Result};
use crate::ingest::{raw_id, raw_timestamp, RecordSource};
use crate::types::{DateRange, RawRecord};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Which raw table a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Interaction,
    Content,
}

impl RecordKind {
    fn table(&self) -> &'static str {
        match self {
            RecordKind::Interaction => "interaction_records",
            RecordKind::Content => "content_records",
        }
    }
}

/// Result of an import batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Rows written (new or replaced)
    pub written: usize,
    /// Rows stored without a parseable timestamp
    pub undated: usize,
}

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        super::schema::run_migrations(&self.connection())
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // Writes are transactional; a poisoned guard is still consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============================================
    // Inserts
    // ============================================

    /// Store raw chat interactions, replacing rows with the same record id.
    pub fn insert_raw_interactions(&self, records: &[RawRecord]) -> Result<ImportStats> {
        self.insert_raw(RecordKind::Interaction, records)
    }

    /// Store raw content records, replacing rows with the same record id.
    pub fn insert_raw_content(&self, records: &[RawRecord]) -> Result<ImportStats> {
        self.insert_raw(RecordKind::Content, records)
    }

    fn insert_raw(&self, kind: RecordKind, records: &[RawRecord]) -> Result<ImportStats> {
        let mut conn = self.connection();
        let tx = conn.transaction()?;
        let imported_at = format_ts(Utc::now());
        let mut stats = ImportStats::default();

        {
            let sql = format!(
                r#"
                INSERT INTO {} (record_id, ts, raw_data, imported_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(record_id) DO UPDATE SET
                    ts = excluded.ts,
                    raw_data = excluded.raw_data,
                    imported_at = excluded.imported_at
                "#,
                kind.table()
            );
            let mut stmt = tx.prepare(&sql)?;

            for record in records {
                let ts = raw_timestamp(record).map(format_ts);
                if ts.is_none() {
                    stats.undated += 1;
                }
                let raw = serde_json::to_string(record)?;
                stats.written += stmt.execute(params![raw_id(record), ts, raw, imported_at])?;
            }
        }

        tx.commit()?;
        tracing::debug!(
            table = kind.table(),
            written = stats.written,
            undated = stats.undated,
            "Stored raw records"
        );
        Ok(stats)
    }

    // ============================================
    // Queries
    // ============================================

    /// Raw interactions dated inside `range`, plus undated rows.
    pub fn fetch_interactions_between(&self, range: &DateRange) -> Result<Vec<RawRecord>> {
        self.fetch_between(RecordKind::Interaction, range)
    }

    /// Raw content records dated inside `range`, plus undated rows.
    pub fn fetch_content_between(&self, range: &DateRange) -> Result<Vec<RawRecord>> {
        self.fetch_between(RecordKind::Content, range)
    }

    fn fetch_between(&self, kind: RecordKind, range: &DateRange) -> Result<Vec<RawRecord>> {
        let conn = self.connection();
        let sql = format!(
            r#"
            SELECT raw_data FROM {}
            WHERE ts IS NULL OR (ts >= ?1 AND ts < ?2)
            ORDER BY ts, row_id
            "#,
            kind.table()
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![format_ts(range.start_instant()), format_ts(range.end_instant())],
            |row| row.get::<_, String>(0),
        )?;

        let mut records = Vec::new();
        for row in rows {
            let raw = row?;
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => records.push(RawRecord::from_value(value)),
                Err(e) => tracing::warn!(table = kind.table(), error = %e, "Skipping corrupt raw_data"),
            }
        }
        Ok(records)
    }

    /// Count stored interactions
    pub fn count_interactions(&self) -> Result<i64> {
        self.count(RecordKind::Interaction)
    }

    /// Count stored content records
    pub fn count_content(&self) -> Result<i64> {
        self.count(RecordKind::Content)
    }

    fn count(&self, kind: RecordKind) -> Result<i64> {
        let conn = self.connection();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    }
}

/// Fixed-width UTC form so stored timestamps compare lexically.
fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// [`RecordSource`] over a shared [`Database`].
///
/// Queries run on the blocking pool so a slow disk never stalls the runtime.
#[derive(Clone)]
pub struct SqliteSource {
    db: Arc<Database>,
}

impl SqliteSource {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn run<F>(&self, query: F) -> Result<Vec<RawRecord>>
    where
        F: FnOnce(&Database) -> Result<Vec<RawRecord>> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || query(&db))
            .await
            .map_err(|e| Error::Fetch(format!("database task failed: {}", e)))?
    }
}

#[async_trait]
impl RecordSource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch_interactions(&self, range: DateRange) -> Result<Vec<RawRecord>> {
        self.run(move |db| db.fetch_interactions_between(&range)).await
    }

    async fn fetch_content(&self, range: DateRange) -> Result<Vec<RawRecord>> {
        self.run(move |db| db.fetch_content_between(&range)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn raw(value: serde_json::Value) -> RawRecord {
        RawRecord::from_value(value)
    }

    fn range(start: u32, end: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, start).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, end).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_fetch_window() {
        let db = test_db();
        let stats = db
            .insert_raw_interactions(&[
                raw(json!({"id": "a", "timestamp": "2024-03-01T08:00:00Z", "text_in": "early"})),
                raw(json!({"id": "b", "timestamp": "2024-03-03T08:00:00+09:00", "text_in": "mid"})),
                raw(json!({"id": "c", "timestamp": "2024-03-09T00:00:00Z", "text_in": "late"})),
                raw(json!({"id": "d", "text_in": "undated"})),
            ])
            .unwrap();
        assert_eq!(stats.written, 4);
        assert_eq!(stats.undated, 1);

        let fetched = db.fetch_interactions_between(&range(2, 8)).unwrap();
        let ids: Vec<_> = fetched.iter().map(|r| r.0["id"].clone()).collect();
        // Undated rows sort first (NULL ts)
        assert_eq!(ids, vec![json!("d"), json!("b")]);
    }

    #[test]
    fn test_upsert_by_record_id() {
        let db = test_db();
        db.insert_raw_content(&[raw(json!({"id": "v1", "channel": "one"}))])
            .unwrap();
        db.insert_raw_content(&[raw(json!({"id": "v1", "channel": "two"}))])
            .unwrap();
        // Records without an id never collide
        db.insert_raw_content(&[raw(json!({"channel": "x"})), raw(json!({"channel": "y"}))])
            .unwrap();

        assert_eq!(db.count_content().unwrap(), 3);
        assert_eq!(db.count_interactions().unwrap(), 0);

        let all = db.fetch_content_between(&range(1, 31)).unwrap();
        assert!(all.iter().any(|r| r.0["channel"] == json!("two")));
        assert!(!all.iter().any(|r| r.0["channel"] == json!("one")));
    }

    #[test]
    fn test_raw_data_round_trips_untouched() {
        let db = test_db();
        let original = raw(json!({
            "_id": {"$oid": "abc"},
            "createdAt": {"$date": 1709546400000i64},
            "text_in": "",
            "weird": [1, null, {"x": true}],
        }));
        db.insert_raw_interactions(std::slice::from_ref(&original))
            .unwrap();

        let fetched = db.fetch_interactions_between(&range(4, 4)).unwrap();
        assert_eq!(fetched, vec![original]);
    }

    #[tokio::test]
    async fn test_sqlite_source() {
        let db = Arc::new(test_db());
        db.insert_raw_interactions(&[raw(
            json!({"id": "a", "timestamp": "2024-03-05T10:00:00Z", "text_in": "hi"}),
        )])
        .unwrap();

        let source = SqliteSource::new(Arc::clone(&db));
        assert_eq!(source.name(), "sqlite");
        assert_eq!(source.fetch_interactions(range(5, 5)).await.unwrap().len(), 1);
        assert!(source.fetch_interactions(range(6, 6)).await.unwrap().is_empty());
        assert!(source.fetch_content(range(5, 5)).await.unwrap().is_empty());
    }
}
