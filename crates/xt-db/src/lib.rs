//! Storage layer for xtide.
//!
//! Persists tide events in a single `SQLite` table using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! The service gives the persistence merge and each read their own connection;
//! `SQLite`'s file locking serializes them, and lock contention surfaces as a
//! transient [`DbError`] (see [`DbError::is_transient`]).
//!
//! # Schema
//!
//! One table, `archive`, keyed by event time:
//!
//! | column      | type    | contents                                   |
//! |-------------|---------|--------------------------------------------|
//! | `dateTime`  | INTEGER | Unix timestamp of the tide (primary key)   |
//! | `usUnits`   | STRING  | 1 (US) or 16 (metric)                      |
//! | `location`  | STRING  | location reported by the tide program      |
//! | `eventType` | INTEGER | 1 (high tide) or 2 (low tide)              |
//! | `level`     | FLOAT   | tide level in feet or meters               |
//!
//! There are no migrations. A file with any other column layout is rejected
//! with [`DbError::SchemaMismatch`] and must be deleted by the operator.

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use thiserror::Error;

use xt_core::{Event, EventKind, UnitSystem};

pub use rusqlite;

/// Name of the events table.
pub const TABLE_NAME: &str = "archive";

/// Column layout of [`TABLE_NAME`], in order.
pub const EXPECTED_COLUMNS: [&str; 5] = ["dateTime", "usUnits", "location", "eventType", "level"];

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The table exists with an old or foreign layout.
    #[error(
        "schema mismatch in table archive: expected columns {expected:?}, found {found:?}; delete the database file and restart"
    )]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// A stored `usUnits` value is not a known unit system.
    #[error("invalid unit system {code} for event at {timestamp}")]
    InvalidUnitSystem { timestamp: i64, code: i64 },
    /// A stored `eventType` value is not a high or low tide.
    #[error("invalid event type {code} for event at {timestamp}")]
    InvalidEventKind { timestamp: i64, code: i64 },
}

impl DbError {
    /// Whether the error is lock contention that may clear on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }

    /// Whether a stored row holds a code this version cannot decode.
    pub const fn is_undecodable(&self) -> bool {
        matches!(
            self,
            Self::InvalidUnitSystem { .. } | Self::InvalidEventKind { .. }
        )
    }
}

/// Read and write access to stored tide events.
///
/// Implemented by [`Database`]; the persistence merge and read paths are
/// written against this trait so they can be exercised with other stores.
pub trait EventStore {
    /// Returns stored events ordered by timestamp, at most `limit` of them.
    fn load_events(&self, limit: Option<usize>) -> Result<Vec<Event>, DbError>;

    /// Atomically replaces every stored event with `events`.
    ///
    /// Returns the number of rows inserted.
    fn replace_events(&mut self, events: &[Event]) -> Result<usize, DbError>;
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The schema is created on first open and verified on every open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an existing database without creating or modifying it.
    pub fn open_read_only(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let db = Self { conn };
        db.verify_schema()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- dateTime: Unix timestamp of the tide
            -- usUnits: 1 (US) or 16 (metric)
            -- eventType: 1 (high tide) or 2 (low tide)
            -- level: feet or meters, depending on usUnits
            CREATE TABLE IF NOT EXISTS archive (
                dateTime INTEGER NOT NULL PRIMARY KEY,
                usUnits STRING NOT NULL,
                location STRING NOT NULL,
                eventType INTEGER NOT NULL,
                level FLOAT NOT NULL
            );
            ",
        )?;
        self.verify_schema()
    }

    /// Checks the on-disk column layout against [`EXPECTED_COLUMNS`].
    pub fn verify_schema(&self) -> Result<(), DbError> {
        let found = self.columns()?;
        if found.iter().map(String::as_str).eq(EXPECTED_COLUMNS) {
            return Ok(());
        }
        Err(DbError::SchemaMismatch {
            expected: EXPECTED_COLUMNS.iter().map(ToString::to_string).collect(),
            found,
        })
    }

    fn columns(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({TABLE_NAME})"))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }
        Ok(columns)
    }

    /// Lists events ordered by timestamp, at most `limit` of them.
    pub fn list_events(&self, limit: Option<usize>) -> Result<Vec<Event>, DbError> {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        let mut stmt = self.conn.prepare(
            "
            SELECT dateTime, usUnits, location, eventType, level
            FROM archive
            ORDER BY dateTime ASC
            LIMIT ?
            ",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;
        let mut events = Vec::new();
        for row in rows {
            let (timestamp, units, location, kind, level) = row?;
            events.push(Event {
                timestamp,
                unit_system: UnitSystem::from_code(units)
                    .ok_or(DbError::InvalidUnitSystem { timestamp, code: units })?,
                location,
                kind: EventKind::from_code(kind)
                    .ok_or(DbError::InvalidEventKind { timestamp, code: kind })?,
                level,
            });
        }
        Ok(events)
    }

    /// Deletes every stored event and inserts `events` in one transaction.
    ///
    /// Events whose timestamp is already present in the batch are ignored,
    /// so the returned count can be lower than `events.len()`.
    pub fn replace_all_events(&mut self, events: &[Event]) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM archive", [])?;
        tracing::debug!(deleted, "cleared stored events");
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT OR IGNORE INTO archive (dateTime, usUnits, location, eventType, level)
                VALUES (?, ?, ?, ?, ?)
                ",
            )?;
            for event in events {
                let written = stmt.execute(params![
                    event.timestamp,
                    event.unit_system.code(),
                    event.location,
                    event.kind.code(),
                    event.level,
                ])?;
                if written == 0 {
                    tracing::warn!(timestamp = event.timestamp, "duplicate event time, skipped");
                }
                inserted += written;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

impl EventStore for Database {
    fn load_events(&self, limit: Option<usize>) -> Result<Vec<Event>, DbError> {
        self.list_events(limit)
    }

    fn replace_events(&mut self, events: &[Event]) -> Result<usize, DbError> {
        self.replace_all_events(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    fn event(timestamp: i64, kind: EventKind, level: f64) -> Event {
        Event {
            timestamp,
            unit_system: UnitSystem::Imperial,
            location: "Palo Alto Yacht Harbor, San Francisco Bay, California".to_string(),
            kind,
            level,
        }
    }

    fn batch() -> Vec<Event> {
        vec![
            event(1_720_339_920, EventKind::HighTide, 8.5),
            event(1_720_369_860, EventKind::LowTide, -0.64),
            event(1_720_392_000, EventKind::HighTide, 5.1),
        ]
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(db.columns().unwrap(), EXPECTED_COLUMNS);
    }

    #[test]
    fn stored_events_read_back_in_order() {
        let mut db = Database::open_in_memory().unwrap();
        let events = batch();

        let inserted = db.replace_all_events(&events).unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(db.list_events(None).unwrap(), events);
    }

    #[test]
    fn metric_events_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let mut metric = event(1_720_339_920, EventKind::LowTide, 2.3);
        metric.unit_system = UnitSystem::Metric;

        db.replace_all_events(std::slice::from_ref(&metric)).unwrap();
        assert_eq!(db.list_events(None).unwrap(), vec![metric]);
    }

    #[test]
    fn replace_discards_previous_events() {
        let mut db = Database::open_in_memory().unwrap();
        db.replace_all_events(&batch()).unwrap();

        let newer = vec![event(1_720_500_000, EventKind::LowTide, 1.0)];
        db.replace_all_events(&newer).unwrap();

        assert_eq!(db.list_events(None).unwrap(), newer);
    }

    #[test]
    fn replace_ignores_duplicate_times() {
        let mut db = Database::open_in_memory().unwrap();
        let first = event(1_720_339_920, EventKind::HighTide, 8.5);
        let inserted = db.replace_all_events(&[first.clone(), first]).unwrap();
        assert_eq!(inserted, 1);
    }

    #[test]
    fn list_respects_limit() {
        let mut db = Database::open_in_memory().unwrap();
        let events = batch();
        db.replace_all_events(&events).unwrap();

        assert_eq!(db.list_events(Some(2)).unwrap(), events[..2]);
        assert!(db.list_events(Some(0)).unwrap().is_empty());
    }

    #[test]
    fn rejects_foreign_schema() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("xtide.sdb");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE archive (dateTime INTEGER PRIMARY KEY, usUnits INTEGER, interval INTEGER)",
            )
            .unwrap();
        }

        let Err(err) = Database::open(&path) else {
            panic!("expected schema mismatch");
        };
        assert!(matches!(err, DbError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("delete the database file"));
    }

    #[test]
    fn unknown_codes_are_errors() {
        let db = Database::open_in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO archive VALUES (1, 1, 'Somewhere', 3, 1.0)",
                [],
            )
            .unwrap();
        let err = db.list_events(None).unwrap_err();
        assert!(matches!(err, DbError::InvalidEventKind { code: 3, .. }));
        assert!(err.is_undecodable());
        assert!(!err.is_transient());
    }

    #[test]
    fn read_only_open_sees_existing_events() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("xtide.sdb");
        let mut db = Database::open(&path).unwrap();
        db.replace_all_events(&batch()).unwrap();

        let reader = Database::open_read_only(&path).unwrap();
        assert_eq!(reader.list_events(None).unwrap(), batch());
    }

    #[test]
    fn lock_contention_is_transient() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("xtide.sdb");
        let writer = Database::open(&path).unwrap();
        let reader = Database::open(&path).unwrap();
        reader.conn.busy_timeout(Duration::ZERO).unwrap();

        writer.conn.execute_batch("BEGIN EXCLUSIVE").unwrap();
        let err = reader.list_events(None).unwrap_err();
        assert!(err.is_transient(), "expected busy error, got {err}");
        writer.conn.execute_batch("COMMIT").unwrap();

        assert!(reader.list_events(None).is_ok());
    }
}
