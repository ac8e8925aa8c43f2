//! Persistence merge: writes the staged batch only when it differs from storage.

use xt_db::{DbError, EventStore};

use crate::staging::Staging;

/// What a merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing was staged; storage was not touched.
    NothingStaged,
    /// The staged batch matched storage and was discarded.
    Unchanged { count: usize },
    /// Storage was replaced with the staged batch.
    Written { count: usize },
}

/// Drains the staging area into an [`EventStore`].
#[derive(Debug)]
pub struct Merger<S> {
    staging: Staging,
    store: S,
}

impl<S: EventStore> Merger<S> {
    pub const fn new(staging: Staging, store: S) -> Self {
        Self { staging, store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Compares the staged batch with storage and rewrites storage if they differ.
    ///
    /// Stored rows that cannot be decoded count as different, so storage is
    /// rewritten rather than left stuck.
    ///
    /// The staging lock is held for the whole merge. The staged batch is
    /// cleared after a successful write or an unchanged comparison; on error
    /// it stays staged so the next archive period retries it.
    pub fn merge(&mut self) -> Result<MergeOutcome, DbError> {
        let mut staged = self.staging.lock();
        if staged.is_empty() {
            return Ok(MergeOutcome::NothingStaged);
        }

        match self.store.load_events(None) {
            Ok(stored) if *staged == stored => {
                let count = staged.len();
                staged.clear();
                return Ok(MergeOutcome::Unchanged { count });
            }
            Ok(_) => {}
            // Rows this version cannot read never equal the staged batch.
            Err(e) if e.is_undecodable() => {
                tracing::warn!(error = %e, "stored tidal events are unreadable, replacing them");
            }
            Err(e) => return Err(e),
        }

        let count = self.store.replace_events(&staged)?;
        staged.clear();
        Ok(MergeOutcome::Written { count })
    }

    /// Runs a merge at the end of an archive period, logging the result.
    ///
    /// Errors are logged and swallowed; `None` means the merge failed.
    pub fn end_archive_period(&mut self) -> Option<MergeOutcome> {
        tracing::debug!("end of archive period: saving tidal events");
        match self.merge() {
            Ok(outcome) => {
                match outcome {
                    MergeOutcome::NothingStaged => {}
                    MergeOutcome::Unchanged { count } => {
                        tracing::info!(count, "ignoring generated tidal events as they have not changed");
                    }
                    MergeOutcome::Written { count } => tracing::info!(count, "saved tidal events"),
                }
                Some(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save tidal events, will retry next archive period");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use xt_core::{Event, EventKind, UnitSystem};
    use xt_db::Database;

    fn event(timestamp: i64, level: f64) -> Event {
        Event {
            timestamp,
            unit_system: UnitSystem::Imperial,
            location: "Palo Alto Yacht Harbor, San Francisco Bay, California".to_string(),
            kind: EventKind::HighTide,
            level,
        }
    }

    /// Store that counts calls and can be made to fail writes.
    #[derive(Default)]
    struct CountingStore {
        events: Vec<Event>,
        loads: Cell<usize>,
        writes: usize,
        fail_writes: bool,
    }

    impl EventStore for CountingStore {
        fn load_events(&self, _limit: Option<usize>) -> Result<Vec<Event>, DbError> {
            self.loads.set(self.loads.get() + 1);
            Ok(self.events.clone())
        }

        fn replace_events(&mut self, events: &[Event]) -> Result<usize, DbError> {
            if self.fail_writes {
                return Err(DbError::Sqlite(rusqlite_busy()));
            }
            self.writes += 1;
            self.events = events.to_vec();
            Ok(events.len())
        }
    }

    fn rusqlite_busy() -> xt_db::rusqlite::Error {
        xt_db::rusqlite::Error::SqliteFailure(
            xt_db::rusqlite::ffi::Error::new(xt_db::rusqlite::ffi::SQLITE_BUSY),
            None,
        )
    }

    #[test]
    fn empty_staging_touches_nothing() {
        let mut merger = Merger::new(Staging::new(), CountingStore::default());
        assert_eq!(merger.merge().unwrap(), MergeOutcome::NothingStaged);
        assert_eq!(merger.store().loads.get(), 0);
        assert_eq!(merger.store().writes, 0);
    }

    #[test]
    fn same_batch_twice_writes_once() {
        let staging = Staging::new();
        let mut merger = Merger::new(staging.clone(), CountingStore::default());
        let batch = vec![event(1, 8.5), event(2, -0.64)];

        staging.replace(batch.clone());
        assert_eq!(merger.merge().unwrap(), MergeOutcome::Written { count: 2 });
        assert!(staging.is_empty());

        staging.replace(batch);
        assert_eq!(merger.merge().unwrap(), MergeOutcome::Unchanged { count: 2 });
        assert!(staging.is_empty());
        assert_eq!(merger.store().writes, 1);
    }

    #[test]
    fn changed_level_rewrites() {
        let staging = Staging::new();
        let mut merger = Merger::new(staging.clone(), CountingStore::default());

        staging.replace(vec![event(1, 8.5)]);
        merger.merge().unwrap();
        staging.replace(vec![event(1, 8.6)]);
        assert_eq!(merger.merge().unwrap(), MergeOutcome::Written { count: 1 });
        assert_eq!(merger.store().events, vec![event(1, 8.6)]);
    }

    #[test]
    fn failed_write_keeps_batch_staged() {
        let staging = Staging::new();
        let store = CountingStore {
            fail_writes: true,
            ..CountingStore::default()
        };
        let mut merger = Merger::new(staging.clone(), store);
        staging.replace(vec![event(1, 8.5)]);

        assert!(merger.merge().is_err());
        assert_eq!(merger.end_archive_period(), None);
        assert_eq!(staging.len(), 1);
    }

    #[test]
    fn unreadable_stored_rows_are_replaced() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("xtide.sdb");
        drop(Database::open(&path).unwrap());
        {
            let conn = xt_db::rusqlite::Connection::open(&path).unwrap();
            conn.execute(
                "INSERT INTO archive VALUES (5, 1, 'Old', 3, 1.0)",
                [],
            )
            .unwrap();
        }

        let staging = Staging::new();
        let mut merger = Merger::new(staging.clone(), Database::open(&path).unwrap());
        staging.replace(vec![event(1, 8.5)]);

        assert_eq!(merger.merge().unwrap(), MergeOutcome::Written { count: 1 });
        assert!(staging.is_empty());
        assert_eq!(merger.store().list_events(None).unwrap(), vec![event(1, 8.5)]);
    }

    #[test]
    fn merges_into_sqlite() {
        let staging = Staging::new();
        let mut merger = Merger::new(staging.clone(), Database::open_in_memory().unwrap());
        let batch = vec![event(1, 8.5), event(2, -0.64)];

        staging.replace(batch.clone());
        assert_eq!(
            merger.end_archive_period(),
            Some(MergeOutcome::Written { count: 2 })
        );
        assert_eq!(merger.store().list_events(None).unwrap(), batch);

        staging.replace(batch);
        assert_eq!(
            merger.end_archive_period(),
            Some(MergeOutcome::Unchanged { count: 2 })
        );
    }
}
