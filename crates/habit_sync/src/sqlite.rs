use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::remote::{RemoteHabitRecord, RemoteStore, SyncError};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS habits (
    profile TEXT NOT NULL,
    id INTEGER NOT NULL,
    title TEXT NOT NULL,
    done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT,
    updated_at TEXT,
    done_at TEXT,
    goal TEXT,
    checkins TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (profile, id)
);";

const UPSERT: &str = "INSERT INTO habits
        (profile, id, title, done, created_at, updated_at, done_at, goal, checkins)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT(profile, id) DO UPDATE SET
        title = excluded.title,
        done = excluded.done,
        created_at = excluded.created_at,
        updated_at = excluded.updated_at,
        done_at = excluded.done_at,
        goal = excluded.goal,
        checkins = excluded.checkins";

/// Relational replica backed by a SQLite database file.
pub struct SqliteRemoteStore {
    db: Mutex<Connection>,
}

impl SqliteRemoteStore {
    /// Accepts a plain path, `sqlite://<path>` or `:memory:`.
    pub fn connect(url: &str) -> Result<Self, SyncError> {
        let target = url.strip_prefix("sqlite://").unwrap_or(url).trim();
        if target.is_empty() {
            return Err(SyncError::NotConfigured);
        }
        let unavailable = |err: rusqlite::Error| SyncError::Unavailable {
            url: url.to_string(),
            reason: err.to_string(),
        };
        let db = if target == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(target)
        }
        .map_err(unavailable)?;
        db.execute_batch(SCHEMA).map_err(unavailable)?;
        info!(url, "connected to remote habit store");
        Ok(Self {
            db: Mutex::new(db),
        })
    }
}

fn read_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<RemoteHabitRecord> {
    Ok(RemoteHabitRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        done: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        done_at: row.get(5)?,
        goal: row.get(6)?,
        checkins: row.get(7)?,
    })
}

fn write_record(
    db: &Connection,
    profile: &str,
    record: &RemoteHabitRecord,
) -> rusqlite::Result<usize> {
    db.prepare_cached(UPSERT)?.execute(params![
        profile,
        record.id,
        record.title,
        record.done,
        record.created_at,
        record.updated_at,
        record.done_at,
        record.goal,
        record.checkins,
    ])
}

impl RemoteStore for SqliteRemoteStore {
    fn fetch_habits(&self, profile: &str) -> Result<Vec<RemoteHabitRecord>, SyncError> {
        let db = self.db.lock();
        let mut stmt = db.prepare_cached(
            "SELECT id, title, done, created_at, updated_at, done_at, goal, checkins
             FROM habits WHERE profile = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([profile], read_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        debug!(profile, count = records.len(), "fetched remote habits");
        Ok(records)
    }

    fn upsert_habit(&self, profile: &str, record: &RemoteHabitRecord) -> Result<(), SyncError> {
        let db = self.db.lock();
        write_record(&db, profile, record)?;
        debug!(profile, id = record.id, "upserted remote habit");
        Ok(())
    }

    fn upsert_habits(&self, profile: &str, records: &[RemoteHabitRecord]) -> Result<(), SyncError> {
        let mut db = self.db.lock();
        let tx = db.transaction()?;
        for record in records {
            write_record(&tx, profile, record)?;
        }
        tx.commit()?;
        debug!(profile, count = records.len(), "upserted remote habits");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, title: &str, updated_at: &str) -> RemoteHabitRecord {
        RemoteHabitRecord {
            id,
            title: title.to_string(),
            done: false,
            created_at: Some("2026-02-01T08:00:00Z".to_string()),
            updated_at: Some(updated_at.to_string()),
            done_at: None,
            goal: Some(r#"{"kind":"weekly","per_week":3}"#.to_string()),
            checkins: r#"["2026-02-01"]"#.to_string(),
        }
    }

    #[test]
    fn upsert_replaces_rows_per_profile() {
        let store = SqliteRemoteStore::connect(":memory:").unwrap();
        store
            .upsert_habits("home", &[record(1, "Read", "2026-02-02T08:00:00Z"), record(2, "Walk", "2026-02-02T08:00:00Z")])
            .unwrap();
        store
            .upsert_habit("home", &record(1, "Read more", "2026-02-03T08:00:00Z"))
            .unwrap();
        store
            .upsert_habit("work", &record(1, "Inbox zero", "2026-02-03T08:00:00Z"))
            .unwrap();

        let home = store.fetch_habits("home").unwrap();
        assert_eq!(home.len(), 2);
        assert_eq!(home[0].title, "Read more");
        assert_eq!(home[0].updated_at.as_deref(), Some("2026-02-03T08:00:00Z"));
        assert_eq!(home[1], record(2, "Walk", "2026-02-02T08:00:00Z"));

        assert_eq!(store.fetch_habits("work").unwrap().len(), 1);
        assert!(store.fetch_habits("nobody").unwrap().is_empty());
        assert_eq!(store.fetch_habits("work").unwrap()[0].title, "Inbox zero");
    }

    #[test]
    fn empty_url_is_not_configured() {
        assert!(matches!(
            SqliteRemoteStore::connect("sqlite://"),
            Err(SyncError::NotConfigured)
        ));
    }

    #[test]
    fn unreachable_database_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("deeper").join("remote.db");
        let err = SqliteRemoteStore::connect(target.to_str().unwrap());
        assert!(matches!(err, Err(SyncError::Unavailable { .. })));
    }
}
