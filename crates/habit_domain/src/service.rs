use std::path::Path;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::book::{Change, HabitBook};
use crate::error::HabitError;
use crate::habit::Habit;
use crate::store::HabitStore;

/// Loads the habit document once and persists every applied mutation.
pub struct HabitService {
    store: HabitStore,
    book: RwLock<HabitBook>,
}

impl HabitService {
    #[instrument]
    pub fn open(path: &Path) -> Result<Self> {
        let store = HabitStore::open(path);
        let habits = store
            .load()
            .with_context(|| format!("failed to load habits from {}", path.display()))?;
        Ok(Self {
            store,
            book: RwLock::new(HabitBook::new(habits)),
        })
    }

    pub fn path(&self) -> &Path {
        self.store.path()
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.book.read().habits().to_vec()
    }

    pub fn read<T>(&self, f: impl FnOnce(&HabitBook) -> T) -> T {
        f(&self.book.read())
    }

    /// Runs `f` against a copy of the book and commits it only when it applied a change.
    ///
    /// Errors from `f` or from saving leave both the document and the in-memory
    /// book untouched.
    pub fn update<T>(
        &self,
        f: impl FnOnce(&mut HabitBook) -> Result<(T, Change), HabitError>,
    ) -> Result<(T, Change)> {
        let mut book = self.book.write();
        let mut draft = book.clone();
        let (value, change) = f(&mut draft)?;
        if change.is_applied() {
            self.store
                .save(draft.habits())
                .with_context(|| format!("failed to save habits to {}", self.path().display()))?;
            *book = draft;
        } else {
            debug!("mutation left habits unchanged, skipping save");
        }
        Ok((value, change))
    }

    /// Replaces the whole collection, used after reconciling with a remote copy.
    pub fn replace_all(&self, habits: Vec<Habit>) -> Result<()> {
        let mut book = self.book.write();
        if book.habits() == habits.as_slice() {
            debug!("replacement identical to local habits");
            return Ok(());
        }
        self.store
            .save(&habits)
            .with_context(|| format!("failed to save habits to {}", self.path().display()))?;
        *book = HabitBook::new(habits);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn unchanged_mutations_do_not_touch_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("habits.json");
        let service = HabitService::open(&path).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 0).unwrap();

        let (id, change) = service
            .update(|book| Ok((book.add("Read", None, now)?.id, Change::Applied)))
            .unwrap();
        assert_eq!(id, 1);
        assert!(change.is_applied());
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
        let (_, change) = service
            .update(|book| Ok(((), book.mark_done(1, now)?)))
            .unwrap();
        assert!(change.is_applied());
        std::fs::remove_file(&path).unwrap();
        let (_, change) = service
            .update(|book| Ok(((), book.mark_done(1, now)?)))
            .unwrap();
        assert_eq!(change, Change::Unchanged);
        assert!(!path.exists());
    }

    #[test]
    fn failed_mutations_leave_state_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("habits.json");
        let service = HabitService::open(&path).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 0).unwrap();
        service
            .update(|book| Ok((book.add("Read", None, now)?.id, Change::Applied)))
            .unwrap();

        let err = service
            .update(|book| {
                book.rename(1, "Renamed", now)?;
                book.delete(42)?;
                Ok(((), Change::Applied))
            })
            .unwrap_err();
        assert!(err.to_string().contains("#42"));
        assert_eq!(service.habits()[0].title, "Read");

        let reopened = HabitService::open(&path).unwrap();
        assert_eq!(reopened.habits()[0].title, "Read");
    }
}
