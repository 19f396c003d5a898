use std::collections::BTreeSet;

use chrono::NaiveDate;
use habit_domain::habit::{format_timestamp, parse_timestamp};
use habit_domain::{Goal, Habit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no remote store configured; set HABIT_REMOTE_URL or pass --remote")]
    NotConfigured,
    #[error("remote store `{url}` is unavailable: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("remote store error: {0}")]
    Remote(#[from] rusqlite::Error),
    #[error("remote habit #{id} could not be decoded: {reason}")]
    Record { id: i64, reason: String },
}

/// A habit row as stored remotely, keyed by `(profile, id)`.
///
/// Timestamps stay as raw text so that a replica written by another client
/// with unreadable stamps still loads; they are parsed leniently on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteHabitRecord {
    pub id: i64,
    pub title: String,
    pub done: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub done_at: Option<String>,
    /// JSON encoded [`Goal`].
    pub goal: Option<String>,
    /// JSON array of `YYYY-MM-DD` dates.
    pub checkins: String,
}

impl RemoteHabitRecord {
    pub fn from_habit(habit: &Habit) -> Result<Self, SyncError> {
        let id = i64::try_from(habit.id).map_err(|_| SyncError::Record {
            id: i64::MAX,
            reason: format!("id {} does not fit the remote schema", habit.id),
        })?;
        let encode_err = |err: serde_json::Error| SyncError::Record {
            id,
            reason: err.to_string(),
        };
        Ok(Self {
            id,
            title: habit.title.clone(),
            done: habit.done,
            created_at: habit.created_at.map(format_timestamp),
            updated_at: habit.updated_at.map(format_timestamp),
            done_at: habit.done_at.map(format_timestamp),
            goal: habit
                .goal
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(encode_err)?,
            checkins: serde_json::to_string(&habit.checkins).map_err(encode_err)?,
        })
    }

    pub fn into_habit(self) -> Result<Habit, SyncError> {
        let id = self.id;
        let invalid = |reason: String| SyncError::Record { id, reason };
        let habit_id = u64::try_from(id)
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| invalid("ids must be positive".to_string()))?;
        let checkins: BTreeSet<NaiveDate> = if self.checkins.trim().is_empty() {
            BTreeSet::new()
        } else {
            serde_json::from_str(&self.checkins).map_err(|err| invalid(err.to_string()))?
        };
        let goal: Option<Goal> = self
            .goal
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(serde_json::from_str)
            .transpose()
            .map_err(|err| invalid(err.to_string()))?;

        Ok(Habit {
            id: habit_id,
            title: self.title,
            created_at: self.created_at.as_deref().and_then(parse_timestamp),
            updated_at: self.updated_at.as_deref().and_then(parse_timestamp),
            done: self.done,
            done_at: self.done_at.as_deref().and_then(parse_timestamp),
            goal,
            checkins,
        })
    }
}

/// The two operations sync needs from a shared remote store.
pub trait RemoteStore {
    fn fetch_habits(&self, profile: &str) -> Result<Vec<RemoteHabitRecord>, SyncError>;

    fn upsert_habit(&self, profile: &str, record: &RemoteHabitRecord) -> Result<(), SyncError>;

    /// Upserts a batch; implementations should make it all-or-nothing.
    fn upsert_habits(&self, profile: &str, records: &[RemoteHabitRecord]) -> Result<(), SyncError> {
        for record in records {
            self.upsert_habit(profile, record)?;
        }
        Ok(())
    }
}
