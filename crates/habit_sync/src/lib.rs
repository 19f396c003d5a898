pub mod reconcile;
pub mod remote;
pub mod sqlite;

use habit_domain::Habit;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

pub use crate::reconcile::{reconcile, reconcile_with_stats, MergeStats};
pub use crate::remote::{RemoteHabitRecord, RemoteStore, SyncError};
pub use crate::sqlite::SqliteRemoteStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncDirection {
    Push,
    Pull,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub profile: String,
    pub direction: SyncDirection,
    /// Collection the local document should hold afterwards.
    pub merged: Vec<Habit>,
    pub stats: MergeStats,
    pub pushed: usize,
}

/// Opens the configured remote store, if any.
pub fn connect(url: Option<&str>) -> Result<SqliteRemoteStore, SyncError> {
    match url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => SqliteRemoteStore::connect(url),
        None => Err(SyncError::NotConfigured),
    }
}

/// Moves habit collections between the local document and one remote profile.
///
/// Nothing here writes the local document; callers persist `SyncReport::merged`
/// only after an operation succeeds.
pub struct SyncService<R> {
    remote: R,
    profile: String,
}

impl<R: RemoteStore> SyncService<R> {
    pub fn new(remote: R, profile: impl Into<String>) -> Self {
        Self {
            remote,
            profile: profile.into(),
        }
    }

    #[instrument(skip(self, local), fields(profile = %self.profile))]
    pub fn push(&self, local: &[Habit]) -> Result<SyncReport, SyncError> {
        let pushed = self.upload(local)?;
        Ok(SyncReport {
            profile: self.profile.clone(),
            direction: SyncDirection::Push,
            merged: local.to_vec(),
            stats: MergeStats {
                local_only: local.len(),
                ..MergeStats::default()
            },
            pushed,
        })
    }

    #[instrument(skip(self, local), fields(profile = %self.profile))]
    pub fn pull(&self, local: &[Habit]) -> Result<SyncReport, SyncError> {
        let remote = self.download()?;
        let (merged, stats) = reconcile_with_stats(local, &remote);
        info!(
            remote_taken = stats.remote_taken,
            remote_only = stats.remote_only,
            local_kept = stats.local_kept,
            "reconciled remote habits"
        );
        Ok(SyncReport {
            profile: self.profile.clone(),
            direction: SyncDirection::Pull,
            merged,
            stats,
            pushed: 0,
        })
    }

    /// Pull then push the merged collection so both sides converge.
    pub fn sync(&self, local: &[Habit]) -> Result<SyncReport, SyncError> {
        let mut report = self.pull(local)?;
        report.pushed = self.upload(&report.merged)?;
        report.direction = SyncDirection::Both;
        Ok(report)
    }

    pub fn run(&self, direction: SyncDirection, local: &[Habit]) -> Result<SyncReport, SyncError> {
        let result = match direction {
            SyncDirection::Push => self.push(local),
            SyncDirection::Pull => self.pull(local),
            SyncDirection::Both => self.sync(local),
        };
        if let Err(err) = &result {
            warn!(profile = %self.profile, %err, "sync failed, local habits left untouched");
        }
        result
    }

    fn download(&self) -> Result<Vec<Habit>, SyncError> {
        self.remote
            .fetch_habits(&self.profile)?
            .into_iter()
            .map(RemoteHabitRecord::into_habit)
            .collect()
    }

    fn upload(&self, habits: &[Habit]) -> Result<usize, SyncError> {
        let records = habits
            .iter()
            .map(RemoteHabitRecord::from_habit)
            .collect::<Result<Vec<_>, _>>()?;
        self.remote.upsert_habits(&self.profile, &records)?;
        info!(profile = %self.profile, count = records.len(), "pushed habits");
        Ok(records.len())
    }
}
