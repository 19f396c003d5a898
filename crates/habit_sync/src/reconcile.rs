use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use habit_domain::Habit;
use serde::{Deserialize, Serialize};

/// How each id in a merged collection was resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeStats {
    pub local_kept: usize,
    pub remote_taken: usize,
    pub local_only: usize,
    pub remote_only: usize,
}

impl MergeStats {
    pub fn total(&self) -> usize {
        self.local_kept + self.remote_taken + self.local_only + self.remote_only
    }
}

/// Last-writer-wins merge keyed by habit id, ordered by id.
pub fn reconcile(local: &[Habit], remote: &[Habit]) -> Vec<Habit> {
    reconcile_with_stats(local, remote).0
}

pub fn reconcile_with_stats(local: &[Habit], remote: &[Habit]) -> (Vec<Habit>, MergeStats) {
    let mut merged: BTreeMap<u64, &Habit> = BTreeMap::new();
    for habit in local {
        merged.entry(habit.id).or_insert(habit);
    }
    let local_ids: BTreeSet<u64> = merged.keys().copied().collect();

    let mut stats = MergeStats::default();
    let mut seen_remote = BTreeSet::new();
    for candidate in remote {
        if !seen_remote.insert(candidate.id) {
            continue;
        }
        match merged.entry(candidate.id) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
                stats.remote_only += 1;
            }
            Entry::Occupied(mut slot) => {
                if remote_is_newer(slot.get(), candidate) {
                    slot.insert(candidate);
                    stats.remote_taken += 1;
                } else {
                    stats.local_kept += 1;
                }
            }
        }
    }
    stats.local_only = local_ids.difference(&seen_remote).count();

    (merged.into_values().cloned().collect(), stats)
}

/// A missing local stamp counts as the epoch, a missing remote stamp never wins.
fn remote_is_newer(local: &Habit, remote: &Habit) -> bool {
    match (local.revision(), remote.revision()) {
        (_, None) => false,
        (None, Some(_)) => true,
        (Some(local), Some(remote)) => remote > local,
    }
}
