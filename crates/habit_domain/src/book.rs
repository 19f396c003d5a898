use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HabitError, Result};
use crate::habit::{Goal, Habit};

/// Whether a mutation actually changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    Unchanged,
}

impl Change {
    pub fn is_applied(self) -> bool {
        matches!(self, Change::Applied)
    }
}

/// Dates a check-in or uncheck toggled versus those already in the wanted state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckinOutcome {
    pub changed: Vec<NaiveDate>,
    pub skipped: Vec<NaiveDate>,
}

impl CheckinOutcome {
    pub fn change(&self) -> Change {
        if self.changed.is_empty() {
            Change::Unchanged
        } else {
            Change::Applied
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitStats {
    pub total: usize,
    pub active: usize,
    pub archived: usize,
    pub checkins: usize,
}

/// The local habit collection and every lifecycle mutation on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitBook {
    habits: Vec<Habit>,
}

impl HabitBook {
    pub fn new(habits: Vec<Habit>) -> Self {
        Self { habits }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn get(&self, id: u64) -> Result<&Habit> {
        self.habits
            .iter()
            .find(|habit| habit.id == id)
            .ok_or(HabitError::NotFound(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|habit| habit.id == id)
            .ok_or(HabitError::NotFound(id))
    }

    pub fn next_id(&self) -> u64 {
        self.habits.iter().map(|habit| habit.id).max().unwrap_or(0) + 1
    }

    pub fn add(&mut self, title: &str, goal: Option<Goal>, now: DateTime<Utc>) -> Result<&Habit> {
        let title = clean_title(title)?;
        let mut habit = Habit::new(self.next_id(), title, now);
        habit.goal = goal;
        info!(id = habit.id, title = %habit.title, "added habit");
        self.habits.push(habit);
        Ok(&self.habits[self.habits.len() - 1])
    }

    pub fn check_in(
        &mut self,
        id: u64,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> Result<CheckinOutcome> {
        let habit = self.get_mut(id)?;
        if habit.done {
            return Err(HabitError::Archived(id));
        }
        let mut outcome = CheckinOutcome::default();
        for date in dates {
            if habit.checkins.insert(*date) {
                outcome.changed.push(*date);
            } else {
                outcome.skipped.push(*date);
            }
        }
        if outcome.change().is_applied() {
            habit.touch(now);
        }
        debug!(id, changed = outcome.changed.len(), skipped = outcome.skipped.len(), "check-in");
        Ok(outcome)
    }

    pub fn uncheck(
        &mut self,
        id: u64,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> Result<CheckinOutcome> {
        let habit = self.get_mut(id)?;
        let mut outcome = CheckinOutcome::default();
        for date in dates {
            if habit.checkins.remove(date) {
                outcome.changed.push(*date);
            } else {
                outcome.skipped.push(*date);
            }
        }
        if outcome.change().is_applied() {
            habit.touch(now);
        }
        debug!(id, changed = outcome.changed.len(), skipped = outcome.skipped.len(), "uncheck");
        Ok(outcome)
    }

    /// Returns the previous title.
    pub fn rename(&mut self, id: u64, title: &str, now: DateTime<Utc>) -> Result<(String, Change)> {
        let title = clean_title(title)?;
        let habit = self.get_mut(id)?;
        if habit.title == title {
            return Ok((habit.title.clone(), Change::Unchanged));
        }
        let previous = std::mem::replace(&mut habit.title, title);
        habit.touch(now);
        Ok((previous, Change::Applied))
    }

    pub fn mark_done(&mut self, id: u64, now: DateTime<Utc>) -> Result<Change> {
        let habit = self.get_mut(id)?;
        if habit.done {
            return Ok(Change::Unchanged);
        }
        habit.done = true;
        habit.done_at = Some(now);
        habit.touch(now);
        info!(id, "archived habit");
        Ok(Change::Applied)
    }

    pub fn set_goal(&mut self, id: u64, goal: Goal, now: DateTime<Utc>) -> Result<Change> {
        let habit = self.get_mut(id)?;
        if habit.goal.as_ref() == Some(&goal) {
            return Ok(Change::Unchanged);
        }
        habit.goal = Some(goal);
        habit.touch(now);
        Ok(Change::Applied)
    }

    pub fn clear_goal(&mut self, id: u64, now: DateTime<Utc>) -> Result<Change> {
        let habit = self.get_mut(id)?;
        if habit.goal.take().is_none() {
            return Ok(Change::Unchanged);
        }
        habit.touch(now);
        Ok(Change::Applied)
    }

    /// Removes the habit entirely; there is no tombstone.
    pub fn delete(&mut self, id: u64) -> Result<Habit> {
        let index = self
            .habits
            .iter()
            .position(|habit| habit.id == id)
            .ok_or(HabitError::NotFound(id))?;
        info!(id, "deleted habit");
        Ok(self.habits.remove(index))
    }

    pub fn stats(&self) -> HabitStats {
        let archived = self.habits.iter().filter(|habit| habit.done).count();
        HabitStats {
            total: self.habits.len(),
            active: self.habits.len() - archived,
            archived,
            checkins: self.habits.iter().map(|habit| habit.checkins.len()).sum(),
        }
    }
}

fn clean_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(HabitError::invalid("habit title cannot be empty"));
    }
    Ok(trimmed.to_string())
}
