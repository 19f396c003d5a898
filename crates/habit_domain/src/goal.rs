use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::DayOfWeek;
use crate::error::{HabitError, Result};

const PACE_EPSILON: f64 = 1e-9;

/// Progress towards a weekly check-in count after `elapsed_days` of the week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeeklyPace {
    pub goal: u32,
    pub count: u32,
    pub elapsed_days: u32,
    pub expected: f64,
    pub remaining: u32,
    pub behind: bool,
    pub at_risk: bool,
}

pub fn weekly_pace(goal: u32, count: u32, elapsed_days: u32) -> Result<WeeklyPace> {
    if !(1..=7).contains(&goal) {
        return Err(HabitError::invalid(format!(
            "weekly goal must be between 1 and 7, got {goal}"
        )));
    }
    if !(1..=7).contains(&elapsed_days) {
        return Err(HabitError::invalid(format!(
            "elapsed days must be between 1 and 7, got {elapsed_days}"
        )));
    }

    let expected = f64::from(goal) * f64::from(elapsed_days) / 7.0;
    let remaining = goal.saturating_sub(count);
    Ok(WeeklyPace {
        goal,
        count,
        elapsed_days,
        expected,
        remaining,
        behind: f64::from(count) + PACE_EPSILON < expected,
        at_risk: remaining > 7 - elapsed_days,
    })
}

/// Actual versus expected check-ins bucketed by weekday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekdaySummary {
    pub actual: BTreeMap<DayOfWeek, u32>,
    pub expected: BTreeMap<DayOfWeek, u32>,
    pub total_actual: u32,
    pub total_expected: u32,
}

impl WeekdaySummary {
    pub fn completion(&self) -> Option<f64> {
        if self.total_expected == 0 {
            return None;
        }
        Some(f64::from(self.total_actual) / f64::from(self.total_expected))
    }
}

/// Buckets every date of `window` by weekday.
///
/// Check-ins count towards their weekday whether or not it is a target; an
/// empty `targets` set means the habit is expected every day.
pub fn weekday_summary(
    window: &[NaiveDate],
    checkins: &BTreeSet<NaiveDate>,
    targets: &BTreeSet<DayOfWeek>,
) -> WeekdaySummary {
    let mut actual: BTreeMap<DayOfWeek, u32> = DayOfWeek::ALL.iter().map(|d| (*d, 0)).collect();
    let mut expected = actual.clone();
    let mut total_actual = 0;
    let mut total_expected = 0;

    for date in window {
        let day = DayOfWeek::of(*date);
        if checkins.contains(date) {
            *actual.entry(day).or_default() += 1;
            total_actual += 1;
        }
        if targets.is_empty() || targets.contains(&day) {
            *expected.entry(day).or_default() += 1;
            total_expected += 1;
        }
    }

    WeekdaySummary {
        actual,
        expected,
        total_actual,
        total_expected,
    }
}
