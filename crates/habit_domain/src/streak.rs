use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakResult {
    pub current: u32,
    pub longest: u32,
}

/// Current and longest runs of consecutive check-in days.
///
/// `current` counts backwards from `reference` itself, so a habit that has not
/// been checked in on `reference` has no current streak even if yesterday was.
/// `longest` only looks at history and ignores `reference`.
pub fn compute_streaks(checkins: &BTreeSet<NaiveDate>, reference: NaiveDate) -> StreakResult {
    if checkins.is_empty() {
        return StreakResult::default();
    }

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in checkins {
        run = match previous {
            Some(prev) if date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    let mut current = 0;
    let mut cursor = reference;
    while checkins.contains(&cursor) {
        current += 1;
        cursor = match cursor.pred_opt() {
            Some(day) => day,
            None => break,
        };
    }

    StreakResult { current, longest }
}
