use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{date_range, elapsed_in_week, week_window, window_dates, DayOfWeek};
use crate::error::Result;
use crate::goal::{weekday_summary, weekly_pace, WeekdaySummary, WeeklyPace};
use crate::habit::{Goal, Habit};
use crate::streak::compute_streaks;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakRow {
    pub id: u64,
    pub title: String,
    pub done: bool,
    pub current: u32,
    pub longest: u32,
    pub total: usize,
    pub last_date: Option<NaiveDate>,
    pub days_since: Option<i64>,
}

pub fn streak_row(habit: &Habit, reference: NaiveDate) -> StreakRow {
    let streaks = compute_streaks(&habit.checkins, reference);
    let last_date = habit.last_checkin();
    StreakRow {
        id: habit.id,
        title: habit.title.clone(),
        done: habit.done,
        current: streaks.current,
        longest: streaks.longest,
        total: habit.checkins.len(),
        last_date,
        days_since: last_date.map(|last| (reference - last).num_days()),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Current,
    Longest,
    Title,
    #[default]
    Id,
}

impl SortMode {
    /// Unrecognised modes fall back to sorting by id.
    pub fn from_mode(mode: &str) -> Self {
        mode.parse().unwrap_or_default()
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(SortMode::Current),
            "longest" => Ok(SortMode::Longest),
            "title" => Ok(SortMode::Title),
            "id" => Ok(SortMode::Id),
            other => Err(format!("unknown sort mode `{other}`")),
        }
    }
}

/// Total ordering key for a row; `id` breaks every tie.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey<'a> {
    rank: i64,
    title: &'a str,
    id: u64,
}

pub fn streak_sort_key(row: &StreakRow, mode: SortMode) -> SortKey<'_> {
    let (rank, title) = match mode {
        SortMode::Current => (-i64::from(row.current), ""),
        SortMode::Longest => (-i64::from(row.longest), ""),
        SortMode::Title => (0, row.title.as_str()),
        SortMode::Id => (0, ""),
    };
    SortKey {
        rank,
        title,
        id: row.id,
    }
}

pub fn sort_rows(rows: &mut [StreakRow], mode: SortMode) {
    rows.sort_by(|a, b| streak_sort_key(a, mode).cmp(&streak_sort_key(b, mode)));
}

/// Rows for the list and streak views.
pub fn streak_rows(
    habits: &[Habit],
    reference: NaiveDate,
    include_archived: bool,
    mode: SortMode,
) -> Vec<StreakRow> {
    let mut rows: Vec<StreakRow> = habits
        .iter()
        .filter(|habit| include_archived || !habit.done)
        .map(|habit| streak_row(habit, reference))
        .collect();
    sort_rows(&mut rows, mode);
    rows
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    pub streak: StreakRow,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub summary: WeekdaySummary,
}

impl ReportRow {
    pub fn completion(&self) -> Option<f64> {
        self.summary.completion()
    }
}

/// Per-habit weekday breakdown over the `days` ending at `end`.
pub fn report_rows(habits: &[Habit], end: NaiveDate, days: i64) -> Result<Vec<ReportRow>> {
    let window = window_dates(end, days)?;
    let window_start = window.first().copied().unwrap_or(end);
    let rows = habits
        .iter()
        .filter(|habit| !habit.done)
        .map(|habit| ReportRow {
            streak: streak_row(habit, end),
            window_start,
            window_end: end,
            summary: weekday_summary(&window, &habit.checkins, &habit.weekday_schedule()),
        })
        .collect();
    Ok(rows)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum WeekTarget {
    Weekly(WeeklyPace),
    Schedule(WeekdaySummary),
    Unset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekRow {
    pub id: u64,
    pub title: String,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub elapsed_days: u32,
    pub count: u32,
    /// One entry per elapsed day of the week, oldest first.
    pub days: Vec<(NaiveDate, bool)>,
    pub target: WeekTarget,
}

pub fn week_row(habit: &Habit, reference: NaiveDate, week_start: DayOfWeek) -> Result<WeekRow> {
    let (start, end) = week_window(reference, week_start);
    let elapsed_days = elapsed_in_week(reference, week_start);
    let elapsed = date_range(start, reference);
    let days: Vec<(NaiveDate, bool)> = elapsed
        .iter()
        .map(|date| (*date, habit.is_checked_in(*date)))
        .collect();
    let count = days.iter().filter(|(_, done)| *done).count() as u32;

    let target = match &habit.goal {
        Some(Goal::Weekly { per_week }) => {
            WeekTarget::Weekly(weekly_pace(u32::from(*per_week), count, elapsed_days)?)
        }
        Some(Goal::Weekdays { days }) => {
            WeekTarget::Schedule(weekday_summary(&elapsed, &habit.checkins, days))
        }
        None => WeekTarget::Unset,
    };

    Ok(WeekRow {
        id: habit.id,
        title: habit.title.clone(),
        week_start: start,
        week_end: end,
        elapsed_days,
        count,
        days,
        target,
    })
}

pub fn week_rows(
    habits: &[Habit],
    reference: NaiveDate,
    week_start: DayOfWeek,
) -> Result<Vec<WeekRow>> {
    habits
        .iter()
        .filter(|habit| !habit.done)
        .map(|habit| week_row(habit, reference, week_start))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Nudge {
    pub row: StreakRow,
    pub stale: bool,
    pub pace: Option<WeeklyPace>,
}

impl Nudge {
    pub fn behind(&self) -> bool {
        self.pace.map(|pace| pace.behind).unwrap_or(false)
    }
}

/// Active habits that are stale or behind their weekly pace.
pub fn nudges(
    habits: &[Habit],
    reference: NaiveDate,
    stale_days: i64,
    week_start: DayOfWeek,
) -> Result<Vec<Nudge>> {
    let mut out = Vec::new();
    for habit in habits.iter().filter(|habit| !habit.done) {
        let row = streak_row(habit, reference);
        let stale = row.days_since.map_or(true, |days| days >= stale_days);
        let pace = match habit.goal.as_ref().and_then(Goal::per_week) {
            Some(goal) => {
                let (start, _) = week_window(reference, week_start);
                let count = habit.checkins.range(start..=reference).count() as u32;
                Some(weekly_pace(goal, count, elapsed_in_week(reference, week_start))?)
            }
            None => None,
        };
        let nudge = Nudge { row, stale, pace };
        if nudge.stale || nudge.behind() {
            out.push(nudge);
        }
    }
    tracing::debug!(flagged = out.len(), %reference, "computed nudges");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn habit(id: u64, title: &str, checkins: &[&str]) -> Habit {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut habit = Habit::new(id, title, now);
        habit.checkins = checkins.iter().map(|raw| day(raw)).collect();
        habit
    }

    fn row(id: u64, title: &str, current: u32, longest: u32) -> StreakRow {
        StreakRow {
            id,
            title: title.to_string(),
            done: false,
            current,
            longest,
            total: 0,
            last_date: None,
            days_since: None,
        }
    }

    fn ids(rows: &[StreakRow]) -> Vec<u64> {
        rows.iter().map(|row| row.id).collect()
    }

    #[test]
    fn streak_row_basic() {
        let item = habit(
            3,
            "Hydrate",
            &["2026-02-01", "2026-02-05", "2026-02-06", "2026-02-07"],
        );
        let row = streak_row(&item, day("2026-02-07"));
        assert_eq!(row.id, 3);
        assert_eq!(row.title, "Hydrate");
        assert_eq!(row.current, 3);
        assert_eq!(row.longest, 3);
        assert_eq!(row.total, 4);
        assert_eq!(row.last_date, Some(day("2026-02-07")));
        assert_eq!(row.days_since, Some(0));
    }

    #[test]
    fn streak_row_without_checkins() {
        let row = streak_row(&habit(1, "Floss", &[]), day("2026-02-07"));
        assert_eq!(row.total, 0);
        assert_eq!(row.last_date, None);
        assert_eq!(row.days_since, None);
    }

    #[test]
    fn streak_sort_key_modes() {
        let rows = vec![
            row(2, "Beta", 1, 4),
            row(1, "Alpha", 3, 3),
            row(3, "Gamma", 2, 5),
        ];

        let mut sorted = rows.clone();
        sort_rows(&mut sorted, SortMode::Current);
        assert_eq!(ids(&sorted), vec![1, 3, 2]);

        sort_rows(&mut sorted, SortMode::Longest);
        assert_eq!(ids(&sorted), vec![3, 2, 1]);

        sort_rows(&mut sorted, SortMode::Title);
        assert_eq!(ids(&sorted), vec![1, 2, 3]);

        sort_rows(&mut sorted, SortMode::Id);
        assert_eq!(ids(&sorted), vec![1, 2, 3]);
    }

    #[test]
    fn ties_break_on_id_regardless_of_input_order() {
        let forward = vec![row(5, "Same", 2, 2), row(4, "Same", 2, 2), row(9, "same", 2, 2)];
        let mut backward = forward.clone();
        backward.reverse();

        for mode in [SortMode::Current, SortMode::Longest, SortMode::Title, SortMode::Id] {
            let mut a = forward.clone();
            let mut b = backward.clone();
            sort_rows(&mut a, mode);
            sort_rows(&mut b, mode);
            assert_eq!(ids(&a), ids(&b));
        }

        let mut titled = forward;
        sort_rows(&mut titled, SortMode::Title);
        // Uppercase sorts before lowercase.
        assert_eq!(ids(&titled), vec![4, 5, 9]);
    }

    #[test]
    fn unknown_sort_mode_falls_back_to_id() {
        assert_eq!(SortMode::from_mode("streakiest"), SortMode::Id);
        assert_eq!(SortMode::from_mode("LONGEST"), SortMode::Longest);
    }

    #[test]
    fn streak_rows_hide_archived_unless_requested() {
        let mut archived = habit(2, "Old", &["2026-02-01"]);
        archived.done = true;
        let habits = vec![habit(1, "New", &[]), archived];

        assert_eq!(ids(&streak_rows(&habits, day("2026-02-07"), false, SortMode::Id)), vec![1]);
        assert_eq!(
            ids(&streak_rows(&habits, day("2026-02-07"), true, SortMode::Id)),
            vec![1, 2]
        );
    }

    #[test]
    fn report_uses_schedule_when_present() {
        let mut scheduled = habit(1, "Gym", &["2026-02-02", "2026-02-04"]);
        scheduled.goal = Some(Goal::weekdays([DayOfWeek::Mon, DayOfWeek::Wed, DayOfWeek::Fri]).unwrap());
        let daily = habit(2, "Read", &["2026-02-07"]);

        let rows = report_rows(&[scheduled, daily], day("2026-02-07"), 7).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].window_start, day("2026-02-01"));
        assert_eq!(rows[0].summary.total_expected, 3);
        assert_eq!(rows[0].summary.total_actual, 2);
        assert_eq!(rows[1].summary.total_expected, 7);
        assert_eq!(rows[1].completion(), Some(1.0 / 7.0));

        assert!(report_rows(&[], day("2026-02-07"), 0).is_err());
    }

    #[test]
    fn week_row_tracks_weekly_pace() {
        let mut item = habit(1, "Run", &["2026-01-31", "2026-02-02"]);
        item.goal = Some(Goal::weekly(3).unwrap());

        // Wednesday of the week starting Monday 2026-02-02.
        let row = week_row(&item, day("2026-02-04"), DayOfWeek::Mon).unwrap();
        assert_eq!(row.week_start, day("2026-02-02"));
        assert_eq!(row.week_end, day("2026-02-08"));
        assert_eq!(row.elapsed_days, 3);
        assert_eq!(row.count, 1);
        assert_eq!(row.days.len(), 3);
        assert_eq!(row.days[0], (day("2026-02-02"), true));
        match row.target {
            WeekTarget::Weekly(pace) => {
                assert_eq!(pace.remaining, 2);
                assert!(pace.behind);
                assert!(!pace.at_risk);
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn nudges_flag_stale_and_behind_habits() {
        let reference = day("2026-02-06"); // Friday
        let fresh = habit(1, "Fresh", &["2026-02-05", "2026-02-06"]);
        let stale = habit(2, "Stale", &["2026-02-01"]);
        let never = habit(3, "Never", &[]);
        let mut behind = habit(4, "Behind", &["2026-02-06"]);
        behind.goal = Some(Goal::weekly(6).unwrap());
        let mut archived = habit(5, "Archived", &[]);
        archived.done = true;

        let flagged = nudges(
            &[fresh, stale, never, behind, archived],
            reference,
            2,
            DayOfWeek::Mon,
        )
        .unwrap();
        let flagged_ids: Vec<u64> = flagged.iter().map(|nudge| nudge.row.id).collect();
        assert_eq!(flagged_ids, vec![2, 3, 4]);

        let behind = &flagged[2];
        assert!(!behind.stale);
        assert!(behind.behind());
        assert!(flagged[1].stale);
    }
}
