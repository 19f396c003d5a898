use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{HabitError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Weekday labels as stored in habit schedules, numbered Monday-first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
        DayOfWeek::Sun,
    ];

    pub fn of(date: NaiveDate) -> Self {
        Self::from(date.weekday())
    }

    /// Monday-first index in `0..=6`.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn label(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
            DayOfWeek::Sat => "sat",
            DayOfWeek::Sun => "sun",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        Self::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl FromStr for DayOfWeek {
    type Err = HabitError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| day.label() == normalized)
            .ok_or_else(|| {
                HabitError::invalid(format!(
                    "unknown weekday `{value}`, expected one of mon,tue,wed,thu,fri,sat,sun"
                ))
            })
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse a comma separated list such as `mon,wed,fri`.
pub fn parse_day_list(input: &str) -> Result<Vec<DayOfWeek>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(DayOfWeek::from_str)
        .collect()
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    // chrono accepts unpadded fields; the canonical form does not.
    if trimmed.len() != 10 {
        return Err(HabitError::Parse {
            input: input.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| HabitError::Parse {
        input: input.to_string(),
    })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `days` consecutive dates ending at and including `end`, oldest first.
pub fn window_dates(end: NaiveDate, days: i64) -> Result<Vec<NaiveDate>> {
    if days < 1 {
        return Err(HabitError::invalid(format!(
            "window length must be at least 1 day, got {days}"
        )));
    }
    let start = end
        .checked_sub_days(Days::new(days.unsigned_abs() - 1))
        .ok_or_else(|| {
            HabitError::invalid(format!(
                "a {days}-day window ending {} reaches past the earliest supported date",
                format_date(end)
            ))
        })?;
    Ok(date_range(start, end))
}

/// Every date from `start` to `end` inclusive; empty when `end` precedes `start`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if end < start {
        return Vec::new();
    }
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// Seven-day window containing `reference` that opens on the most recent `week_start`.
pub fn week_window(reference: NaiveDate, week_start: DayOfWeek) -> (NaiveDate, NaiveDate) {
    let offset = (DayOfWeek::of(reference).index() + 7 - week_start.index()) % 7;
    let start = reference - Duration::days(i64::from(offset));
    (start, start + Duration::days(6))
}

/// Days of the current week that have occurred, `reference` included (1..=7).
pub fn elapsed_in_week(reference: NaiveDate, week_start: DayOfWeek) -> u32 {
    let (start, _) = week_window(reference, week_start);
    (reference - start).num_days() as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_dates_are_oldest_first_and_include_end() {
        let window = window_dates(date(2026, 2, 7), 7).unwrap();
        assert_eq!(window.len(), 7);
        assert_eq!(window.first(), Some(&date(2026, 2, 1)));
        assert_eq!(window.last(), Some(&date(2026, 2, 7)));

        assert_eq!(window_dates(date(2026, 3, 1), 1).unwrap(), vec![date(2026, 3, 1)]);
    }

    #[test]
    fn window_dates_rejects_non_positive_lengths() {
        assert!(matches!(
            window_dates(date(2026, 2, 7), 0),
            Err(HabitError::InvalidArgument(_))
        ));
        assert!(window_dates(date(2026, 2, 7), -3).is_err());
    }

    #[test]
    fn window_dates_rejects_windows_before_the_calendar_starts() {
        assert!(matches!(
            window_dates(date(2026, 2, 7), 100_000_000),
            Err(HabitError::InvalidArgument(_))
        ));
        assert!(matches!(
            window_dates(date(2026, 2, 7), i64::MAX),
            Err(HabitError::InvalidArgument(_))
        ));
        let window = window_dates(date(2026, 2, 7), 400).unwrap();
        assert_eq!(window.len(), 400);
        assert_eq!(window[0], date(2025, 1, 4));
    }

    #[test]
    fn date_range_crosses_month_and_handles_inverted_bounds() {
        let range = date_range(date(2024, 2, 27), date(2024, 3, 1));
        assert_eq!(
            range,
            vec![
                date(2024, 2, 27),
                date(2024, 2, 28),
                date(2024, 2, 29),
                date(2024, 3, 1)
            ]
        );
        assert!(date_range(date(2024, 3, 2), date(2024, 3, 1)).is_empty());
        assert_eq!(date_range(date(2024, 3, 1), date(2024, 3, 1)).len(), 1);
    }

    #[test]
    fn week_window_starts_on_most_recent_week_start() {
        // 2026-02-04 is a Wednesday.
        let (start, end) = week_window(date(2026, 2, 4), DayOfWeek::Mon);
        assert_eq!(start, date(2026, 2, 2));
        assert_eq!(end, date(2026, 2, 8));

        let (start, _) = week_window(date(2026, 2, 4), DayOfWeek::Sun);
        assert_eq!(start, date(2026, 2, 1));

        let (start, _) = week_window(date(2026, 2, 4), DayOfWeek::Thu);
        assert_eq!(start, date(2026, 1, 29));
    }

    #[test]
    fn week_window_begins_on_reference_when_it_is_week_start() {
        let (start, end) = week_window(date(2026, 2, 2), DayOfWeek::Mon);
        assert_eq!(start, date(2026, 2, 2));
        assert_eq!(end, date(2026, 2, 8));
        assert_eq!(elapsed_in_week(date(2026, 2, 2), DayOfWeek::Mon), 1);
        assert_eq!(elapsed_in_week(date(2026, 2, 8), DayOfWeek::Mon), 7);
    }

    #[test]
    fn weekday_labels_parse_case_insensitively() {
        assert_eq!("Fri".parse::<DayOfWeek>().unwrap(), DayOfWeek::Fri);
        assert_eq!(
            parse_day_list("mon, wed,fri").unwrap(),
            vec![DayOfWeek::Mon, DayOfWeek::Wed, DayOfWeek::Fri]
        );
        assert!("funday".parse::<DayOfWeek>().is_err());
        assert_eq!(DayOfWeek::of(date(2026, 2, 1)), DayOfWeek::Sun);
        assert_eq!(DayOfWeek::Sun.index(), 6);
    }

    #[test]
    fn parse_date_requires_canonical_form() {
        assert_eq!(parse_date("2026-02-07").unwrap(), date(2026, 2, 7));
        assert!(matches!(parse_date("2026-2-7"), Err(HabitError::Parse { .. })));
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn format_then_parse_returns_the_same_date() {
        for day in date_range(date(2023, 12, 25), date(2024, 3, 5)) {
            assert_eq!(parse_date(&format_date(day)).unwrap(), day);
        }
    }
}
