use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar::DayOfWeek;
use crate::error::{HabitError, Result};

/// A tracked habit together with every date it was performed on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: u64,
    pub title: String,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub done_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(default)]
    pub checkins: BTreeSet<NaiveDate>,
}

/// Weekly target for a habit. A plain count and a weekday schedule never apply together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Goal {
    Weekly { per_week: u8 },
    Weekdays { days: BTreeSet<DayOfWeek> },
}

impl Goal {
    pub fn weekly(per_week: i64) -> Result<Self> {
        if !(1..=7).contains(&per_week) {
            return Err(HabitError::invalid(format!(
                "weekly goal must be between 1 and 7, got {per_week}"
            )));
        }
        Ok(Goal::Weekly {
            per_week: per_week as u8,
        })
    }

    pub fn weekdays(days: impl IntoIterator<Item = DayOfWeek>) -> Result<Self> {
        let days: BTreeSet<DayOfWeek> = days.into_iter().collect();
        if days.is_empty() {
            return Err(HabitError::invalid("weekday schedule needs at least one day"));
        }
        Ok(Goal::Weekdays { days })
    }

    pub fn per_week(&self) -> Option<u32> {
        match self {
            Goal::Weekly { per_week } => Some(u32::from(*per_week)),
            Goal::Weekdays { .. } => None,
        }
    }

    pub fn schedule(&self) -> Option<&BTreeSet<DayOfWeek>> {
        match self {
            Goal::Weekly { .. } => None,
            Goal::Weekdays { days } => Some(days),
        }
    }
}

impl Habit {
    pub fn new(id: u64, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            created_at: Some(now),
            updated_at: Some(now),
            done: false,
            done_at: None,
            goal: None,
            checkins: BTreeSet::new(),
        }
    }

    /// Recency used when reconciling replicas; falls back to creation time.
    pub fn revision(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    pub fn last_checkin(&self) -> Option<NaiveDate> {
        self.checkins.last().copied()
    }

    pub fn is_checked_in(&self, date: NaiveDate) -> bool {
        self.checkins.contains(&date)
    }

    pub fn weekday_schedule(&self) -> BTreeSet<DayOfWeek> {
        self.goal
            .as_ref()
            .and_then(Goal::schedule)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }
}

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Lenient RFC 3339 parsing: anything unreadable is treated as missing.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|value| value.with_timezone(&Utc))
}

pub(crate) mod timestamp {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format_timestamp(*value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
        Ok(raw
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(parse_timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn legacy_records_deserialize_with_missing_fields() {
        let raw = r#"{"id": 4, "title": "Stretch", "created_at": "2026-01-02T08:00:00Z", "done": true}"#;
        let habit: Habit = serde_json::from_str(raw).unwrap();
        assert_eq!(habit.id, 4);
        assert!(habit.done);
        assert!(habit.updated_at.is_none());
        assert!(habit.checkins.is_empty());
        assert_eq!(
            habit.revision(),
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn unparseable_timestamps_become_missing() {
        let raw = r#"{"id": 1, "title": "Read", "created_at": "yesterday", "updated_at": 17}"#;
        let habit: Habit = serde_json::from_str(raw).unwrap();
        assert_eq!(habit.revision(), None);
    }

    #[test]
    fn serializes_dates_and_goal_in_canonical_form() {
        let now = Utc.with_ymd_and_hms(2026, 2, 7, 12, 30, 0).unwrap();
        let mut habit = Habit::new(3, "Hydrate", now);
        habit.checkins.insert(NaiveDate::from_ymd_opt(2026, 2, 6).unwrap());
        habit.goal = Some(Goal::weekdays([DayOfWeek::Wed, DayOfWeek::Mon]).unwrap());

        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["created_at"], "2026-02-07T12:30:00Z");
        assert_eq!(value["checkins"][0], "2026-02-06");
        assert_eq!(value["goal"]["kind"], "weekdays");
        assert_eq!(value["goal"]["days"], serde_json::json!(["mon", "wed"]));
        assert!(value.get("done_at").is_none());

        let back: Habit = serde_json::from_value(value).unwrap();
        assert_eq!(back, habit);
    }

    #[test]
    fn weekly_goal_is_bounded() {
        assert_eq!(Goal::weekly(3).unwrap().per_week(), Some(3));
        assert!(Goal::weekly(0).is_err());
        assert!(Goal::weekly(8).is_err());
        assert!(Goal::weekdays(Vec::new()).is_err());
    }
}
