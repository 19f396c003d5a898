use chrono::NaiveDate;
use habit_domain::calendar::{format_date, DayOfWeek};
use habit_domain::goal::{WeekdaySummary, WeeklyPace};
use habit_domain::report::{Nudge, ReportRow, StreakRow, WeekRow, WeekTarget};
use habit_domain::{Goal, HabitStats};
use habit_sync::{SyncDirection, SyncReport};

pub fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|date| format_date(*date))
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(count: impl Into<u64>, word: &str) -> String {
    let count = count.into();
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

pub fn describe_goal(goal: &Goal) -> String {
    match goal {
        Goal::Weekly { per_week } => format!("{per_week} per week"),
        Goal::Weekdays { days } => days
            .iter()
            .map(|day| day.label())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

pub fn list_line(row: &StreakRow) -> String {
    let status = if row.done { "✓" } else { "·" };
    let last = row
        .last_date
        .map(format_date)
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{:>3} {} {}  streak {} (best {}), {}, last {}",
        row.id,
        status,
        row.title,
        row.current,
        row.longest,
        plural(row.total as u64, "check-in"),
        last
    )
}

pub fn streak_line(row: &StreakRow) -> String {
    let since = match row.days_since {
        Some(0) => "checked in today".to_string(),
        Some(days) if days > 0 => format!("last check-in {} ago", plural(days as u64, "day")),
        Some(_) => "last check-in after the reference date".to_string(),
        None => "never checked in".to_string(),
    };
    format!(
        "#{} {}: current {}, longest {}, {}",
        row.id, row.title, row.current, row.longest, since
    )
}

fn weekday_breakdown(summary: &WeekdaySummary) -> String {
    DayOfWeek::ALL
        .into_iter()
        .filter(|day| summary.actual[day] > 0 || summary.expected[day] > 0)
        .map(|day| format!("{} {}/{}", day, summary.actual[&day], summary.expected[&day]))
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn report_line(row: &ReportRow) -> String {
    let percent = row
        .completion()
        .map(|ratio| format!("{:.0}%", ratio * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "#{} {}: {}/{} ({})  {}",
        row.streak.id,
        row.streak.title,
        row.summary.total_actual,
        row.summary.total_expected,
        percent,
        weekday_breakdown(&row.summary)
    )
}

fn pace_note(pace: &WeeklyPace) -> String {
    let state = if pace.at_risk {
        "goal out of reach"
    } else if pace.behind {
        "behind pace"
    } else {
        "on pace"
    };
    format!(
        "goal {}: {} more needed, expected {:.1} by now, {}",
        pace.goal, pace.remaining, pace.expected, state
    )
}

pub fn week_line(row: &WeekRow) -> String {
    let marks: String = row
        .days
        .iter()
        .map(|(_, done)| if *done { 'x' } else { '.' })
        .collect();
    let target = match &row.target {
        WeekTarget::Weekly(pace) => pace_note(pace),
        WeekTarget::Schedule(summary) => format!(
            "scheduled {}/{} so far",
            summary.total_actual, summary.total_expected
        ),
        WeekTarget::Unset => "no goal".to_string(),
    };
    format!(
        "#{} {} [{:<7}] {} done; {}",
        row.id, row.title, marks, row.count, target
    )
}

pub fn nudge_line(nudge: &Nudge) -> String {
    let mut reasons = Vec::new();
    if nudge.stale {
        reasons.push(match nudge.row.days_since {
            Some(days) => format!("no check-in for {}", plural(days.max(0) as u64, "day")),
            None => "never checked in".to_string(),
        });
    }
    if let Some(pace) = nudge.pace.filter(|pace| pace.behind) {
        reasons.push(format!(
            "behind pace ({}/{} this week, expected {:.1})",
            pace.count, pace.goal, pace.expected
        ));
    }
    format!("#{} {}: {}", nudge.row.id, nudge.row.title, reasons.join("; "))
}

pub fn stats_lines(stats: &HabitStats) -> Vec<String> {
    vec![
        format!("Total: {}", stats.total),
        format!("Active: {}", stats.active),
        format!("Completed: {}", stats.archived),
        format!("Check-ins: {}", stats.checkins),
    ]
}

pub fn sync_line(report: &SyncReport) -> String {
    match report.direction {
        SyncDirection::Push => format!(
            "Pushed {} to profile `{}`.",
            plural(report.pushed as u64, "habit"),
            report.profile
        ),
        SyncDirection::Pull | SyncDirection::Both => {
            let mut line = format!(
                "Synced profile `{}`: {} updated from remote, {} new from remote, {} kept locally, {} local only.",
                report.profile,
                report.stats.remote_taken,
                report.stats.remote_only,
                report.stats.local_kept,
                report.stats.local_only
            );
            if report.direction == SyncDirection::Both {
                line.push_str(&format!(" Pushed {}.", plural(report.pushed as u64, "habit")));
            }
            line
        }
    }
}
