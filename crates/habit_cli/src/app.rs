use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use habit_domain::calendar::{date_range, format_date, parse_date, parse_day_list};
use habit_domain::report::{self, SortMode};
use habit_domain::{Change, Goal, HabitService};
use habit_sync::{SyncDirection, SyncService};
use tracing::{debug, instrument};

use crate::cli::{Cli, Command, DateArgs, GoalArgs, SyncMode};
use crate::config::AppConfig;
use crate::output;

/// Resolves configuration and runs one command, writing its report to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let config = AppConfig::from_args(&cli.global)?;
    execute(&config, cli.command, out)
}

#[instrument(skip(config, out), fields(path = %config.data_path.display()))]
pub fn execute<W: Write>(config: &AppConfig, command: Command, out: &mut W) -> Result<()> {
    let service = HabitService::open(&config.data_path)?;
    match command {
        Command::Add { title, goal, days } => {
            let goal = match (goal, days) {
                (Some(per_week), _) => Some(Goal::weekly(per_week)?),
                (None, Some(days)) => Some(Goal::weekdays(parse_day_list(&days)?)?),
                (None, None) => None,
            };
            let ((id, title), _) = service.update(|book| {
                let habit = book.add(&title, goal, Utc::now())?;
                Ok(((habit.id, habit.title.clone()), Change::Applied))
            })?;
            writeln!(out, "Added habit #{id}: {title}")?;
        }
        Command::List { all, sort } => {
            let rows = report::streak_rows(
                &service.habits(),
                config.today,
                all,
                SortMode::from_mode(&sort),
            );
            if rows.is_empty() {
                writeln!(out, "No habits yet.")?;
            }
            for row in &rows {
                writeln!(out, "{}", output::list_line(row))?;
            }
        }
        Command::Checkin(args) => {
            let dates = resolve_dates(&args, config.today)?;
            let (outcome, _) = service.update(|book| {
                let outcome = book.check_in(args.id, &dates, Utc::now())?;
                let change = outcome.change();
                Ok((outcome, change))
            })?;
            if !outcome.changed.is_empty() {
                writeln!(
                    out,
                    "Checked in habit #{}: {}",
                    args.id,
                    output::join_dates(&outcome.changed)
                )?;
            }
            if !outcome.skipped.is_empty() {
                writeln!(out, "Already checked in: {}", output::join_dates(&outcome.skipped))?;
            }
        }
        Command::Uncheck(args) => {
            let dates = resolve_dates(&args, config.today)?;
            let (outcome, _) = service.update(|book| {
                let outcome = book.uncheck(args.id, &dates, Utc::now())?;
                let change = outcome.change();
                Ok((outcome, change))
            })?;
            if !outcome.changed.is_empty() {
                writeln!(
                    out,
                    "Removed check-ins from habit #{}: {}",
                    args.id,
                    output::join_dates(&outcome.changed)
                )?;
            }
            if !outcome.skipped.is_empty() {
                writeln!(out, "No check-in on: {}", output::join_dates(&outcome.skipped))?;
            }
        }
        Command::Done { id } => {
            let (title, change) = service.update(|book| {
                let change = book.mark_done(id, Utc::now())?;
                Ok((book.get(id)?.title.clone(), change))
            })?;
            match change {
                Change::Applied => writeln!(out, "Completed habit #{id}: {title}")?,
                Change::Unchanged => writeln!(out, "Habit #{id} is already done.")?,
            }
        }
        Command::Delete { id } => {
            service.update(|book| Ok((book.delete(id)?, Change::Applied)))?;
            writeln!(out, "Deleted habit #{id}.")?;
        }
        Command::Rename { id, title } => {
            let (previous, change) = service.update(|book| book.rename(id, &title, Utc::now()))?;
            let current = service.read(|book| book.get(id).map(|habit| habit.title.clone()))?;
            match change {
                Change::Applied => writeln!(out, "Renamed habit #{id}: {previous} -> {current}")?,
                Change::Unchanged => writeln!(out, "Habit #{id} is already named {current}.")?,
            }
        }
        Command::Goal(args) => set_goal(&service, args, out)?,
        Command::Streaks { sort, all } => {
            let rows = report::streak_rows(
                &service.habits(),
                config.today,
                all,
                SortMode::from_mode(&sort),
            );
            if rows.is_empty() {
                writeln!(out, "No habits yet.")?;
            }
            for row in &rows {
                writeln!(out, "{}", output::streak_line(row))?;
            }
        }
        Command::Report { days, end } => {
            let end = match end {
                Some(raw) => parse_date(&raw).context("invalid --end")?,
                None => config.today,
            };
            let rows = report::report_rows(&service.habits(), end, days)?;
            if let Some(first) = rows.first() {
                writeln!(
                    out,
                    "Report {} to {}",
                    format_date(first.window_start),
                    format_date(first.window_end)
                )?;
            } else {
                writeln!(out, "No active habits.")?;
            }
            for row in &rows {
                writeln!(out, "{}", output::report_line(row))?;
            }
        }
        Command::Week { date } => {
            let reference = match date {
                Some(raw) => parse_date(&raw).context("invalid --date")?,
                None => config.today,
            };
            let rows = report::week_rows(&service.habits(), reference, config.week_start)?;
            if let Some(first) = rows.first() {
                writeln!(
                    out,
                    "Week {} to {}",
                    format_date(first.week_start),
                    format_date(first.week_end)
                )?;
            } else {
                writeln!(out, "No active habits.")?;
            }
            for row in &rows {
                writeln!(out, "{}", output::week_line(row))?;
            }
        }
        Command::Nudge => {
            let flagged = report::nudges(
                &service.habits(),
                config.today,
                config.stale_days,
                config.week_start,
            )?;
            if flagged.is_empty() {
                writeln!(out, "Nothing to nudge.")?;
            }
            for nudge in &flagged {
                writeln!(out, "{}", output::nudge_line(nudge))?;
            }
        }
        Command::Stats => {
            let stats = service.read(|book| book.stats());
            if stats.total == 0 {
                writeln!(out, "No habits yet.")?;
            } else {
                for line in output::stats_lines(&stats) {
                    writeln!(out, "{line}")?;
                }
            }
        }
        Command::Sync { direction } => {
            let direction = match direction {
                SyncMode::Push => SyncDirection::Push,
                SyncMode::Pull => SyncDirection::Pull,
                SyncMode::Both => SyncDirection::Both,
            };
            let remote = habit_sync::connect(config.remote_url.as_deref())?;
            let sync = SyncService::new(remote, config.profile.as_str());
            let report = sync.run(direction, &service.habits())?;
            if direction != SyncDirection::Push {
                service.replace_all(report.merged.clone())?;
            }
            writeln!(out, "{}", output::sync_line(&report))?;
        }
    }
    Ok(())
}

/// Dates named by `--date` plus any `--from/--to` range, or today when none are given.
fn resolve_dates(args: &DateArgs, today: NaiveDate) -> Result<Vec<NaiveDate>> {
    let mut dates = args
        .dates
        .iter()
        .map(|raw| parse_date(raw).with_context(|| format!("invalid --date `{raw}`")))
        .collect::<Result<Vec<_>>>()?;
    if let (Some(from), Some(to)) = (&args.from, &args.to) {
        let start = parse_date(from).context("invalid --from")?;
        let end = parse_date(to).context("invalid --to")?;
        let range = date_range(start, end);
        if range.is_empty() {
            bail!("invalid range: {from} is after {to}");
        }
        dates.extend(range);
    }
    if dates.is_empty() {
        dates.push(today);
    }
    dates.sort_unstable();
    dates.dedup();
    debug!(count = dates.len(), "resolved dates");
    Ok(dates)
}

fn set_goal<W: Write>(service: &HabitService, args: GoalArgs, out: &mut W) -> Result<()> {
    let id = args.id;
    if args.clear {
        let (_, change) = service.update(|book| Ok(((), book.clear_goal(id, Utc::now())?)))?;
        match change {
            Change::Applied => writeln!(out, "Cleared goal for habit #{id}.")?,
            Change::Unchanged => writeln!(out, "Habit #{id} has no goal.")?,
        }
        return Ok(());
    }
    let goal = match (args.per_week, args.days) {
        (Some(per_week), _) => Goal::weekly(per_week)?,
        (None, Some(days)) => Goal::weekdays(parse_day_list(&days)?)?,
        (None, None) => bail!("goal needs --per-week, --days or --clear"),
    };
    let description = output::describe_goal(&goal);
    let (_, change) = service.update(|book| Ok(((), book.set_goal(id, goal, Utc::now())?)))?;
    match change {
        Change::Applied => writeln!(out, "Goal for habit #{id}: {description}")?,
        Change::Unchanged => writeln!(out, "Habit #{id} already has goal {description}.")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_args(dates: &[&str], range: Option<(&str, &str)>) -> DateArgs {
        DateArgs {
            id: 1,
            dates: dates.iter().map(|raw| raw.to_string()).collect(),
            from: range.map(|(from, _)| from.to_string()),
            to: range.map(|(_, to)| to.to_string()),
        }
    }

    fn day(raw: &str) -> NaiveDate {
        parse_date(raw).unwrap()
    }

    #[test]
    fn dates_default_to_today() {
        let today = day("2026-02-07");
        assert_eq!(resolve_dates(&date_args(&[], None), today).unwrap(), vec![today]);
    }

    #[test]
    fn explicit_dates_and_ranges_combine() {
        let args = date_args(&["2026-02-01", "2026-02-03"], Some(("2026-02-03", "2026-02-04")));
        let dates = resolve_dates(&args, day("2026-02-07")).unwrap();
        assert_eq!(
            dates,
            vec![day("2026-02-01"), day("2026-02-03"), day("2026-02-04")]
        );
    }

    #[test]
    fn reversed_range_is_rejected() {
        let args = date_args(&[], Some(("2026-02-05", "2026-02-01")));
        let err = resolve_dates(&args, day("2026-02-07")).unwrap_err();
        assert!(err.to_string().contains("invalid range"));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(resolve_dates(&date_args(&["2026-2-1"], None), day("2026-02-07")).is_err());
    }
}
