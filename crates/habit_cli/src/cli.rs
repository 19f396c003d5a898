use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "habit")]
#[command(version, about = "Local-first habit tracker", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Habit document location
    #[arg(long = "data", global = true, env = "HABIT_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Remote profile namespace used by sync
    #[arg(long, global = true, env = "HABIT_PROFILE")]
    pub profile: Option<String>,

    /// Remote store location (SQLite path or sqlite:// URL)
    #[arg(long = "remote", global = true, env = "HABIT_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// First day of the week (mon..sun)
    #[arg(long, global = true, env = "HABIT_WEEK_START")]
    pub week_start: Option<String>,

    /// Days without a check-in before a habit is flagged by `nudge`
    #[arg(long, global = true, env = "HABIT_STALE_DAYS")]
    pub stale_days: Option<i64>,

    /// Reference date instead of the local calendar date (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a new habit
    Add {
        title: String,
        /// Weekly check-in target (1-7)
        #[arg(long, conflicts_with = "days")]
        goal: Option<i64>,
        /// Weekday schedule, e.g. mon,wed,fri
        #[arg(long)]
        days: Option<String>,
    },
    /// List habits with their streaks
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
        #[arg(long, default_value = "id")]
        sort: String,
    },
    /// Record check-ins (defaults to today)
    Checkin(DateArgs),
    /// Remove check-ins (defaults to today)
    Uncheck(DateArgs),
    /// Archive a habit
    Done { id: u64 },
    /// Delete a habit permanently
    Delete { id: u64 },
    /// Rename a habit
    Rename { id: u64, title: String },
    /// Set or clear a habit's weekly goal
    Goal(GoalArgs),
    /// Current and longest streaks
    Streaks {
        #[arg(long, default_value = "current")]
        sort: String,
        #[arg(long)]
        all: bool,
    },
    /// Weekday breakdown over a trailing window
    Report {
        #[arg(long, default_value_t = 7, allow_negative_numbers = true)]
        days: i64,
        /// Last day of the window (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Progress through the current week
    Week {
        /// Any day of the week to show (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Habits that are stale or behind their weekly pace (see --stale-days)
    Nudge,
    /// Habit counts
    Stats,
    /// Reconcile with the remote store
    Sync {
        #[arg(value_enum, default_value_t = SyncMode::Both)]
        direction: SyncMode,
    },
}

#[derive(Args, Debug, Clone)]
pub struct DateArgs {
    pub id: u64,
    /// Specific dates (repeatable)
    #[arg(long = "date")]
    pub dates: Vec<String>,
    /// Start of an inclusive range
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    /// End of an inclusive range
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct GoalArgs {
    pub id: u64,
    /// Weekly check-in target (1-7)
    #[arg(
        long,
        allow_negative_numbers = true,
        conflicts_with_all = ["days", "clear"],
        required_unless_present_any = ["days", "clear"]
    )]
    pub per_week: Option<i64>,
    /// Weekday schedule, e.g. mon,wed,fri
    #[arg(long, conflicts_with = "clear")]
    pub days: Option<String>,
    #[arg(long)]
    pub clear: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    Push,
    Pull,
    Both,
}
