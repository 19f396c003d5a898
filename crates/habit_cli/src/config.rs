use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use habit_domain::calendar::parse_date;
use habit_domain::DayOfWeek;
use tracing::debug;

use crate::cli::GlobalArgs;

const DEFAULT_FILE_NAME: &str = ".habit-tracker.json";
const DEFAULT_PROFILE: &str = "default";
const DEFAULT_STALE_DAYS: i64 = 2;

/// Everything a command needs from its environment, resolved once up front.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub profile: String,
    pub remote_url: Option<String>,
    pub week_start: DayOfWeek,
    pub stale_days: i64,
    pub today: NaiveDate,
}

impl AppConfig {
    /// Flags win over environment variables (handled by clap), which win over defaults.
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = &args.data_path {
            config.data_path = path.clone();
        }
        if let Some(profile) = args.profile.as_deref().map(str::trim) {
            if !profile.is_empty() {
                config.profile = profile.to_string();
            }
        }
        config.remote_url = args
            .remote_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        if let Some(raw) = &args.week_start {
            config.week_start = raw
                .parse()
                .with_context(|| format!("invalid week start `{raw}`"))?;
        }
        if let Some(days) = args.stale_days {
            anyhow::ensure!(days >= 0, "stale days cannot be negative, got {days}");
            config.stale_days = days;
        }
        if let Some(raw) = &args.today {
            config.today = parse_date(raw).context("invalid --today")?;
        }
        debug!(
            path = %config.data_path.display(),
            profile = %config.profile,
            remote = config.remote_url.is_some(),
            "resolved configuration"
        );
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_path = dirs::home_dir()
            .map(|home| home.join(DEFAULT_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME));
        Self {
            data_path,
            profile: DEFAULT_PROFILE.to_string(),
            remote_url: None,
            week_start: DayOfWeek::Mon,
            stale_days: DEFAULT_STALE_DAYS,
            today: Local::now().date_naive(),
        }
    }
}
