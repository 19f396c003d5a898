pub mod book;
pub mod calendar;
pub mod error;
pub mod goal;
pub mod habit;
pub mod report;
pub mod service;
pub mod store;
pub mod streak;

pub use crate::book::{Change, CheckinOutcome, HabitBook, HabitStats};
pub use crate::calendar::DayOfWeek;
pub use crate::error::HabitError;
pub use crate::habit::{Goal, Habit};
pub use crate::service::HabitService;
pub use crate::store::{HabitStore, StoreError};
pub use crate::streak::{compute_streaks, StreakResult};
