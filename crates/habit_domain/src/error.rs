use thiserror::Error;

/// Failures raised by habit computations and lifecycle mutations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HabitError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cannot parse `{input}` as a YYYY-MM-DD date")]
    Parse { input: String },
    #[error("habit #{0} not found")]
    NotFound(u64),
    #[error("habit #{0} is archived and no longer accepts check-ins")]
    Archived(u64),
}

impl HabitError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T, E = HabitError> = std::result::Result<T, E>;
