use std::path::{Path, PathBuf};
use thiserror::Error;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("File unavailable: {path}: {reason}")]
    FileUnavailable { path: PathBuf, reason: String },

    #[error("Sheet '{sheet}' not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Month not found: {0}")]
    MonthNotFound(String),

    #[error("Date not found: {0}")]
    DateNotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown division: {0}")]
    UnknownDivision(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Worker error: {0}")]
    Worker(String),
}

impl RosterError {
    pub fn file_unavailable(path: &Path, reason: impl ToString) -> Self {
        RosterError::FileUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    /// True for "data not present for this lookup" conditions, which callers
    /// fold into empty results instead of surfacing.
    pub fn is_lookup_miss(&self) -> bool {
        matches!(
            self,
            RosterError::SheetNotFound { .. }
                | RosterError::UserNotFound(_)
                | RosterError::MonthNotFound(_)
                | RosterError::DateNotFound(_)
                | RosterError::Parse(_)
        )
    }
}
