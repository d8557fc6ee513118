//! Error types for the command-line harness.

use sf_profile::ProfileError;
use sf_stall::StallError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to read case file: {path}")]
    CaseRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse case file: {0}")]
    CaseParse(#[from] serde_yaml::Error),

    #[error("Invalid case: {0}")]
    InvalidCase(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Stall(#[from] StallError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
