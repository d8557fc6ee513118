//! Error types for static profile data.

use sf_core::SfError;
use thiserror::Error;

/// Errors raised while building profile data. All of them are configuration
/// errors: lookups on a constructed profile never fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Too few rows in {what}: need at least 2, got {rows}")]
    TooFewRows { what: &'static str, rows: usize },

    #[error("Column length mismatch: {what}")]
    LengthMismatch { what: &'static str },

    #[error("Profile '{name}' has no coefficient table")]
    MissingTable { name: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error(transparent)]
    Core(#[from] SfError),
}

pub type ProfileResult<T> = Result<T, ProfileError>;
