//! Error types for the dynamic stall models.

use sf_core::SfError;
use sf_profile::ProfileError;
use thiserror::Error;

/// Errors raised by model construction and evaluation.
///
/// Construction errors (`InvalidConfig`, `UnknownModel`, `Profile`) are fatal
/// before a run starts. `TimeReversal` and `NonFinite` are per-step failures
/// the host is expected to abort on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StallError {
    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Unknown dynamic stall model '{name}' (known: {known})")]
    UnknownModel { name: String, known: String },

    #[error("Time went backwards: {time} is earlier than the latest evaluation at {latest}")]
    TimeReversal { time: f64, latest: f64 },

    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Replica exchange failed: {what}")]
    Replica { what: &'static str },

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Core(SfError),
}

pub type StallResult<T> = Result<T, StallError>;

impl From<SfError> for StallError {
    fn from(e: SfError) -> Self {
        match e {
            SfError::NonFinite { what, value } => StallError::NonFinite { what, value },
            other => StallError::Core(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StallError::TimeReversal {
            time: 1.0,
            latest: 2.0,
        };
        assert!(err.to_string().contains("backwards"));
    }

    #[test]
    fn non_finite_maps_to_stall_variant() {
        let err: StallError = sf_core::ensure_finite(f64::NAN, "lift coefficient")
            .unwrap_err()
            .into();
        assert!(matches!(
            err,
            StallError::NonFinite {
                what: "lift coefficient",
                ..
            }
        ));

        let err: StallError = SfError::InvalidArg { what: "x" }.into();
        assert!(matches!(err, StallError::Core(_)));
    }
}
