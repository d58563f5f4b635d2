//! Error types for configuration validation and slot lifecycle failures.

use core::error::Error;

use derive_more::Display;
use error_stack::Report;

/// Errors surfaced by the Bebop library.
///
/// Every variant carries a human readable message. Validation failures carry
/// the newline-joined list of every individual violation that was found.
#[derive(Debug, Display)]
pub enum BebopError {
    /// A value's runtime type is not one of the expected types.
    #[display("Type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Settings with accumulated validation errors were used.
    #[display("Invalid state: {message}")]
    InvalidState { message: String },

    /// The bootstrap queue was used before configuration was available.
    #[display("Ordering violation: {message}")]
    OrderingViolation { message: String },

    /// The external ad tag failed to produce what was asked of it.
    #[display("External failure: {message}")]
    ExternalFailure { message: String },
}

impl Error for BebopError {}

impl BebopError {
    /// Builds an [`BebopError::InvalidState`] from a list of violations.
    #[must_use]
    pub fn invalid_state(errors: &[String]) -> Self {
        Self::InvalidState {
            message: errors.join("\n"),
        }
    }

    /// Returns the message carried by the error without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::TypeMismatch { message }
            | Self::InvalidState { message }
            | Self::OrderingViolation { message }
            | Self::ExternalFailure { message } => message,
        }
    }
}

/// Result alias used throughout the crate.
pub type BebopResult<T> = Result<T, Report<BebopError>>;

/// Fails with [`BebopError::InvalidState`] when `errors` is non-empty.
///
/// # Errors
///
/// Returns an error carrying every message in `errors` joined by newlines.
pub fn error_check(errors: &[String]) -> BebopResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Report::new(BebopError::invalid_state(errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!(
                "{}",
                BebopError::TypeMismatch {
                    message: "test".into()
                }
            ),
            "Type mismatch: test"
        );
        assert_eq!(
            format!(
                "{}",
                BebopError::OrderingViolation {
                    message: "test".into()
                }
            ),
            "Ordering violation: test"
        );
        assert_eq!(
            format!(
                "{}",
                BebopError::ExternalFailure {
                    message: "test".into()
                }
            ),
            "External failure: test"
        );
    }

    #[test]
    fn test_invalid_state_joins_every_violation() {
        let errors = vec!["first problem".to_string(), "second problem".to_string()];
        let err = BebopError::invalid_state(&errors);

        assert_eq!(err.message(), "first problem\nsecond problem");
        assert_eq!(
            format!("{err}"),
            "Invalid state: first problem\nsecond problem"
        );
    }

    #[test]
    fn test_error_check() {
        assert!(error_check(&[]).is_ok(), "should pass with no errors");

        let report = error_check(&["broken".to_string()]).expect_err("should fail with errors");
        assert!(matches!(
            report.current_context(),
            BebopError::InvalidState { .. }
        ));
    }
}
