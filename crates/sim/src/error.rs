//! Simulator error types.

use core::error::Error;

use derive_more::Display;

/// Errors raised while loading or running a scenario.
#[derive(Debug, Display)]
pub enum SimError {
    /// The scenario file could not be read.
    #[display("Failed to read scenario: {message}")]
    Io { message: String },

    /// The scenario could not be parsed or merged with the environment.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// The scenario parsed but failed validation.
    #[display("Scenario validation failed: {message}")]
    Validation { message: String },

    /// The library refused the scenario's page configuration.
    #[display("Bebop error: {message}")]
    Bebop { message: String },

    /// The outcome could not be written.
    #[display("Output error: {message}")]
    Output { message: String },
}

impl Error for SimError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SimError::Validation {
            message: "viewport_width: range".into(),
        };
        assert_eq!(
            error.to_string(),
            "Scenario validation failed: viewport_width: range"
        );
    }
}
