//! Field-level validation shared by page and slot settings.
//!
//! Validators never fail eagerly. Problems are collected in a [`Validation`]
//! so that every error and warning for a configuration object can be
//! reported together.

use error_stack::{Report, ResultExt};

use crate::ad_tag::AdSize;
use crate::error::{error_check, BebopError, BebopResult};
use crate::logging::advisory;
use crate::raw::RawValue;
use crate::type_tag::{classify, is_int};

/// Errors and warnings accumulated while validating configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Validation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Appends everything collected by `other`.
    pub fn extend(&mut self, other: &Validation) {
        self.errors.extend_from_slice(&other.errors);
        self.warnings.extend_from_slice(&other.warnings);
    }

    pub(crate) fn errors_mut(&mut self) -> &mut Vec<String> {
        &mut self.errors
    }

    /// Fails with [`BebopError::InvalidState`] when any error was collected.
    ///
    /// # Errors
    ///
    /// Returns the joined error list.
    pub fn check(&self) -> BebopResult<()> {
        error_check(&self.errors)
    }

    /// Logs warnings, then errors, then fails if there were errors.
    ///
    /// # Errors
    ///
    /// Returns [`BebopError::InvalidState`] carrying every collected error.
    pub fn report(&self, subject: &str) -> BebopResult<()> {
        if !self.warnings.is_empty() {
            advisory!("{} warnings:\n{}", subject, self.warnings.join("\n"));
        }
        if !self.is_valid() {
            log::error!("{} errors:\n{}", subject, self.errors.join("\n"));
        }
        self.check()
            .attach(format!("while validating {subject}"))
    }
}

/// Reads an optional boolean option, defaulting to `false`.
pub fn optional_bool(value: &RawValue, option: &str, validation: &mut Validation) -> bool {
    match value {
        RawValue::Undefined => false,
        RawValue::Bool(b) => *b,
        other => {
            validation.error(format!(
                "{option} Option: type: boolean, default: false, got: {}",
                classify(other)
            ));
            false
        }
    }
}

/// Reads a required string option.
pub fn required_string(value: &RawValue, option: &str, validation: &mut Validation) -> String {
    match value {
        RawValue::String(s) => s.clone(),
        other => {
            validation.error(format!(
                "{option} Option: type: string, required: true, got: {}",
                classify(other)
            ));
            String::new()
        }
    }
}

/// `[width, height]` with two integers.
#[must_use]
pub fn is_single_size_array(value: &RawValue) -> bool {
    match value.as_array() {
        Some([width, height]) => is_int(width) && is_int(height),
        _ => false,
    }
}

/// An array of [`is_single_size_array`] values. An empty array qualifies.
#[must_use]
pub fn is_multi_size_array(value: &RawValue) -> bool {
    value
        .as_array()
        .is_some_and(|sizes| sizes.iter().all(is_single_size_array))
}

/// Converts a multi-size array into sizes. Negative dimensions are rejected.
#[must_use]
pub fn size_list(value: &RawValue) -> Option<Vec<AdSize>> {
    if !is_multi_size_array(value) {
        return None;
    }
    value
        .as_array()?
        .iter()
        .map(|pair| match pair.as_array()? {
            [RawValue::Number(w), RawValue::Number(h)] => {
                Some(AdSize::new(dimension(*w)?, dimension(*h)?))
            }
            _ => None,
        })
        .collect()
}

/// Converts an integral, non-negative number into a width or height.
pub(crate) fn dimension(n: f64) -> Option<u32> {
    if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(n as u32)
    } else {
        None
    }
}

/// Turns a failed strict check into a [`BebopError::TypeMismatch`].
pub(crate) fn type_mismatch(message: impl Into<String>) -> Report<BebopError> {
    Report::new(BebopError::TypeMismatch {
        message: message.into(),
    })
}
