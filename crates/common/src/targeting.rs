//! Targeting key/value pairs attached to slots and to the page.

use std::fmt;

use error_stack::Report;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{BebopError, BebopResult};
use crate::raw::RawValue;
use crate::type_tag::classify;

/// One element of a list-valued targeting entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetingAtom {
    Text(String),
    Number(f64),
}

/// A validated targeting value: a string, a number, or a list of either.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetingValue {
    Text(String),
    Number(f64),
    List(Vec<TargetingAtom>),
}

/// Targeting entries keyed by targeting key, in declaration order.
pub type TargetingMap = IndexMap<String, TargetingValue>;

impl TargetingValue {
    /// Converts a raw value, pushing a message onto `errors` when it is not
    /// a string, a number, or an array made only of strings and numbers.
    pub fn from_raw(value: &RawValue, errors: &mut Vec<String>) -> Option<Self> {
        let converted = match value {
            RawValue::String(s) => Some(Self::Text(s.clone())),
            RawValue::Number(n) if !n.is_nan() => Some(Self::Number(*n)),
            RawValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    RawValue::String(s) => Some(TargetingAtom::Text(s.clone())),
                    RawValue::Number(n) if !n.is_nan() => Some(TargetingAtom::Number(*n)),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map(Self::List),
            _ => None,
        };

        if converted.is_none() {
            errors.push(format!(
                "value: {value} ({}) is not a string, a number or an array of strings and numbers",
                classify(value)
            ));
        }
        converted
    }

    /// Strict conversion used by setters.
    ///
    /// # Errors
    ///
    /// Returns [`BebopError::TypeMismatch`] when the value is not a valid
    /// targeting value.
    pub fn try_from_raw(value: &RawValue) -> BebopResult<Self> {
        let mut errors = Vec::new();
        Self::from_raw(value, &mut errors).ok_or_else(|| {
            Report::new(BebopError::TypeMismatch {
                message: errors.join("\n"),
            })
        })
    }
}

/// Validates every entry of a raw targeting object.
///
/// Invalid entries are reported in `errors` and left out of the result;
/// callers treat a non-empty `errors` as a failed validation.
pub fn map_from_raw(raw: &RawValue, errors: &mut Vec<String>) -> TargetingMap {
    let mut map = TargetingMap::new();
    match raw {
        RawValue::Undefined => {}
        RawValue::Object(object) => {
            for (key, value) in object.iter() {
                if let Some(value) = TargetingValue::from_raw(value, errors) {
                    map.insert(key.to_string(), value);
                } else if let Some(last) = errors.last_mut() {
                    *last = format!("targeting key {key}: {last}");
                }
            }
        }
        other => errors.push(format!(
            "targeting Option: type: object, got: {}",
            classify(other)
        )),
    }
    map
}

impl fmt::Display for TargetingAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for TargetingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

impl From<&str> for TargetingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for TargetingValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}
