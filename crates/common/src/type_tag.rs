//! Shallow runtime type classification for [`RawValue`]s.
//!
//! Validation never inspects structure beyond a single level; everything is
//! built on [`classify`] and [`is_one_of`].

use derive_more::Display;
use error_stack::Report;

use crate::error::{BebopError, BebopResult};
use crate::raw::RawValue;

/// The runtime kind of a value.
///
/// `Null` is distinguished from `Object`, arrays get their own tag, and a
/// numeric NaN is tagged `NaN` rather than `Number`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    #[display("null")]
    Null,
    #[display("array")]
    Array,
    #[display("object")]
    Object,
    #[display("number")]
    Number,
    #[display("NaN")]
    NaN,
    #[display("string")]
    String,
    #[display("boolean")]
    Boolean,
    #[display("function")]
    Function,
    #[display("undefined")]
    Undefined,
}

#[must_use]
pub fn classify(value: &RawValue) -> TypeTag {
    match value {
        RawValue::Null => TypeTag::Null,
        RawValue::Array(_) => TypeTag::Array,
        RawValue::Object(_) => TypeTag::Object,
        RawValue::Number(n) if n.is_nan() => TypeTag::NaN,
        RawValue::Number(_) => TypeTag::Number,
        RawValue::String(_) => TypeTag::String,
        RawValue::Bool(_) => TypeTag::Boolean,
        RawValue::Function(_) => TypeTag::Function,
        RawValue::Undefined => TypeTag::Undefined,
    }
}

#[must_use]
pub fn is_one_of(value: &RawValue, tags: &[TypeTag]) -> bool {
    tags.contains(&classify(value))
}

/// True for numbers that are integral and fit in a signed 32-bit integer.
///
/// Integrality is mathematical, so `1.0` is an integer. Values outside the
/// 32-bit range are not integers, which keeps thresholds and sizes in a
/// range every host can represent exactly.
#[must_use]
pub fn is_int(value: &RawValue) -> bool {
    match value {
        RawValue::Number(n) => {
            n.is_finite()
                && n.fract() == 0.0
                && *n >= f64::from(i32::MIN)
                && *n <= f64::from(i32::MAX)
        }
        _ => false,
    }
}

/// True for finite numbers that are not integers by [`is_int`].
#[must_use]
pub fn is_float(value: &RawValue) -> bool {
    matches!(value, RawValue::Number(n) if n.is_finite()) && !is_int(value)
}

/// True for numbers and for strings that convert to a number.
///
/// String conversion follows the host string-to-number grammar: surrounding
/// whitespace is ignored, the empty string is zero, decimal and scientific
/// literals may be signed, and `0x`/`0o`/`0b` literals must be unsigned. A
/// negative hex string such as `"-0x1"` is therefore not numeric even though
/// the literal `-0x1` is.
#[must_use]
pub fn is_numeric(value: &RawValue) -> bool {
    match value {
        RawValue::Number(n) => !n.is_nan(),
        RawValue::String(s) => string_to_number(s).is_some(),
        _ => false,
    }
}

/// Fails with [`BebopError::TypeMismatch`] unless `value` has one of `tags`.
///
/// # Errors
///
/// Returns a type mismatch naming the expected tags and the actual one.
pub fn enforce_type(value: &RawValue, tags: &[TypeTag]) -> BebopResult<()> {
    if is_one_of(value, tags) {
        return Ok(());
    }
    Err(Report::new(BebopError::TypeMismatch {
        message: mismatch_message(value, tags),
    }))
}

pub(crate) fn mismatch_message(value: &RawValue, tags: &[TypeTag]) -> String {
    let expected: Vec<String> = tags.iter().map(ToString::to_string).collect();
    format!(
        "Expected types: [{}] got: {}",
        expected.join(", "),
        classify(value)
    )
}

fn string_to_number(input: &str) -> Option<f64> {
    let s = input.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return parse_radix(digits, radix);
        }
    }

    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    if is_decimal_literal(unsigned) {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0_f64, |acc, c| {
        c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
    })
}

/// `digits [. digits] [e [sign] digits]` or `. digits [e ...]`, unsigned.
fn is_decimal_literal(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
        None => (s, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }

    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
    }
}
