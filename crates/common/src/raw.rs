//! Untyped host values as handed over by page script.
//!
//! Page configuration is not trusted to have the right shape, so it is kept
//! in a loose representation until it has been validated. [`RawValue`]
//! mirrors the value kinds a host page can produce, including zero-argument
//! callbacks such as `getViewPortWidth`, and keeps object keys in
//! declaration order.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

/// A zero-argument callback supplied by the host page.
#[derive(Clone)]
pub struct HostFunction(Rc<dyn Fn() -> RawValue>);

impl HostFunction {
    pub fn new(f: impl Fn() -> RawValue + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[must_use]
    pub fn call(&self) -> RawValue {
        (self.0)()
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostFunction")
    }
}

/// An untyped configuration value.
#[derive(Debug, Clone, Default)]
pub enum RawValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<RawValue>),
    Object(RawObject),
    Function(HostFunction),
}

/// An object whose entries keep the order they were declared in.
#[derive(Debug, Clone, Default)]
pub struct RawObject {
    entries: Vec<(String, RawValue)>,
}

impl RawObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`, or `Undefined`.
    #[must_use]
    pub fn get(&self, key: &str) -> &RawValue {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(&RawValue::Undefined, |(_, v)| v)
    }

    /// Sets `key`, replacing an existing entry in place or appending a new one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = RawObject::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

impl RawValue {
    /// Wraps a host callback.
    pub fn function(f: impl Fn() -> RawValue + 'static) -> Self {
        Self::Function(HostFunction::new(f))
    }

    /// Member access with JavaScript semantics: anything that is not an
    /// object, or a missing key, reads as `Undefined`.
    #[must_use]
    pub fn get(&self, key: &str) -> &RawValue {
        match self {
            Self::Object(object) => object.get(key),
            _ => &RawValue::Undefined,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&RawObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[RawValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&HostFunction> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }

    /// JavaScript truthiness.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) | Self::Function(_) => true,
        }
    }

    /// Inserts `key` when `self` is an object. Other values are left alone.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<RawValue>) -> bool {
        match self {
            Self::Object(object) => {
                object.insert(key, value);
                true
            }
            _ => false,
        }
    }
}

/// Short rendering used inside validation messages.
impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
            Self::Object(_) => f.write_str("[object Object]"),
            Self::Function(_) => f.write_str("function"),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => Self::Object(map.into_iter().collect()),
        }
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for RawValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for RawValue {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(items: Vec<RawValue>) -> Self {
        Self::Array(items)
    }
}

impl From<RawObject> for RawValue {
    fn from(object: RawObject) -> Self {
        Self::Object(object)
    }
}

impl From<HostFunction> for RawValue {
    fn from(f: HostFunction) -> Self {
        Self::Function(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_objects_keep_declaration_order() {
        let value = RawValue::from(json!({"small": 400, "large": 800, "huge": 1200}));
        let keys: Vec<&str> = value
            .as_object()
            .expect("should be an object")
            .iter()
            .map(|(k, _)| k)
            .collect();

        assert_eq!(
            keys,
            vec!["small", "large", "huge"],
            "should preserve declaration order"
        );
    }

    #[test]
    fn missing_members_read_as_undefined() {
        let value = RawValue::from(json!({"a": {"b": 1}}));

        assert!(matches!(value.get("a").get("b"), RawValue::Number(n) if *n == 1.0));
        assert!(matches!(value.get("missing"), RawValue::Undefined));
        assert!(matches!(value.get("a").get("b").get("c"), RawValue::Undefined));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut object: RawObject = [("a", 1), ("b", 2)].into_iter().collect();
        object.insert("a", 3);

        let entries: Vec<String> = object.iter().map(|(k, v)| format!("{k}={v}")).collect();
        assert_eq!(entries, vec!["a=3", "b=2"]);
    }

    #[test]
    fn truthiness_follows_javascript() {
        assert!(!RawValue::Undefined.is_truthy());
        assert!(!RawValue::Null.is_truthy());
        assert!(!RawValue::from("").is_truthy());
        assert!(!RawValue::from(0).is_truthy());
        assert!(!RawValue::Number(f64::NAN).is_truthy());
        assert!(RawValue::from("yes").is_truthy());
        assert!(RawValue::Array(vec![]).is_truthy());
        assert!(RawValue::function(|| RawValue::Null).is_truthy());
    }

    #[test]
    fn host_functions_are_callable() {
        let width = RawValue::function(|| RawValue::from(768));
        let result = width.as_function().expect("should be a function").call();

        assert!(matches!(result, RawValue::Number(n) if n == 768.0));
    }
}
