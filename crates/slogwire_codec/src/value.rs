//! Typed attribute values.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeDelta};

use crate::error::CodecResult;

/// A value with no direct wire kind.
///
/// The encoder prefers [`marshal_text`](AnyValue::marshal_text) and falls
/// back to the `Display` representation when it returns `None`.
pub trait AnyValue: fmt::Display + fmt::Debug + Send + Sync {
    /// Returns the value's own text form, if it has one.
    ///
    /// An `Err` is recorded on the encoder and reported when the record is
    /// finished.
    fn marshal_text(&self) -> Option<CodecResult<String>> {
        None
    }
}

/// The kind of a [`Value`], matching the wire opcodes one to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// 64-bit float.
    Float,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Opaque bytes.
    Bytes,
    /// Signed nanosecond duration.
    Duration,
    /// Timestamp with UTC offset.
    Time,
    /// Nested attributes.
    Group,
}

impl ValueKind {
    /// Lower-case name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Duration => "duration",
            Self::Time => "time",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured log attribute value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Opaque bytes.
    Bytes(Vec<u8>),
    /// Signed duration.
    Duration(TimeDelta),
    /// Point in time with its UTC offset.
    Time(DateTime<FixedOffset>),
    /// Nested attributes, in declaration order.
    Group(Vec<Attr>),
    /// Anything else; encoded as a string.
    Any(Arc<dyn AnyValue>),
}

impl Value {
    /// Create a group value from key/value pairs.
    pub fn group<K, V, I>(attrs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Group(attrs.into_iter().map(|(k, v)| Attr::new(k, v)).collect())
    }

    /// Wrap an arbitrary value.
    pub fn any(value: impl AnyValue + 'static) -> Self {
        Value::Any(Arc::new(value))
    }

    /// Returns the wire kind this value encodes as.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Uint(_) => ValueKind::Uint,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::String(_) | Value::Any(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Duration(_) => ValueKind::Duration,
            Value::Time(_) => ValueKind::Time,
            Value::Group(_) => ValueKind::Group,
        }
    }

    /// Get this value as a signed integer, if it is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value's children, if it is a group.
    pub fn as_group(&self) -> Option<&[Attr]> {
        match self {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b && a.offset() == b.offset(),
            (Value::Group(a), Value::Group(b)) => a == b,
            (Value::Any(a), Value::Any(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// A key/value attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: Value,
}

impl Attr {
    /// Create an attribute.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(u64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl From<std::time::Duration> for Value {
    fn from(d: std::time::Duration) -> Self {
        Value::Duration(TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX))
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Time(t)
    }
}

impl From<Vec<Attr>> for Value {
    fn from(attrs: Vec<Attr>) -> Self {
        Value::Group(attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point(i32, i32);

    impl fmt::Display for Point {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "({}, {})", self.0, self.1)
        }
    }

    impl AnyValue for Point {}

    #[test]
    fn kinds() {
        assert_eq!(Value::from(1i64).kind(), ValueKind::Int);
        assert_eq!(Value::from(1u64).kind(), ValueKind::Uint);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::any(Point(1, 2)).kind(), ValueKind::String);
        assert_eq!(Value::group([("a", 1i64)]).kind(), ValueKind::Group);
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
    }

    #[test]
    fn any_values_compare_by_identity() {
        let a = Value::any(Point(1, 2));
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Value::any(Point(1, 2)));
    }

    #[test]
    fn group_builder_keeps_order() {
        let group = Value::group([("z", Value::from(1i64)), ("a", Value::from("x"))]);
        let attrs = group.as_group().unwrap();
        assert_eq!(attrs[0].key, "z");
        assert_eq!(attrs[1].key, "a");
        assert_eq!(attrs[1].value.as_str(), Some("x"));
    }

    #[test]
    fn std_duration_converts() {
        let v = Value::from(std::time::Duration::from_millis(3));
        assert_eq!(v, Value::Duration(TimeDelta::milliseconds(3)));
    }
}
