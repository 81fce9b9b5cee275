//! A narrow `ScalarValue`, used for predicate literals and aggregate results.
//!
//! Shaped after `datafusion_common::ScalarValue` but restricted to the types
//! [`crate::schema::DataType`] recognizes.

use std::cmp::Ordering;

/// A single typed value, used both as a predicate literal and as the result
/// of a scalar aggregate (`Sum`, `Min`, `Max`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Utf8(String),
    Null,
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int32(v) => Some(*v as i64),
            ScalarValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float64(v) => Some(*v),
            ScalarValue::Int32(v) => Some(*v as f64),
            ScalarValue::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Partial order used by the zone map when comparing a literal against a
    /// chunk's cached min/max. `None` when the comparison is not meaningful
    /// (different types, or either side is NULL).
    pub fn partial_cmp_numeric(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "'{v}'"),
            ScalarValue::Null => write!(f, "NULL"),
        }
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int32(v)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparison_widens_integers() {
        let a = ScalarValue::Int32(5);
        let b = ScalarValue::Int64(5);
        assert_eq!(a.partial_cmp_numeric(&b), Some(Ordering::Equal));
    }

    #[test]
    fn string_comparison_is_not_numeric() {
        let a = ScalarValue::Utf8("x".into());
        let b = ScalarValue::Int32(1);
        assert_eq!(a.partial_cmp_numeric(&b), None);
    }
}
