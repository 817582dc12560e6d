//! Typed scalar values shared by local and common row encodings

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Declared type of a field or a common concept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "str")]
    Text,
    #[serde(alias = "float", alias = "double")]
    Real,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Integer => write!(f, "integer"),
            ValueType::Text => write!(f, "text"),
            ValueType::Real => write!(f, "real"),
        }
    }
}

/// A single cell value.
///
/// `Null` is the canonical missing marker: it conforms to every type, passes
/// through every codec unchanged and never counts as evidence when comparing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type of the value, `None` for `Null`
    #[inline]
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ValueType::Integer),
            Value::Real(_) => Some(ValueType::Real),
            Value::Text(_) => Some(ValueType::Text),
        }
    }

    #[inline]
    pub fn conforms_to(&self, ty: ValueType) -> bool {
        self.value_type().map_or(true, |t| t == ty)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Convert the value to `ty`.
    ///
    /// Integers widen to reals, integral reals narrow to integers and text is
    /// parsed as a number. Anything else is a coercion error.
    pub fn coerce(self, ty: ValueType) -> Result<Value> {
        match (self, ty) {
            (Value::Null, _) => Ok(Value::Null),
            (v @ Value::Integer(_), ValueType::Integer) => Ok(v),
            (v @ Value::Real(_), ValueType::Real) => Ok(v),
            (v @ Value::Text(_), ValueType::Text) => Ok(v),
            (Value::Integer(i), ValueType::Real) => Ok(Value::Real(i as f64)),
            (Value::Real(r), ValueType::Integer) => {
                if r.fract() == 0.0 && r >= i64::MIN as f64 && r <= i64::MAX as f64 {
                    Ok(Value::Integer(r as i64))
                } else {
                    Err(Error::coercion(r, ValueType::Integer))
                }
            }
            (Value::Text(s), ValueType::Integer) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| Error::coercion(format!("{:?}", s), ValueType::Integer)),
            (Value::Text(s), ValueType::Real) => s
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| Error::coercion(format!("{:?}", s), ValueType::Real)),
            (v, ValueType::Text) => Err(Error::coercion(v, ValueType::Text)),
        }
    }

    /// Hashable projection used by exact-match indexes
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Integer(i) => ValueKey::Integer(*i),
            // -0.0 and 0.0 compare equal, so they must share a key
            Value::Real(r) if *r == 0.0 => ValueKey::Real(0.0f64.to_bits()),
            Value::Real(r) => ValueKey::Real(r.to_bits()),
            Value::Text(s) => ValueKey::Text(s.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Value::Real(r)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Hashable, `Eq` form of a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_widening_and_parsing() {
        assert_eq!(Value::Integer(3).coerce(ValueType::Real).unwrap(), Value::Real(3.0));
        assert_eq!(Value::Real(4.0).coerce(ValueType::Integer).unwrap(), Value::Integer(4));
        assert_eq!(Value::from(" 42 ").coerce(ValueType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(Value::from("1.5").coerce(ValueType::Real).unwrap(), Value::Real(1.5));
        assert_eq!(Value::Null.coerce(ValueType::Text).unwrap(), Value::Null);
    }

    #[test]
    fn test_coerce_errors() {
        assert!(matches!(
            Value::Real(4.5).coerce(ValueType::Integer),
            Err(Error::TypeCoercion { expected: ValueType::Integer, .. })
        ));
        assert!(Value::from("abc").coerce(ValueType::Real).is_err());
        assert!(Value::Integer(1).coerce(ValueType::Text).is_err());
    }

    #[test]
    fn test_conforms_to() {
        assert!(Value::Null.conforms_to(ValueType::Integer));
        assert!(Value::from("x").conforms_to(ValueType::Text));
        assert!(!Value::from("x").conforms_to(ValueType::Real));
    }

    #[test]
    fn test_value_key_zero() {
        assert_eq!(Value::Real(0.0).key(), Value::Real(-0.0).key());
        assert_ne!(Value::Integer(1).key(), Value::Real(1.0).key());
    }

    #[test]
    fn test_type_aliases() {
        let ty: ValueType = serde_json::from_str("\"str\"").unwrap();
        assert_eq!(ty, ValueType::Text);
        let ty: ValueType = serde_json::from_str("\"float\"").unwrap();
        assert_eq!(ty, ValueType::Real);
        let ty: ValueType = serde_json::from_str("\"integer\"").unwrap();
        assert_eq!(ty, ValueType::Integer);
    }

    #[test]
    fn test_serde_untagged() {
        let values: Vec<Value> = serde_json::from_str(r#"[null, 1, 2.5, "a"]"#).unwrap();
        assert_eq!(
            values,
            vec![Value::Null, Value::Integer(1), Value::Real(2.5), Value::from("a")]
        );
    }
}
