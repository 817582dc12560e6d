//! Conversions between a table's local encoding and the common encoding

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{Value, ValueType};

/// Default date layout, the one most spreadsheet exports use
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Capability interface for user supplied codecs.
///
/// `denormalize(normalize(v))` must give back `v`. `Null` never reaches a
/// codec.
pub trait ValueCodec: Send + Sync {
    fn normalize(&self, value: Value) -> Result<Value>;

    fn denormalize(&self, value: Value) -> Result<Value>;

    fn name(&self) -> &str {
        "custom"
    }
}

/// Normalize / denormalize pair of a field
#[derive(Clone, Default)]
pub enum Codec {
    #[default]
    Identity,
    /// Local text date in `format` <-> common integer epoch seconds (UTC)
    DateText { format: String },
    /// Local integer epoch seconds <-> common text date in `format` (UTC)
    EpochSeconds { format: String },
    /// Local text `"{prefix}{n}"` <-> common integer `n`
    Prefixed { prefix: String },
    /// Local real <-> common real `local * factor`
    Scaled { factor: f64 },
    Custom(Arc<dyn ValueCodec>),
}

impl Codec {
    pub fn custom<C: ValueCodec + 'static>(codec: C) -> Self {
        Codec::Custom(Arc::new(codec))
    }

    pub fn date_text(format: impl Into<String>) -> Self {
        Codec::DateText {
            format: format.into(),
        }
    }

    pub fn epoch_seconds(format: impl Into<String>) -> Self {
        Codec::EpochSeconds {
            format: format.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Codec::Prefixed {
            prefix: prefix.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Codec::Identity => "identity",
            Codec::DateText { .. } => "date_text",
            Codec::EpochSeconds { .. } => "epoch_seconds",
            Codec::Prefixed { .. } => "prefixed",
            Codec::Scaled { .. } => "scaled",
            Codec::Custom(custom) => custom.name(),
        }
    }

    /// Common type produced from a local value of type `local`, when known
    /// statically
    pub fn common_type(&self, local: ValueType) -> Option<ValueType> {
        match self {
            Codec::Identity => Some(local),
            Codec::DateText { .. } | Codec::Prefixed { .. } => Some(ValueType::Integer),
            Codec::EpochSeconds { .. } => Some(ValueType::Text),
            Codec::Scaled { .. } => Some(ValueType::Real),
            Codec::Custom(_) => None,
        }
    }

    /// Reject codec parameters that can never round-trip
    pub fn validate(&self) -> Result<()> {
        match self {
            Codec::Scaled { factor } if *factor == 0.0 || !factor.is_finite() => Err(
                Error::InvalidSchema(format!("scale factor must be finite and non-zero, got {}", factor)),
            ),
            Codec::DateText { format } | Codec::EpochSeconds { format } if format.is_empty() => {
                Err(Error::InvalidSchema("date format cannot be empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Local value -> common value
    pub fn normalize(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Codec::Identity => Ok(value),
            Codec::DateText { format } => match value {
                Value::Text(s) => parse_date(&s, format).map(Value::Integer),
                other => Err(Error::coercion(other, ValueType::Text)),
            },
            Codec::EpochSeconds { format } => match value {
                Value::Integer(secs) => format_date(secs, format).map(Value::Text),
                other => Err(Error::coercion(other, ValueType::Integer)),
            },
            Codec::Prefixed { prefix } => match value {
                Value::Text(s) => parse_prefixed(&s, prefix).map(Value::Integer),
                other => Err(Error::coercion(other, ValueType::Text)),
            },
            Codec::Scaled { factor } => value
                .as_f64()
                .map(|v| Value::Real(v * factor))
                .ok_or_else(|| Error::coercion(&value, ValueType::Real)),
            Codec::Custom(custom) => custom.normalize(value),
        }
    }

    /// Common value -> local value
    pub fn denormalize(&self, value: Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Codec::Identity => Ok(value),
            Codec::DateText { format } => match value {
                Value::Integer(secs) => format_date(secs, format).map(Value::Text),
                other => Err(Error::coercion(other, ValueType::Integer)),
            },
            Codec::EpochSeconds { format } => match value {
                Value::Text(s) => parse_date(&s, format).map(Value::Integer),
                other => Err(Error::coercion(other, ValueType::Text)),
            },
            Codec::Prefixed { prefix } => match value {
                Value::Integer(n) => Ok(Value::Text(format!("{}{}", prefix, n))),
                other => Err(Error::coercion(other, ValueType::Integer)),
            },
            Codec::Scaled { factor } => value
                .as_f64()
                .map(|v| Value::Real(v / factor))
                .ok_or_else(|| Error::coercion(&value, ValueType::Real)),
            Codec::Custom(custom) => custom.denormalize(value),
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::DateText { format } | Codec::EpochSeconds { format } => {
                write!(f, "{}({:?})", self.name(), format)
            }
            Codec::Prefixed { prefix } => write!(f, "prefixed({:?})", prefix),
            Codec::Scaled { factor } => write!(f, "scaled({})", factor),
            other => f.write_str(other.name()),
        }
    }
}

/// Only the canonical spelling `<prefix><n>` is accepted, so that
/// denormalizing gives back the same text.
fn parse_prefixed(text: &str, prefix: &str) -> Result<i64> {
    text.strip_prefix(prefix)
        .and_then(|rest| rest.parse::<i64>().ok().filter(|n| n.to_string() == rest))
        .ok_or_else(|| Error::coercion(format!("{:?}", text), ValueType::Integer))
}

/// Text must match `format` exactly: no padding, no unpadded fields.
fn parse_date(text: &str, format: &str) -> Result<i64> {
    let secs = NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            // Date-only layouts carry no time component
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp());
    match secs {
        Some(secs) if format_date(secs, format).is_ok_and(|canonical| canonical == text) => Ok(secs),
        _ => Err(Error::coercion(format!("{:?}", text), ValueType::Integer)),
    }
}

fn format_date(secs: i64, format: &str) -> Result<String> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format(format).to_string())
        .ok_or_else(|| Error::coercion(secs, ValueType::Text))
}
