//! Field descriptors: one column of one table

use std::fmt;
use std::sync::Arc;

use crate::codec::Codec;
use crate::condition::{Condition, CompareOp};
use crate::error::Result;
use crate::value::{Value, ValueType};

/// Capability interface for user supplied query conditions.
///
/// Implementations return a [`Condition`] whose columns are
/// [`crate::Column::This`]; values must only appear as parameters.
pub trait FieldCondition: Send + Sync {
    fn condition(&self, value: &Value) -> Condition;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> FieldCondition for F
where
    F: Fn(&Value) -> Condition + Send + Sync,
{
    fn condition(&self, value: &Value) -> Condition {
        self(value)
    }
}

/// How a field turns one of its values into a filter
#[derive(Clone, Default)]
pub enum ConditionKind {
    /// `field = ?`
    #[default]
    Equals,
    /// One `field LIKE %word%` per word, AND-joined
    AllWords,
    /// One `field LIKE %word%` per word, OR-joined
    AnyWords,
    /// `field LIKE %value%`
    Contains,
    Custom(Arc<dyn FieldCondition>),
}

impl ConditionKind {
    pub fn custom<C: FieldCondition + 'static>(condition: C) -> Self {
        ConditionKind::Custom(Arc::new(condition))
    }

    pub fn name(&self) -> &str {
        match self {
            ConditionKind::Equals => "equals",
            ConditionKind::AllWords => "all_words",
            ConditionKind::AnyWords => "any_words",
            ConditionKind::Contains => "contains",
            ConditionKind::Custom(custom) => custom.name(),
        }
    }

    /// Build the unbound condition for `value`
    pub fn condition(&self, value: &Value) -> Condition {
        match self {
            ConditionKind::Equals => Condition::equals(value.clone()),
            ConditionKind::AllWords | ConditionKind::AnyWords => {
                let words: Vec<&str> = value.as_str().map(|s| s.split_whitespace().collect()).unwrap_or_default();
                if words.is_empty() {
                    // Nothing to split: fall back to plain equality
                    return Condition::equals(value.clone());
                }
                let clauses = words.into_iter().map(Condition::contains).collect();
                if matches!(self, ConditionKind::AllWords) {
                    Condition::And(clauses)
                } else {
                    Condition::Or(clauses)
                }
            }
            ConditionKind::Contains => match value.as_str() {
                Some(text) => Condition::contains(text),
                None => Condition::compare(CompareOp::Eq, value.clone()),
            },
            ConditionKind::Custom(custom) => custom.condition(value),
        }
    }
}

impl fmt::Debug for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes one column: its local name, the common concept it maps to, its
/// declared type and its condition / codec behavior
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    local_name: String,
    common_name: String,
    value_type: ValueType,
    condition: ConditionKind,
    codec: Codec,
}

impl FieldDescriptor {
    /// A field whose common name equals its local name, with equality
    /// condition and identity codec
    pub fn new(local_name: impl Into<String>, value_type: ValueType) -> Self {
        let local_name = local_name.into();
        Self {
            common_name: local_name.clone(),
            local_name,
            value_type,
            condition: ConditionKind::default(),
            codec: Codec::default(),
        }
    }

    #[must_use]
    pub fn common(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: ConditionKind) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[inline]
    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    pub fn condition_kind(&self) -> &ConditionKind {
        &self.condition
    }

    #[inline]
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Local value -> common value
    pub fn normalize(&self, value: Value) -> Result<Value> {
        self.codec.normalize(value)
    }

    /// Common value -> this field's local encoding, checked against the
    /// declared type
    pub fn denormalize(&self, value: Value) -> Result<Value> {
        self.codec.denormalize(value)?.coerce(self.value_type)
    }

    /// Unbound condition for a local value of this field
    pub fn condition(&self, value: &Value) -> Condition {
        self.condition.condition(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Column;

    #[test]
    fn test_defaults() {
        let field = FieldDescriptor::new("name", ValueType::Text);
        assert_eq!(field.common_name(), "name");
        assert_eq!(field.condition_kind().name(), "equals");
        assert_eq!(field.codec().name(), "identity");
        assert_eq!(
            field.condition(&Value::from("x")),
            Condition::equals(Value::from("x"))
        );
    }

    #[test]
    fn test_all_words_splits_value() {
        let field = FieldDescriptor::new("full_name", ValueType::Text).with_condition(ConditionKind::AllWords);
        let cond = field.condition(&Value::from("John Wick"));
        assert_eq!(
            cond,
            Condition::And(vec![Condition::contains("John"), Condition::contains("Wick")])
        );
        let params: Vec<Value> = cond.params().into_iter().cloned().collect();
        assert_eq!(params, vec![Value::from("%John%"), Value::from("%Wick%")]);
    }

    #[test]
    fn test_any_words_or_joined() {
        let cond = ConditionKind::AnyWords.condition(&Value::from("a b"));
        assert!(matches!(cond, Condition::Or(ref c) if c.len() == 2));
    }

    #[test]
    fn test_words_on_blank_text_falls_back_to_equality() {
        let cond = ConditionKind::AllWords.condition(&Value::from("   "));
        assert_eq!(cond, Condition::equals(Value::from("   ")));
    }

    #[test]
    fn test_custom_condition() {
        let kind = ConditionKind::custom(|v: &Value| {
            Condition::template("lower({field}) = lower(?)", vec![v.clone()])
        });
        let cond = kind.condition(&Value::from("Ozols"));
        assert!(cond.validate("Surname").is_ok());
        assert!(matches!(cond, Condition::Template { column: Column::This, .. }));
    }

    #[test]
    fn test_denormalize_checks_declared_type() {
        let field = FieldDescriptor::new("id", ValueType::Text).with_codec(Codec::prefixed("customer_"));
        assert_eq!(field.denormalize(Value::Integer(5)).unwrap(), Value::from("customer_5"));
        assert_eq!(field.normalize(Value::from("customer_5")).unwrap(), Value::Integer(5));

        let plain = FieldDescriptor::new("id", ValueType::Integer);
        assert!(plain.denormalize(Value::from("abc")).is_err());
    }
}
