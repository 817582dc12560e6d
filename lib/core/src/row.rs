use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::value::{Value, ValueType};

/// Stable, storage assigned row identifier.
///
/// Carried next to the values, never compared as part of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Integer(u64),
    Uuid(Uuid),
    Text(String),
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::Integer(i) => write!(f, "{}", i),
            RowId::Uuid(u) => write!(f, "{}", u),
            RowId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for RowId {
    fn from(i: u64) -> Self {
        RowId::Integer(i)
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId::Text(s)
    }
}

impl From<Uuid> for RowId {
    fn from(u: Uuid) -> Self {
        RowId::Uuid(u)
    }
}

/// A fixed-arity record of typed values.
///
/// Rows are only built through a schema ([`crate::TableSchema::row`] or
/// [`crate::CommonSchema::row`]), which checks length and slot types once so
/// positional access never has to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RowId>,
    values: Vec<Value>,
}

impl Row {
    /// Validate `values` against `types` and build the row
    pub(crate) fn typed(id: Option<RowId>, values: Vec<Value>, types: &[ValueType]) -> Result<Self> {
        if values.len() != types.len() {
            return Err(Error::RowShape {
                expected: types.len(),
                actual: values.len(),
            });
        }
        for (value, ty) in values.iter().zip(types) {
            if !value.conforms_to(*ty) {
                return Err(Error::coercion(value, *ty));
            }
        }
        Ok(Self { id, values })
    }

    /// Build a row whose values are already known to match their shape
    pub(crate) fn trusted(id: Option<RowId>, values: Vec<Value>) -> Self {
        Self { id, values }
    }

    #[inline]
    pub fn id(&self) -> Option<&RowId> {
        self.id.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: RowId) -> Self {
        self.id = Some(id);
        self
    }

    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl std::ops::Index<usize> for Row {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}
