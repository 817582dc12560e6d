//! Common schema definitions
//!
//! The shared vocabulary both tables are translated into. Each concept has a
//! canonical type, a relevance weight and a comparator.

use ahash::AHashMap;

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::row::{Row, RowId};
use crate::value::{Value, ValueType};

/// A single concept of the common schema
#[derive(Debug, Clone)]
pub struct CommonField {
    name: String,
    value_type: ValueType,
    weight: f64,
    comparator: Comparator,
}

impl CommonField {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn comparator(&self) -> &Comparator {
        &self.comparator
    }

    /// Weight 0 concepts are carried for context only
    #[inline]
    pub fn is_relevant(&self) -> bool {
        self.weight > 0.0
    }
}

/// Ordered set of common concepts.
///
/// Constructed once per cross-check session and shared by reference between
/// all tables involved; read-only afterwards.
#[derive(Debug, Clone)]
pub struct CommonSchema {
    fields: Vec<CommonField>,
    types: Vec<ValueType>,
    index: AHashMap<String, usize>,
}

impl CommonSchema {
    pub fn builder() -> CommonSchemaBuilder {
        CommonSchemaBuilder::default()
    }

    #[inline]
    pub fn fields(&self) -> &[CommonField] {
        &self.fields
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a concept in common row order
    #[inline]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&CommonField> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// Concept names in row order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Concepts with weight > 0, with their positions
    pub fn relevant(&self) -> impl Iterator<Item = (usize, &CommonField)> {
        self.fields.iter().enumerate().filter(|(_, f)| f.is_relevant())
    }

    /// Sum of all weights, the score of two identical complete rows
    pub fn total_weight(&self) -> f64 {
        self.fields.iter().map(|f| f.weight).sum()
    }

    /// Build a common-encoded row, validating arity and types
    pub fn row(&self, values: Vec<Value>) -> Result<Row> {
        Row::typed(None, values, &self.types)
    }

    pub fn row_with_id(&self, id: RowId, values: Vec<Value>) -> Result<Row> {
        Row::typed(Some(id), values, &self.types)
    }

    /// Weighted similarity of two common-encoded rows.
    ///
    /// Sums `comparator(a, b) * weight` over concepts with weight > 0. Weight 0
    /// concepts are skipped without evaluating their comparator, and a pair
    /// where either side is missing contributes nothing.
    pub fn weighted_similarity(&self, a: &Row, b: &Row) -> f64 {
        debug_assert_eq!(a.len(), self.len());
        debug_assert_eq!(b.len(), self.len());

        let mut total = 0.0;
        for (i, field) in self.relevant() {
            if let Some(score) = self.field_similarity(i, field, a, b) {
                total += score * field.weight;
            }
        }
        total
    }

    /// Unweighted comparator score of concept `i`, `None` when skipped
    pub fn field_similarity(&self, i: usize, field: &CommonField, a: &Row, b: &Row) -> Option<f64> {
        match (a.get(i), b.get(i)) {
            (Some(x), Some(y)) if !x.is_null() && !y.is_null() => Some(field.comparator.compare(x, y)),
            _ => None,
        }
    }
}

/// Builder for [`CommonSchema`]
#[derive(Debug, Default)]
pub struct CommonSchemaBuilder {
    fields: Vec<CommonField>,
}

impl CommonSchemaBuilder {
    /// Add a concept compared by exact equality
    #[must_use]
    pub fn field(self, name: impl Into<String>, value_type: ValueType, weight: f64) -> Self {
        self.field_with(name, value_type, weight, Comparator::default())
    }

    #[must_use]
    pub fn field_with(
        mut self,
        name: impl Into<String>,
        value_type: ValueType,
        weight: f64,
        comparator: Comparator,
    ) -> Self {
        self.fields.push(CommonField {
            name: name.into(),
            value_type,
            weight,
            comparator,
        });
        self
    }

    /// Validate the schema
    /// - at least one concept
    /// - unique concept names
    /// - weights within [0, 1]
    pub fn build(self) -> Result<CommonSchema> {
        if self.fields.is_empty() {
            return Err(Error::InvalidSchema("common schema cannot be empty".to_string()));
        }

        let mut index = AHashMap::with_capacity(self.fields.len());
        for (i, field) in self.fields.iter().enumerate() {
            if !(0.0..=1.0).contains(&field.weight) {
                return Err(Error::InvalidSchema(format!(
                    "weight of '{}' must be within [0, 1], got {}",
                    field.name, field.weight
                )));
            }
            if index.insert(field.name.clone(), i).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "duplicate common concept '{}'",
                    field.name
                )));
            }
        }

        let types = self.fields.iter().map(|f| f.value_type).collect();
        Ok(CommonSchema {
            fields: self.fields,
            types,
            index,
        })
    }
}
