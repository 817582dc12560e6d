use ahash::AHashMap;
use std::sync::Arc;

use crate::common::CommonSchema;
use crate::error::{Error, Result};
use crate::field::FieldDescriptor;
use crate::row::{Row, RowId};
use crate::value::{Value, ValueType};

/// Column holding the storage assigned row identifier, sqlite style
pub const DEFAULT_ROW_ID_COLUMN: &str = "rowid";

/// Configuration of one table: its fields in row order plus the reverse
/// mapping from common concept to local field
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    row_id_column: String,
    fields: Vec<FieldDescriptor>,
    types: Vec<ValueType>,
    local_index: AHashMap<String, usize>,
    common_index: AHashMap<String, usize>,
    /// Field position -> position in common row order
    common_positions: Vec<usize>,
    common: Arc<CommonSchema>,
}

impl TableSchema {
    pub fn builder(name: impl Into<String>, common: Arc<CommonSchema>) -> TableSchemaBuilder {
        TableSchemaBuilder {
            name: name.into(),
            row_id_column: DEFAULT_ROW_ID_COLUMN.to_string(),
            fields: Vec::new(),
            common,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn row_id_column(&self) -> &str {
        &self.row_id_column
    }

    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
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

    #[inline]
    pub fn common(&self) -> &Arc<CommonSchema> {
        &self.common
    }

    /// Whether both tables translate through the same common schema
    pub fn shares_common(&self, other: &TableSchema) -> bool {
        Arc::ptr_eq(&self.common, &other.common)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(FieldDescriptor::local_name)
    }

    #[inline]
    pub fn position(&self, local_name: &str) -> Option<usize> {
        self.local_index.get(local_name).copied()
    }

    pub fn field(&self, local_name: &str) -> Option<&FieldDescriptor> {
        self.position(local_name).map(|i| &self.fields[i])
    }

    /// Position of the field mapped to a common concept
    #[inline]
    pub fn position_for(&self, common_name: &str) -> Option<usize> {
        self.common_index.get(common_name).copied()
    }

    pub fn field_for(&self, common_name: &str) -> Option<&FieldDescriptor> {
        self.position_for(common_name).map(|i| &self.fields[i])
    }

    pub fn local_name_for(&self, common_name: &str) -> Option<&str> {
        self.field_for(common_name).map(FieldDescriptor::local_name)
    }

    /// Build a local row, validating arity and declared types
    pub fn row(&self, id: Option<RowId>, values: Vec<Value>) -> Result<Row> {
        Row::typed(id, values, &self.types)
    }

    /// Translate a local row into common row order.
    ///
    /// Concepts this table has no field for are `Null`. The row id is kept.
    pub fn normalize(&self, row: &Row) -> Result<Row> {
        if row.len() != self.fields.len() {
            return Err(Error::RowShape {
                expected: self.fields.len(),
                actual: row.len(),
            });
        }

        let common_fields = self.common.fields();
        let mut values = vec![Value::Null; common_fields.len()];
        for ((field, value), &pos) in self.fields.iter().zip(row.values()).zip(&self.common_positions) {
            values[pos] = field
                .normalize(value.clone())?
                .coerce(common_fields[pos].value_type())?;
        }
        Ok(Row::trusted(row.id().cloned(), values))
    }

    /// Translate a common row into this table's local encoding
    pub fn denormalize(&self, common_row: &Row) -> Result<Row> {
        if common_row.len() != self.common.len() {
            return Err(Error::RowShape {
                expected: self.common.len(),
                actual: common_row.len(),
            });
        }

        let values = self
            .fields
            .iter()
            .zip(&self.common_positions)
            .map(|(field, &pos)| field.denormalize(common_row[pos].clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::trusted(common_row.id().cloned(), values))
    }
}

/// Builder for [`TableSchema`]
#[derive(Debug)]
pub struct TableSchemaBuilder {
    name: String,
    row_id_column: String,
    fields: Vec<FieldDescriptor>,
    common: Arc<CommonSchema>,
}

impl TableSchemaBuilder {
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    #[must_use]
    pub fn row_id_column(mut self, column: impl Into<String>) -> Self {
        self.row_id_column = column.into();
        self
    }

    /// Validate and build.
    ///
    /// Fails when a field references an unknown common concept, when two
    /// fields share a local name or a common concept, or when a codec can
    /// statically never produce the concept's type.
    pub fn build(self) -> Result<TableSchema> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidSchema("table name cannot be empty".to_string()));
        }
        if self.fields.is_empty() {
            return Err(Error::InvalidSchema(format!("table '{}' has no fields", self.name)));
        }

        let mut local_index = AHashMap::with_capacity(self.fields.len());
        let mut common_index = AHashMap::with_capacity(self.fields.len());
        let mut common_positions = Vec::with_capacity(self.fields.len());

        for (i, field) in self.fields.iter().enumerate() {
            if local_index.insert(field.local_name().to_string(), i).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "duplicate field '{}' in table '{}'",
                    field.local_name(),
                    self.name
                )));
            }

            let pos = self.common.position(field.common_name()).ok_or_else(|| {
                Error::SchemaMismatch(format!(
                    "field '{}.{}' references unknown common concept '{}'",
                    self.name,
                    field.local_name(),
                    field.common_name()
                ))
            })?;

            if common_index.insert(field.common_name().to_string(), i).is_some() {
                return Err(Error::InvalidSchema(format!(
                    "common concept '{}' is mapped twice in table '{}'",
                    field.common_name(),
                    self.name
                )));
            }

            field.codec().validate()?;
            let concept_type = self.common.fields()[pos].value_type();
            if let Some(produced) = field.codec().common_type(field.value_type()) {
                let widening = produced == ValueType::Integer && concept_type == ValueType::Real;
                if produced != concept_type && !widening {
                    return Err(Error::InvalidSchema(format!(
                        "field '{}.{}' produces {} but concept '{}' is {}",
                        self.name,
                        field.local_name(),
                        produced,
                        field.common_name(),
                        concept_type
                    )));
                }
            }

            common_positions.push(pos);
        }

        let types = self.fields.iter().map(FieldDescriptor::value_type).collect();
        Ok(TableSchema {
            name: self.name,
            row_id_column: self.row_id_column,
            fields: self.fields,
            types,
            local_index,
            common_index,
            common_positions,
            common: self.common,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, DEFAULT_DATE_FORMAT};

    fn common() -> Arc<CommonSchema> {
        Arc::new(
            CommonSchema::builder()
                .field("id", ValueType::Integer, 1.0)
                .field("name", ValueType::Text, 1.0)
                .field("date", ValueType::Integer, 0.0)
                .build()
                .unwrap(),
        )
    }

    fn example1(common: Arc<CommonSchema>) -> TableSchema {
        TableSchema::builder("example1", common)
            .field(FieldDescriptor::new("id", ValueType::Text).with_codec(Codec::prefixed("customer_")))
            .field(FieldDescriptor::new("name", ValueType::Text))
            .field(
                FieldDescriptor::new("created_date", ValueType::Text)
                    .common("date")
                    .with_codec(Codec::date_text(DEFAULT_DATE_FORMAT)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_reverse_mapping() {
        let table = example1(common());
        assert_eq!(table.local_name_for("date"), Some("created_date"));
        assert_eq!(table.position("name"), Some(1));
        assert!(table.field_for("missing").is_none());
        assert_eq!(table.row_id_column(), "rowid");
    }

    #[test]
    fn test_normalize_and_denormalize_round_trip() {
        let table = example1(common());
        let row = table
            .row(
                Some(RowId::Integer(1)),
                vec!["customer_0".into(), "Victor Fernandez".into(), "2021-01-18 15:10:47".into()],
            )
            .unwrap();

        let normalized = table.normalize(&row).unwrap();
        assert_eq!(
            normalized.values(),
            &[Value::Integer(0), Value::from("Victor Fernandez"), Value::Integer(1_610_982_647)]
        );
        assert_eq!(normalized.id(), Some(&RowId::Integer(1)));

        let back = table.denormalize(&normalized).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_normalize_reorders_to_common_order() {
        let common = common();
        let table = TableSchema::builder("reordered", common)
            .field(FieldDescriptor::new("date", ValueType::Integer))
            .field(FieldDescriptor::new("name", ValueType::Text))
            .build()
            .unwrap();
        let row = table.row(None, vec![Value::Integer(5), "x".into()]).unwrap();
        let normalized = table.normalize(&row).unwrap();
        assert_eq!(normalized.values(), &[Value::Null, Value::from("x"), Value::Integer(5)]);
    }

    #[test]
    fn test_dangling_common_name() {
        let result = TableSchema::builder("t", common())
            .field(FieldDescriptor::new("surname", ValueType::Text))
            .build();
        assert!(matches!(result, Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn test_common_concept_mapped_twice() {
        let result = TableSchema::builder("t", common())
            .field(FieldDescriptor::new("name", ValueType::Text))
            .field(FieldDescriptor::new("full_name", ValueType::Text).common("name"))
            .build();
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_duplicate_local_name() {
        let result = TableSchema::builder("t", common())
            .field(FieldDescriptor::new("name", ValueType::Text))
            .field(FieldDescriptor::new("name", ValueType::Text).common("id"))
            .build();
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_static_type_mismatch() {
        let result = TableSchema::builder("t", common())
            .field(FieldDescriptor::new("name", ValueType::Integer))
            .build();
        assert!(matches!(result, Err(Error::InvalidSchema(_))));
    }

    #[test]
    fn test_normalize_reports_coercion() {
        let table = example1(common());
        let row = table
            .row(None, vec!["client_1".into(), "x".into(), Value::Null])
            .unwrap();
        assert!(matches!(table.normalize(&row), Err(Error::TypeCoercion { .. })));
    }
}
