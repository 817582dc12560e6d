//! Condition builder
//!
//! Turns one row of a source table into a query against a target table. The
//! row is normalized into common form, each relevant concept is denormalized
//! into the target's encoding and the target field's condition produces the
//! clause for it.
//!
//! Two independent modes:
//! - related rows: each relevant field's own condition, OR-joined (recall)
//! - duplicates: exact equality on each relevant field, AND-joined

use crosslink_core::{Condition, Error as CoreError, FieldDescriptor, Row, TableSchema, Value};
use tracing::debug;

use crate::error::Result;
use crate::query::SelectQuery;

/// Query for rows of `target` related to `row` of `source`: any relevant
/// field matching is enough
pub fn related_rows_query(source: &TableSchema, target: &TableSchema, row: &Row) -> Result<SelectQuery> {
    let clauses = relevant_target_values(source, target, row)?
        .into_iter()
        .map(|(field, value)| bound_clause(field, field.condition(&value)))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        source = source.name(),
        target = target.name(),
        clauses = clauses.len(),
        "built related rows query"
    );
    Ok(select_all(target, Condition::Or(clauses)))
}

/// Query for rows of `target` equal to `row` of `source` on every relevant
/// field. Field conditions are ignored; missing probe values are not filtered
/// on.
pub fn duplicates_query(source: &TableSchema, target: &TableSchema, row: &Row) -> Result<SelectQuery> {
    let clauses = relevant_target_values(source, target, row)?
        .into_iter()
        .map(|(field, value)| bound_clause(field, Condition::equals(value)))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        source = source.name(),
        target = target.name(),
        clauses = clauses.len(),
        "built duplicates query"
    );
    Ok(select_all(target, Condition::And(clauses)))
}

fn bound_clause(field: &FieldDescriptor, condition: Condition) -> Result<Condition> {
    let bound = condition.bind(field.local_name());
    bound.validate(field.local_name())?;
    Ok(bound)
}

fn select_all(target: &TableSchema, filter: Condition) -> SelectQuery {
    SelectQuery {
        table: target.name().to_string(),
        row_id_column: Some(target.row_id_column().to_string()),
        columns: target.column_names().map(str::to_string).collect(),
        filter,
    }
}

/// Translate `row` into target-local values for every relevant concept the
/// probe carries, skipping missing ones
fn relevant_target_values<'t>(
    source: &TableSchema,
    target: &'t TableSchema,
    row: &Row,
) -> Result<Vec<(&'t FieldDescriptor, Value)>> {
    if !source.shares_common(target) {
        return Err(CoreError::SchemaMismatch(format!(
            "tables '{}' and '{}' use different common schemas",
            source.name(),
            target.name()
        ))
        .into());
    }

    for field in source.fields() {
        if target.field_for(field.common_name()).is_none() {
            return Err(CoreError::SchemaMismatch(format!(
                "table '{}' has no field for common concept '{}' of '{}.{}'",
                target.name(),
                field.common_name(),
                source.name(),
                field.local_name()
            ))
            .into());
        }
    }

    let common_row = source.normalize(row)?;
    let mut values = Vec::new();
    for (pos, concept) in source.common().relevant() {
        let Some(field) = target.field_for(concept.name()) else {
            continue;
        };
        let value = field.denormalize(common_row[pos].clone())?;
        if value.is_null() {
            continue;
        }
        values.push((field, value));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::query::Dialect;
    use crosslink_core::{Codec, CommonSchema, ConditionKind, ValueType, DEFAULT_DATE_FORMAT};
    use std::sync::Arc;

    fn common(date_weight: f64) -> Arc<CommonSchema> {
        Arc::new(
            CommonSchema::builder()
                .field("id", ValueType::Integer, 0.0)
                .field("name", ValueType::Text, 0.6)
                .field("date", ValueType::Integer, date_weight)
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

    fn example2(common: Arc<CommonSchema>) -> TableSchema {
        TableSchema::builder("example2", common)
            .field(FieldDescriptor::new("id", ValueType::Integer))
            .field(FieldDescriptor::new("full_name", ValueType::Text).common("name").with_condition(ConditionKind::AllWords))
            .field(FieldDescriptor::new("date", ValueType::Integer))
            .build()
            .unwrap()
    }

    #[test]
    fn test_related_rows_query_or_joins_relevant_fields() {
        let common = common(0.4);
        let t1 = example1(common.clone());
        let t2 = example2(common);
        let row = t1
            .row(None, vec!["customer_3".into(), "John Wick".into(), "2021-01-18 15:10:47".into()])
            .unwrap();

        let query = related_rows_query(&t1, &t2, &row).unwrap();
        let rendered = query.render(Dialect::Sqlite).unwrap();
        assert_eq!(
            rendered.sql(),
            "SELECT \"rowid\", \"id\", \"full_name\", \"date\" FROM \"example2\" WHERE \
             (\"full_name\" LIKE ? ESCAPE '\\' AND \"full_name\" LIKE ? ESCAPE '\\') OR \"date\" = ?"
        );
        assert_eq!(
            rendered.params(),
            &[
                Value::from("%John%"),
                Value::from("%Wick%"),
                Value::Integer(1_610_982_647)
            ]
        );
    }

    #[test]
    fn test_weight_zero_concepts_are_not_queried() {
        let common = common(0.0);
        let t1 = example1(common.clone());
        let t2 = example2(common);
        let row = t1
            .row(None, vec!["customer_3".into(), "Ann".into(), "2021-01-18 15:10:47".into()])
            .unwrap();
        let query = related_rows_query(&t1, &t2, &row).unwrap();
        assert_eq!(query.params(), vec![Value::from("%Ann%")]);
    }

    #[test]
    fn test_missing_probe_values_are_skipped() {
        let common = common(0.4);
        let t1 = example1(common.clone());
        let t2 = example2(common);
        let row = t1
            .row(None, vec![Value::Null, Value::Null, "2021-01-18 15:10:47".into()])
            .unwrap();
        let query = related_rows_query(&t1, &t2, &row).unwrap();
        assert_eq!(query.params(), vec![Value::Integer(1_610_982_647)]);
    }

    #[test]
    fn test_duplicates_query_uses_exact_and() {
        let common = common(0.4);
        let t1 = example1(common.clone());
        let t2 = example2(common);
        let row = t1
            .row(None, vec!["customer_3".into(), "John Wick".into(), "2021-01-18 15:10:47".into()])
            .unwrap();

        let rendered = duplicates_query(&t1, &t2, &row)
            .unwrap()
            .render(Dialect::Sqlite)
            .unwrap();
        assert!(rendered.sql().ends_with("WHERE \"full_name\" = ? AND \"date\" = ?"));
        assert_eq!(
            rendered.params(),
            &[Value::from("John Wick"), Value::Integer(1_610_982_647)]
        );
    }

    #[test]
    fn test_missing_target_field_is_schema_mismatch() {
        let common = common(0.4);
        let t1 = example1(common.clone());
        let t2 = TableSchema::builder("partial", common)
            .field(FieldDescriptor::new("name", ValueType::Text))
            .build()
            .unwrap();
        let row = t1
            .row(None, vec!["customer_3".into(), "x".into(), Value::Null])
            .unwrap();
        assert!(matches!(
            related_rows_query(&t1, &t2, &row),
            Err(QueryError::Core(CoreError::SchemaMismatch(_)))
        ));
    }

    #[test]
    fn test_different_common_schemas_rejected() {
        let t1 = example1(common(0.4));
        let t2 = example2(common(0.4));
        let row = t1
            .row(None, vec!["customer_3".into(), "x".into(), Value::Null])
            .unwrap();
        assert!(matches!(
            duplicates_query(&t1, &t2, &row),
            Err(QueryError::Core(CoreError::SchemaMismatch(_)))
        ));
    }

    #[test]
    fn test_custom_condition_arity_mismatch() {
        let common = common(0.0);
        let t1 = TableSchema::builder("a", common.clone())
            .field(FieldDescriptor::new("name", ValueType::Text))
            .build()
            .unwrap();
        let t2 = TableSchema::builder("b", common)
            .field(FieldDescriptor::new("name", ValueType::Text).with_condition(ConditionKind::custom(
                |v: &Value| Condition::template("{field} LIKE ? OR {field} LIKE ?", vec![v.clone()]),
            )))
            .build()
            .unwrap();
        let row = t1.row(None, vec!["x".into()]).unwrap();
        assert!(matches!(
            related_rows_query(&t1, &t2, &row),
            Err(QueryError::Core(CoreError::ArityMismatch { expected: 2, actual: 1, .. }))
        ));
    }

    #[test]
    fn test_wrong_row_shape() {
        let common = common(0.4);
        let t1 = example1(common.clone());
        let t2 = example2(common.clone());
        let foreign = t2.row(None, vec![Value::Integer(1), "x".into(), Value::Null]).unwrap();
        // Same arity, but the id slot does not decode with t1's codec
        assert!(related_rows_query(&t1, &t2, &foreign).is_err());
    }
}
