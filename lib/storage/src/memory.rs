//! In-memory tables
//!
//! Reference [`RowSource`] / [`QueryExecutor`] implementation. Rows get
//! sqlite-like integer ids on insert unless they already carry one.

use crosslink_core::{Row, RowId, TableSchema, Value};
use crosslink_query::{self as query, QueryError, QueryExecutor, RowSource, SelectQuery};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, StoreError};

/// One table: schema plus rows
#[derive(Debug)]
pub struct MemoryTable {
    schema: TableSchema,
    rows: RwLock<Vec<Row>>,
    next_id: AtomicU64,
}

impl MemoryTable {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Validate and insert local values, returning the assigned id
    pub fn insert(&self, values: Vec<Value>) -> Result<RowId> {
        let row = self.schema.row(None, values)?;
        Ok(self.insert_row(row))
    }

    /// Insert a row built from this table's schema, keeping its id if any
    pub fn insert_row(&self, row: Row) -> RowId {
        let (row, id) = match row.id().cloned() {
            Some(id) => {
                if let RowId::Integer(n) = id {
                    self.next_id.fetch_max(n + 1, Ordering::Relaxed);
                }
                (row, id)
            }
            None => {
                let id = RowId::Integer(self.next_id.fetch_add(1, Ordering::Relaxed));
                (row.with_id(id.clone()), id)
            }
        };
        self.rows.write().push(row);
        id
    }

    pub fn extend(&self, rows: impl IntoIterator<Item = Row>) -> usize {
        rows.into_iter().map(|row| self.insert_row(row)).count()
    }

    pub fn get(&self, id: &RowId) -> Option<Row> {
        self.rows.read().iter().find(|r| r.id() == Some(id)).cloned()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// Snapshot of all rows in insertion order
    pub fn snapshot(&self) -> Vec<Row> {
        self.rows.read().clone()
    }
}

impl RowSource for MemoryTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn rows(&self) -> query::Result<Vec<Row>> {
        Ok(self.snapshot())
    }
}

impl QueryExecutor for MemoryTable {
    fn execute(&self, query: &SelectQuery) -> query::Result<Vec<Row>> {
        if query.table != self.name() {
            return Err(QueryError::TableNotFound(query.table.clone()));
        }
        query::scan(self, query)
    }
}

/// Tables by name, like a database holding several of them
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Arc<MemoryTable>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, schema: TableSchema) -> Result<Arc<MemoryTable>> {
        let name = schema.name().to_string();
        let mut tables = self.tables.write();

        if tables.contains_key(&name) {
            return Err(StoreError::TableExists(name));
        }

        let table = Arc::new(MemoryTable::new(schema));
        tables.insert(name.clone(), table.clone());
        debug!(table = %name, "created table");
        Ok(table)
    }

    #[inline]
    pub fn get_table(&self, name: &str) -> Option<Arc<MemoryTable>> {
        self.tables.read().get(name).cloned()
    }

    pub fn table(&self, name: &str) -> Result<Arc<MemoryTable>> {
        self.get_table(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))
    }

    pub fn drop_table(&self, name: &str) -> bool {
        self.tables.write().remove(name).is_some()
    }

    #[must_use]
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[inline]
    #[must_use]
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }
}

impl QueryExecutor for MemoryStore {
    fn execute(&self, query: &SelectQuery) -> query::Result<Vec<Row>> {
        let table = self
            .get_table(&query.table)
            .ok_or_else(|| QueryError::TableNotFound(query.table.clone()))?;
        table.execute(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslink_core::{CommonSchema, ConditionKind, FieldDescriptor, ValueType};
    use crosslink_query::{find_duplicate_rows, find_related_rows};

    fn schemas() -> (TableSchema, TableSchema) {
        let common = Arc::new(
            CommonSchema::builder()
                .field("id", ValueType::Integer, 0.0)
                .field("name", ValueType::Text, 1.0)
                .build()
                .unwrap(),
        );
        let a = TableSchema::builder("a", common.clone())
            .field(FieldDescriptor::new("id", ValueType::Integer))
            .field(FieldDescriptor::new("name", ValueType::Text))
            .build()
            .unwrap();
        let b = TableSchema::builder("b", common)
            .field(FieldDescriptor::new("code", ValueType::Integer).common("id"))
            .field(FieldDescriptor::new("full_name", ValueType::Text).common("name").with_condition(ConditionKind::AnyWords))
            .build()
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_auto_row_ids() {
        let (a, _) = schemas();
        let table = MemoryTable::new(a.clone());
        assert_eq!(table.insert(vec![Value::Integer(1), "x".into()]).unwrap(), RowId::Integer(1));
        table.insert_row(a.row(Some(RowId::Integer(10)), vec![Value::Integer(2), "y".into()]).unwrap());
        assert_eq!(table.insert(vec![Value::Integer(3), "z".into()]).unwrap(), RowId::Integer(11));
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(&RowId::Integer(10)).unwrap()[1], Value::from("y"));
        assert!(table.insert(vec![Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_store_management() {
        let (a, b) = schemas();
        let store = MemoryStore::new();
        store.create_table(a.clone()).unwrap();
        store.create_table(b).unwrap();
        assert!(matches!(store.create_table(a), Err(StoreError::TableExists(_))));
        assert_eq!(store.list_tables(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.drop_table("a"));
        assert!(!store.table_exists("a"));
        assert!(matches!(store.table("a"), Err(StoreError::TableNotFound(_))));
    }

    #[test]
    fn test_store_executes_related_and_duplicate_queries() {
        let (a, b) = schemas();
        let store = MemoryStore::new();
        let target = store.create_table(b).unwrap();
        target.insert(vec![Value::Integer(1), "John Wick".into()]).unwrap();
        target.insert(vec![Value::Integer(2), "Helen Wick".into()]).unwrap();
        target.insert(vec![Value::Integer(3), "Jane Doe".into()]).unwrap();

        let probe = a.row(None, vec![Value::Integer(9), "john wick".into()]).unwrap();
        let related = find_related_rows(&store, &a, target.schema(), &probe).unwrap();
        assert_eq!(related.len(), 2);

        let duplicates = find_duplicate_rows(&store, &a, target.schema(), &probe).unwrap();
        assert!(duplicates.is_empty());

        let probe = a.row(None, vec![Value::Integer(9), "Jane Doe".into()]).unwrap();
        let duplicates = find_duplicate_rows(&store, &a, target.schema(), &probe).unwrap();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].id(), Some(&RowId::Integer(3)));
    }

    #[test]
    fn test_unknown_table_query() {
        let store = MemoryStore::new();
        let query = SelectQuery {
            table: "missing".to_string(),
            row_id_column: None,
            columns: Vec::new(),
            filter: crosslink_core::Condition::And(Vec::new()),
        };
        assert!(matches!(store.execute(&query), Err(QueryError::TableNotFound(_))));
    }
}
