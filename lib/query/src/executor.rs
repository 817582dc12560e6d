//! Execution seams
//!
//! The builder only produces queries. Running them belongs to a collaborator:
//! a SQL backend renders the [`SelectQuery`] in its dialect, an in-memory
//! table evaluates it with [`CompiledFilter`]. Collaborator errors are
//! surfaced unchanged.

use crosslink_core::{Row, TableSchema};
use tracing::{debug, instrument};

use crate::builder::{duplicates_query, related_rows_query};
use crate::error::{QueryError, Result};
use crate::filter::{CompiledFilter, Filter};
use crate::query::SelectQuery;

/// A table whose rows can be enumerated
pub trait RowSource {
    fn schema(&self) -> &TableSchema;

    /// All rows in storage order
    fn rows(&self) -> Result<Vec<Row>>;
}

/// Runs select queries and returns the matching rows, ids included
pub trait QueryExecutor {
    fn execute(&self, query: &SelectQuery) -> Result<Vec<Row>>;
}

/// Executes queries against a single [`RowSource`] by scanning it
#[derive(Debug)]
pub struct ScanExecutor<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: RowSource + ?Sized> ScanExecutor<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }
}

impl<S: RowSource + ?Sized> QueryExecutor for ScanExecutor<'_, S> {
    fn execute(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let schema = self.source.schema();
        if query.table != schema.name() {
            return Err(QueryError::TableNotFound(query.table.clone()));
        }
        scan(self.source, query)
    }
}

/// Filter every row of `source` through the query's condition
pub fn scan<S: RowSource + ?Sized>(source: &S, query: &SelectQuery) -> Result<Vec<Row>> {
    query.validate()?;
    let filter = CompiledFilter::compile(&query.filter, source.schema())?;
    let rows: Vec<Row> = source
        .rows()?
        .into_iter()
        .filter(|row| filter.matches(row))
        .collect();
    debug!(table = %query.table, matched = rows.len(), "scanned table");
    Ok(rows)
}

/// Rows of `target` related to `row` of `source`
#[instrument(level = "debug", skip_all, fields(source = source.name(), target = target.name()))]
pub fn find_related_rows<E: QueryExecutor + ?Sized>(
    executor: &E,
    source: &TableSchema,
    target: &TableSchema,
    row: &Row,
) -> Result<Vec<Row>> {
    let query = related_rows_query(source, target, row)?;
    query.validate()?;
    executor.execute(&query)
}

/// Rows of `target` exactly equal to `row` of `source` on every relevant
/// concept
#[instrument(level = "debug", skip_all, fields(source = source.name(), target = target.name()))]
pub fn find_duplicate_rows<E: QueryExecutor + ?Sized>(
    executor: &E,
    source: &TableSchema,
    target: &TableSchema,
    row: &Row,
) -> Result<Vec<Row>> {
    let query = duplicates_query(source, target, row)?;
    query.validate()?;
    executor.execute(&query)
}
