//! # Crosslink Query
//!
//! Builds parameterized queries that look up, in a target table, the rows
//! related to (or duplicating) a row of a source table.
//!
//! - [`related_rows_query`] / [`duplicates_query`] - the condition builder
//! - [`SelectQuery::render`] - SQL text with `?` or `$n` markers
//! - [`CompiledFilter`] - in-memory evaluation of the same queries
//! - [`QueryExecutor`] / [`RowSource`] - the seams to real storage

pub mod error;
pub mod query;
pub mod builder;
pub mod filter;
pub mod executor;

pub use error::{QueryError, Result};
pub use query::{quote_ident, Dialect, ParameterizedQuery, SelectQuery};
pub use builder::{duplicates_query, related_rows_query};
pub use filter::{like, CompiledFilter, Filter};
pub use executor::{find_duplicate_rows, find_related_rows, scan, QueryExecutor, RowSource, ScanExecutor};
