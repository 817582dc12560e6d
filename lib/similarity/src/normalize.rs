//! Collection normalization
//!
//! Translates a whole table into common form before any similarity work.
//! A row that fails to decode is reported and left out; the rest of the
//! collection is still processed.

use crosslink_core::{Row, TableSchema};
use tracing::{debug, warn};

use crate::error::RowError;

#[derive(Debug, Clone, Default)]
pub struct NormalizedRows {
    /// Successfully normalized rows, in input order
    pub rows: Vec<Row>,
    /// Input position of each entry of `rows`
    pub indices: Vec<usize>,
    pub errors: Vec<RowError>,
}

impl NormalizedRows {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Input position of normalized row `i`
    #[inline]
    pub fn source_index(&self, i: usize) -> Option<usize> {
        self.indices.get(i).copied()
    }
}

pub fn normalize_rows(table: &TableSchema, rows: &[Row]) -> NormalizedRows {
    let mut out = NormalizedRows {
        rows: Vec::with_capacity(rows.len()),
        indices: Vec::with_capacity(rows.len()),
        errors: Vec::new(),
    };

    for (index, row) in rows.iter().enumerate() {
        match table.normalize(row) {
            Ok(normalized) => {
                out.rows.push(normalized);
                out.indices.push(index);
            }
            Err(error) => {
                warn!(table = table.name(), index, %error, "skipping row that failed to normalize");
                out.errors.push(RowError {
                    index,
                    row_id: row.id().cloned(),
                    error,
                });
            }
        }
    }

    debug!(
        table = table.name(),
        normalized = out.rows.len(),
        failed = out.errors.len(),
        "normalized rows"
    );
    out
}
