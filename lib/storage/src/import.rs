//! CSV import
//!
//! Reads delimited text into rows of a table schema. Every cell is read as
//! text and converted to the field's declared type; conversion failures name
//! the line and column.

use crosslink_core::{Row, RowId, TableSchema, Value};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::ImportError;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub delimiter: u8,
    /// Map columns by header name; otherwise cells are taken in field order
    pub has_headers: bool,
    /// Cell contents read as a missing value
    pub null_values: Vec<String>,
    /// Header of a column holding row ids
    pub id_column: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            null_values: vec![String::new()],
            id_column: None,
        }
    }
}

impl ImportOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    #[must_use]
    pub fn without_headers(mut self) -> Self {
        self.has_headers = false;
        self
    }
}

pub fn import_csv<R: Read>(reader: R, table: &TableSchema, options: &ImportOptions) -> Result<Vec<Row>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .flexible(true)
        .from_reader(reader);

    let (positions, id_position) = if options.has_headers {
        let headers = reader.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
        };
        let positions = table
            .column_names()
            .map(&find)
            .collect::<Result<Vec<_>, _>>()?;
        let id_position = options.id_column.as_deref().map(&find).transpose()?;
        (positions, id_position)
    } else {
        ((0..table.len()).collect(), None)
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());

        let needed = positions.iter().chain(id_position.iter()).max().map_or(0, |m| m + 1);
        if record.len() < needed {
            return Err(ImportError::RowLength {
                line,
                expected: needed,
                actual: record.len(),
            });
        }

        let mut values = Vec::with_capacity(positions.len());
        for (field, &pos) in table.fields().iter().zip(&positions) {
            let cell = &record[pos];
            if options.null_values.iter().any(|n| n == cell) {
                values.push(Value::Null);
                continue;
            }
            let value = Value::from(cell)
                .coerce(field.value_type())
                .map_err(|_| ImportError::Coercion {
                    line,
                    column: field.local_name().to_string(),
                    value: cell.to_string(),
                    expected: field.value_type(),
                })?;
            values.push(value);
        }

        let id = id_position.map(|pos| parse_row_id(&record[pos]));
        rows.push(table.row(id, values)?);
    }

    debug!(table = table.name(), rows = rows.len(), "imported csv");
    Ok(rows)
}

pub fn import_csv_path(path: impl AsRef<Path>, table: &TableSchema, options: &ImportOptions) -> Result<Vec<Row>, ImportError> {
    let file = File::open(path)?;
    import_csv(file, table, options)
}

fn parse_row_id(cell: &str) -> RowId {
    let cell = cell.trim();
    match cell.parse::<u64>() {
        Ok(n) => RowId::Integer(n),
        Err(_) => RowId::Text(cell.to_string()),
    }
}
