use crosslink_core::ValueType;
use crosslink_query::QueryError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] crosslink_core::Error),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),
}

/// Session configuration could not be loaded or built
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] crosslink_core::Error),

    #[error("No comparator registered as '{0}'")]
    UnknownComparator(String),

    #[error("No codec registered as '{0}'")]
    UnknownCodec(String),

    #[error("No condition registered as '{0}'")]
    UnknownCondition(String),

    #[error("Duplicate table '{0}'")]
    DuplicateTable(String),

    #[error("Invalid check '{check}': {reason}")]
    InvalidCheck { check: String, reason: String },
}

/// Tabular import failures, kept apart from matching errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] crosslink_core::Error),

    #[error("Column '{0}' not found in header")]
    MissingColumn(String),

    #[error("Line {line}, column '{column}': cannot convert {value:?} to {expected}")]
    Coercion {
        line: u64,
        column: String,
        value: String,
        expected: ValueType,
    },

    #[error("Line {line}: expected {expected} cells, got {actual}")]
    RowLength { line: u64, expected: usize, actual: usize },
}
