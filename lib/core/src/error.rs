use thiserror::Error;

use crate::value::ValueType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A referenced common concept or local field does not exist
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Arity mismatch in condition for '{field}': template has {expected} placeholders, got {actual} values")]
    ArityMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot convert {value} to {expected}")]
    TypeCoercion { value: String, expected: ValueType },

    #[error("Invalid condition template for '{field}': {reason}")]
    InvalidTemplate { field: String, reason: String },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid row shape: expected {expected} values, got {actual}")]
    RowShape { expected: usize, actual: usize },
}

impl Error {
    pub(crate) fn coercion(value: impl std::fmt::Display, expected: ValueType) -> Self {
        Error::TypeCoercion {
            value: value.to_string(),
            expected,
        }
    }
}
