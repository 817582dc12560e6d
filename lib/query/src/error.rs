use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error(transparent)]
    Core(#[from] crosslink_core::Error),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Condition column was never bound to a field name")]
    UnboundColumn,

    #[error("Condition cannot be evaluated in memory: {0}")]
    UnsupportedInMemory(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Failure reported by the execution collaborator, passed through as is
    #[error(transparent)]
    Execution(Box<dyn std::error::Error + Send + Sync>),
}

impl QueryError {
    pub fn execution<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        QueryError::Execution(error.into())
    }
}
