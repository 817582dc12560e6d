use crosslink_core::RowId;
use thiserror::Error;

/// A row of a collection that could not be normalized.
///
/// Reported next to the rows that could, never instead of them.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("row {index}{}: {error}", .row_id.as_ref().map(|id| format!(" (id {})", id)).unwrap_or_default())]
pub struct RowError {
    /// Position in the input collection
    pub index: usize,
    pub row_id: Option<RowId>,
    #[source]
    pub error: crosslink_core::Error,
}
