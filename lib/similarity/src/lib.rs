//! # Crosslink Similarity
//!
//! Weighted similarity and duplicate search over in-memory collections of
//! common-normalized rows.
//!
//! ## Features
//!
//! - **Normalization**: whole-table translation with per-row error reports
//! - **Similarity search**: threshold search against a probe, all-pairs scan
//!   with rayon parallelism and a deadline
//! - **Duplicates**: exact equality on relevant concepts, comparator free
//! - **Explainability**: per-concept contribution breakdown
//!
//! ## Example
//!
//! ```rust
//! use crosslink_core::{CommonSchema, Comparator, Value, ValueType};
//! use crosslink_similarity::{find_duplicates, find_similar};
//!
//! let common = CommonSchema::builder()
//!     .field("id", ValueType::Integer, 0.0)
//!     .field_with("name", ValueType::Text, 0.6, Comparator::TokenSet)
//!     .field_with("date", ValueType::Text, 0.4, Comparator::DayProximity { penalty_per_day: 0.1 })
//!     .build()
//!     .unwrap();
//!
//! let rows = vec![
//!     common.row(vec![Value::Integer(1), "John Wick".into(), "2021-01-18".into()]).unwrap(),
//!     common.row(vec![Value::Integer(2), "John Wick".into(), "2021-01-19".into()]).unwrap(),
//! ];
//!
//! let similar = find_similar(&rows, &rows[0], &common, 0.9);
//! assert_eq!(similar.len(), 2);
//! assert!((similar[1].score - 0.96).abs() < 1e-9);
//!
//! assert_eq!(find_duplicates(&rows, &rows[0], &common).len(), 1);
//! ```

pub mod error;
pub mod normalize;
pub mod search;
pub mod duplicates;
pub mod explain;

pub use error::RowError;
pub use normalize::{normalize_rows, NormalizedRows};
pub use search::{
    find_all_similar, find_all_similar_with, find_similar, ScanOptions, ScanOutcome, SimilarGroup, SimilarMatch,
    SimilarRow,
};
pub use duplicates::{find_duplicates, group_duplicates};
pub use explain::{explain, Contribution, ExplainedRow, Explanation, SimilarityStats};
