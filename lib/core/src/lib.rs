//! # Crosslink Core
//!
//! Core library for cross-checking records that live in two tables with
//! different schemas and value encodings.
//!
//! This crate provides the fundamental data structures:
//!
//! - [`Value`] / [`Row`] - typed scalar values and schema-validated rows
//! - [`FieldDescriptor`] - one column: local name, common name, type, condition and codec
//! - [`CommonSchema`] - the shared vocabulary with relevance weights and comparators
//! - [`TableSchema`] - a table's fields plus the reverse common -> local mapping
//! - [`Condition`] - filter AST produced by field conditions
//!
//! ## Example
//!
//! ```rust
//! use crosslink_core::{Codec, CommonSchema, Comparator, FieldDescriptor, TableSchema, Value, ValueType};
//! use std::sync::Arc;
//!
//! let common = Arc::new(
//!     CommonSchema::builder()
//!         .field("id", ValueType::Integer, 0.0)
//!         .field("name", ValueType::Text, 0.6)
//!         .field_with("date", ValueType::Integer, 0.4, Comparator::DayProximity { penalty_per_day: 0.1 })
//!         .build()
//!         .unwrap(),
//! );
//!
//! let table = TableSchema::builder("customers", common.clone())
//!     .field(FieldDescriptor::new("id", ValueType::Integer))
//!     .field(FieldDescriptor::new("name", ValueType::Text))
//!     .field(
//!         FieldDescriptor::new("created", ValueType::Text)
//!             .common("date")
//!             .with_codec(Codec::date_text("%Y-%m-%d")),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let row = table
//!     .row(None, vec![Value::Integer(1), "John Wick".into(), "2021-01-18".into()])
//!     .unwrap();
//! let normalized = table.normalize(&row).unwrap();
//! assert_eq!(common.weighted_similarity(&normalized, &normalized), 1.0);
//! ```

pub mod value;
pub mod row;
pub mod error;
pub mod condition;
pub mod comparator;
pub mod codec;
pub mod field;
pub mod common;
pub mod table;

pub use value::{Value, ValueKey, ValueType};
pub use row::{Row, RowId};
pub use error::{Error, Result};
pub use condition::{escape_like, Column, CompareOp, Condition, FIELD_PLACEHOLDER, LIKE_ESCAPE, PARAM_MARKER};
pub use comparator::{Comparator, ValueComparator};
pub use codec::{Codec, ValueCodec, DEFAULT_DATE_FORMAT};
pub use field::{ConditionKind, FieldCondition, FieldDescriptor};
pub use common::{CommonField, CommonSchema, CommonSchemaBuilder};
pub use table::{TableSchema, TableSchemaBuilder, DEFAULT_ROW_ID_COLUMN};
