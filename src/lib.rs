//! # Crosslink
//!
//! Cross-check records held in two tables with different schemas.
//!
//! Both tables are described against one shared vocabulary, the common
//! schema. Rows are translated into it, compared concept by concept with
//! weighted comparators, and turned into parameterized queries that look up
//! related or duplicate rows in the other table.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! crosslink --config session.json similar --table customers --data customers.csv --probe-row 0 --threshold 0.8
//! crosslink --config session.json related --from a --from-data a.csv --to b --to-data b.csv --probe-row 3
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use crosslink::prelude::*;
//! use std::sync::Arc;
//!
//! let common = Arc::new(
//!     CommonSchema::builder()
//!         .field("id", ValueType::Integer, 0.0)
//!         .field_with("name", ValueType::Text, 0.6, Comparator::TokenSet)
//!         .build()
//!         .unwrap(),
//! );
//! let people = TableSchema::builder("people", common.clone())
//!     .field(FieldDescriptor::new("id", ValueType::Integer))
//!     .field(FieldDescriptor::new("name", ValueType::Text).with_condition(ConditionKind::AllWords))
//!     .build()
//!     .unwrap();
//!
//! let store = MemoryStore::new();
//! let table = store.create_table(people.clone()).unwrap();
//! table.insert(vec![Value::Integer(1), "John Wick".into()]).unwrap();
//! table.insert(vec![Value::Integer(2), "Jane Doe".into()]).unwrap();
//!
//! let probe = people.row(None, vec![Value::Integer(9), "wick john".into()]).unwrap();
//! let related = find_related_rows(&store, &people, &people, &probe).unwrap();
//! assert_eq!(related.len(), 1);
//!
//! let rows = normalize_rows(&people, &table.snapshot()).rows;
//! let similar = find_similar(&rows, &people.normalize(&probe).unwrap(), &common, 0.5);
//! assert_eq!(similar[0].index, 0);
//! ```
//!
//! ## Crate Structure
//!
//! - [`crosslink-core`](https://docs.rs/crosslink-core) - values, rows, field descriptors, common and table schemas
//! - [`crosslink-query`](https://docs.rs/crosslink-query) - condition builder, SQL rendering, in-memory evaluation
//! - [`crosslink-similarity`](https://docs.rs/crosslink-similarity) - similarity search, duplicates, explanations
//! - [`crosslink-storage`](https://docs.rs/crosslink-storage) - JSON sessions, in-memory tables, CSV import, checks

// Re-export core types
pub use crosslink_core::{
    Codec, Column, CommonField, CommonSchema, Comparator, CompareOp, Condition, ConditionKind, Error,
    FieldCondition, FieldDescriptor, Result, Row, RowId, TableSchema, Value, ValueCodec, ValueComparator,
    ValueType, DEFAULT_DATE_FORMAT,
};

// Re-export query building
pub use crosslink_query::{
    duplicates_query, find_duplicate_rows, find_related_rows, related_rows_query, CompiledFilter, Dialect, Filter,
    ParameterizedQuery, QueryError, QueryExecutor, RowSource, ScanExecutor, SelectQuery,
};

// Re-export similarity
pub use crosslink_similarity::{
    explain, find_all_similar, find_all_similar_with, find_duplicates, find_similar, group_duplicates,
    normalize_rows, Contribution, ExplainedRow, Explanation, NormalizedRows, RowError, ScanOptions, ScanOutcome,
    SimilarGroup, SimilarMatch, SimilarRow, SimilarityStats,
};

// Re-export storage
pub use crosslink_storage::{
    import_csv, import_csv_path, run_checks, Check, CheckReport, CheckStatus, ConfigError, ImportError,
    ImportOptions, MemoryStore, MemoryTable, Registry, Session, SessionConfig, StoreError, SuccessPolicy,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        find_all_similar, find_duplicate_rows, find_duplicates, find_related_rows, find_similar,
        normalize_rows, Codec, CommonSchema, Comparator, ConditionKind, FieldDescriptor, MemoryStore,
        QueryExecutor, Row, RowId, RowSource, TableSchema, Value, ValueType,
    };
}
