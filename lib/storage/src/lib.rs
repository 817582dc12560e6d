//! # Crosslink Storage
//!
//! Reference collaborators around the matching engine:
//!
//! - [`SessionConfig`] / [`Registry`] - JSON session description and named user functions
//! - [`MemoryTable`] / [`MemoryStore`] - in-memory tables answering queries
//! - [`import_csv`] - delimited text into typed rows
//! - [`run_checks`] - declarative data checks with success policies

pub mod error;
pub mod memory;
pub mod import;
pub mod checks;
pub mod config;

pub use error::{ConfigError, ImportError, Result, StoreError};
pub use memory::{MemoryStore, MemoryTable};
pub use import::{import_csv, import_csv_path, ImportOptions};
pub use checks::{run_checks, Check, CheckClause, CheckReport, CheckResult, CheckStatus, SuccessPolicy};
pub use config::{
    CodecConfig, ComparatorConfig, ConceptConfig, ConditionConfig, FieldConfig, Registry, Session, SessionConfig,
    TableConfig,
};
