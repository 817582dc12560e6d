//! Session configuration
//!
//! A session is one cross-check: the common schema, the tables translated
//! into it and the checks run against them. It is described in JSON; custom
//! comparators, codecs and conditions are code and are referenced by name
//! through a [`Registry`].

use crosslink_core::{
    Codec, CommonSchema, Comparator, ConditionKind, FieldCondition, FieldDescriptor, TableSchema, ValueCodec,
    ValueComparator, ValueType, DEFAULT_DATE_FORMAT, DEFAULT_ROW_ID_COLUMN,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::checks::Check;
use crate::error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub common: Vec<ConceptConfig>,
    pub tables: Vec<TableConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<Check>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub comparator: ComparatorConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparatorConfig {
    #[default]
    Exact,
    ExactIgnoreCase,
    Trigram,
    TokenJaccard,
    TokenSet,
    JaroWinkler,
    NumericRelative,
    NumericAbsolute,
    DayProximity { penalty_per_day: f64 },
    Custom { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    #[serde(default = "default_row_id_column")]
    pub row_id_column: String,
    pub fields: Vec<FieldConfig>,
}

fn default_row_id_column() -> String {
    DEFAULT_ROW_ID_COLUMN.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Common concept, defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common: Option<String>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub condition: ConditionConfig,
    #[serde(default)]
    pub codec: CodecConfig,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionConfig {
    #[default]
    Equals,
    AllWords,
    AnyWords,
    Contains,
    Custom { name: String },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodecConfig {
    #[default]
    Identity,
    DateText {
        #[serde(default = "default_date_format")]
        format: String,
    },
    EpochSeconds {
        #[serde(default = "default_date_format")]
        format: String,
    },
    Prefixed { prefix: String },
    Scaled { factor: f64 },
    Custom { name: String },
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

/// Named user functions that configuration files can refer to
#[derive(Clone, Default)]
pub struct Registry {
    comparators: HashMap<String, Comparator>,
    codecs: HashMap<String, Codec>,
    conditions: HashMap<String, ConditionKind>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_comparator<C: ValueComparator + 'static>(mut self, name: impl Into<String>, comparator: C) -> Self {
        self.comparators.insert(name.into(), Comparator::custom(comparator));
        self
    }

    #[must_use]
    pub fn with_codec<C: ValueCodec + 'static>(mut self, name: impl Into<String>, codec: C) -> Self {
        self.codecs.insert(name.into(), Codec::custom(codec));
        self
    }

    #[must_use]
    pub fn with_condition<C: FieldCondition + 'static>(mut self, name: impl Into<String>, condition: C) -> Self {
        self.conditions.insert(name.into(), ConditionKind::custom(condition));
        self
    }

    fn comparator(&self, config: &ComparatorConfig) -> Result<Comparator> {
        Ok(match config {
            ComparatorConfig::Exact => Comparator::Exact,
            ComparatorConfig::ExactIgnoreCase => Comparator::ExactIgnoreCase,
            ComparatorConfig::Trigram => Comparator::Trigram,
            ComparatorConfig::TokenJaccard => Comparator::TokenJaccard,
            ComparatorConfig::TokenSet => Comparator::TokenSet,
            ComparatorConfig::JaroWinkler => Comparator::JaroWinkler,
            ComparatorConfig::NumericRelative => Comparator::NumericRelative,
            ComparatorConfig::NumericAbsolute => Comparator::NumericAbsolute,
            ComparatorConfig::DayProximity { penalty_per_day } => Comparator::DayProximity {
                penalty_per_day: *penalty_per_day,
            },
            ComparatorConfig::Custom { name } => self
                .comparators
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownComparator(name.clone()))?,
        })
    }

    fn codec(&self, config: &CodecConfig) -> Result<Codec> {
        Ok(match config {
            CodecConfig::Identity => Codec::Identity,
            CodecConfig::DateText { format } => Codec::date_text(format.as_str()),
            CodecConfig::EpochSeconds { format } => Codec::epoch_seconds(format.as_str()),
            CodecConfig::Prefixed { prefix } => Codec::prefixed(prefix.as_str()),
            CodecConfig::Scaled { factor } => Codec::Scaled { factor: *factor },
            CodecConfig::Custom { name } => self
                .codecs
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownCodec(name.clone()))?,
        })
    }

    fn condition(&self, config: &ConditionConfig) -> Result<ConditionKind> {
        Ok(match config {
            ConditionConfig::Equals => ConditionKind::Equals,
            ConditionConfig::AllWords => ConditionKind::AllWords,
            ConditionConfig::AnyWords => ConditionKind::AnyWords,
            ConditionConfig::Contains => ConditionKind::Contains,
            ConditionConfig::Custom { name } => self
                .conditions
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownCondition(name.clone()))?,
        })
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("comparators", &self.comparators.keys().collect::<Vec<_>>())
            .field("codecs", &self.codecs.keys().collect::<Vec<_>>())
            .field("conditions", &self.conditions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Built, validated session
#[derive(Debug, Clone)]
pub struct Session {
    common: Arc<CommonSchema>,
    tables: Vec<TableSchema>,
    checks: Vec<Check>,
}

impl Session {
    #[inline]
    pub fn common(&self) -> &Arc<CommonSchema> {
        &self.common
    }

    #[inline]
    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name() == name)
    }

    #[inline]
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn checks_for<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a Check> + 'a {
        self.checks.iter().filter(move |c| c.table == table)
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&data)?;
        info!(path = %path.as_ref().display(), tables = config.tables.len(), "loaded session config");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Resolve named functions and validate every schema and check
    pub fn build(&self, registry: &Registry) -> Result<Session> {
        let common = self
            .common
            .iter()
            .try_fold(CommonSchema::builder(), |builder, concept| {
                let comparator = registry.comparator(&concept.comparator)?;
                Ok::<_, ConfigError>(builder.field_with(
                    concept.name.as_str(),
                    concept.value_type,
                    concept.weight,
                    comparator,
                ))
            })?
            .build()?;
        let common = Arc::new(common);

        let mut tables: Vec<TableSchema> = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            if tables.iter().any(|t| t.name() == table.name) {
                return Err(ConfigError::DuplicateTable(table.name.clone()));
            }

            let mut builder = TableSchema::builder(table.name.as_str(), common.clone())
                .row_id_column(table.row_id_column.as_str());
            for field in &table.fields {
                let mut descriptor = FieldDescriptor::new(field.name.as_str(), field.value_type)
                    .with_condition(registry.condition(&field.condition)?)
                    .with_codec(registry.codec(&field.codec)?);
                if let Some(common_name) = &field.common {
                    descriptor = descriptor.common(common_name.as_str());
                }
                builder = builder.field(descriptor);
            }
            tables.push(builder.build()?);
        }

        for check in &self.checks {
            let schema = tables
                .iter()
                .find(|t| t.name() == check.table)
                .ok_or_else(|| ConfigError::InvalidCheck {
                    check: check.name.clone(),
                    reason: format!("unknown table '{}'", check.table),
                })?;
            check.validate(schema).map_err(|reason| ConfigError::InvalidCheck {
                check: check.name.clone(),
                reason,
            })?;
        }

        Ok(Session {
            common,
            tables,
            checks: self.checks.clone(),
        })
    }
}
