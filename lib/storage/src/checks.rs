//! Declarative data checks
//!
//! A check is a named filter over one table plus a policy saying what the
//! matching rows mean: a check can require that some rows match, that none
//! do, or only report them.

use crosslink_core::{CompareOp, Condition, Row, TableSchema, Value};
use crosslink_query::{QueryError, QueryExecutor, RowSource, SelectQuery};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SuccessPolicy {
    /// Passes when at least one row matches
    #[serde(rename = "any", alias = "SUCCESS_ANY")]
    AnyRows,
    /// Passes when no row matches
    #[serde(rename = "none", alias = "SUCCESS_NONE")]
    NoRows,
    /// Informational only
    #[default]
    #[serde(rename = "report", alias = "NO_SUCCESS")]
    Report,
}

/// `column op value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckClause {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// AND-joined; no clauses selects every row
    #[serde(default)]
    pub clauses: Vec<CheckClause>,
    #[serde(default)]
    pub success: SuccessPolicy,
}

impl Check {
    pub fn condition(&self) -> Condition {
        Condition::And(
            self.clauses
                .iter()
                .map(|c| Condition::compare(c.op, c.value.clone()).bind(&c.column))
                .collect(),
        )
    }

    /// Every clause must name a column of `schema`
    pub fn validate(&self, schema: &TableSchema) -> Result<(), String> {
        if self.table != schema.name() {
            return Err(format!("targets table '{}', not '{}'", self.table, schema.name()));
        }
        match self.clauses.iter().find(|c| schema.position(&c.column).is_none()) {
            Some(clause) => Err(format!("unknown column '{}' in table '{}'", clause.column, self.table)),
            None => Ok(()),
        }
    }

    pub fn query(&self, schema: &TableSchema) -> SelectQuery {
        SelectQuery {
            table: self.table.clone(),
            row_id_column: Some(schema.row_id_column().to_string()),
            columns: schema.column_names().map(str::to_string).collect(),
            filter: self.condition(),
        }
    }

    pub fn status(&self, matched: usize) -> CheckStatus {
        match self.success {
            SuccessPolicy::AnyRows if matched > 0 => CheckStatus::Passed,
            SuccessPolicy::NoRows if matched == 0 => CheckStatus::Passed,
            SuccessPolicy::AnyRows | SuccessPolicy::NoRows => CheckStatus::Failed,
            SuccessPolicy::Report => CheckStatus::Reported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
    Reported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: CheckStatus,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn with_status(&self, status: CheckStatus) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    /// No check failed
    pub fn is_success(&self) -> bool {
        self.with_status(CheckStatus::Failed).next().is_none()
    }
}

/// Run the checks that target `table`, in order. Checks for other tables are
/// skipped.
pub fn run_checks<T>(table: &T, checks: &[Check]) -> Result<CheckReport, QueryError>
where
    T: RowSource + QueryExecutor + ?Sized,
{
    let schema = table.schema();
    let mut report = CheckReport::default();

    for check in checks {
        if check.table != schema.name() {
            debug!(check = %check.name, table = %check.table, "skipping check for another table");
            continue;
        }

        let rows = table.execute(&check.query(schema))?;
        let status = check.status(rows.len());
        info!(check = %check.name, matched = rows.len(), ?status, "check finished");
        report.results.push(CheckResult {
            name: check.name.clone(),
            label: check.label.clone(),
            status,
            rows,
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTable;
    use crosslink_core::{CommonSchema, FieldDescriptor, ValueType};
    use std::sync::Arc;

    fn table() -> MemoryTable {
        let common = Arc::new(
            CommonSchema::builder()
                .field("name", ValueType::Text, 1.0)
                .field("age", ValueType::Integer, 1.0)
                .build()
                .unwrap(),
        );
        let schema = TableSchema::builder("people", common)
            .field(FieldDescriptor::new("name", ValueType::Text))
            .field(FieldDescriptor::new("age", ValueType::Integer))
            .build()
            .unwrap();
        let table = MemoryTable::new(schema);
        table.insert(vec!["Ann".into(), Value::Integer(31)]).unwrap();
        table.insert(vec!["Bob".into(), Value::Integer(-2)]).unwrap();
        table.insert(vec!["Cid".into(), Value::Null]).unwrap();
        table
    }

    fn check(name: &str, clauses: Vec<CheckClause>, success: SuccessPolicy) -> Check {
        Check {
            name: name.to_string(),
            table: "people".to_string(),
            label: None,
            clauses,
            success,
        }
    }

    fn clause(column: &str, op: CompareOp, value: Value) -> CheckClause {
        CheckClause {
            column: column.to_string(),
            op,
            value,
        }
    }

    #[test]
    fn test_run_checks_policies() {
        let table = table();
        let checks = vec![
            check("negative_age", vec![clause("age", CompareOp::Lt, Value::Integer(0))], SuccessPolicy::NoRows),
            check("has_ann", vec![clause("name", CompareOp::Eq, "Ann".into())], SuccessPolicy::AnyRows),
            check("adults", vec![clause("age", CompareOp::Ge, Value::Integer(18))], SuccessPolicy::Report),
            Check {
                table: "other".to_string(),
                ..check("elsewhere", vec![], SuccessPolicy::AnyRows)
            },
        ];

        let report = run_checks(&table, &checks).unwrap();
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].status, CheckStatus::Failed);
        assert_eq!(report.results[0].rows.len(), 1);
        assert_eq!(report.results[1].status, CheckStatus::Passed);
        assert_eq!(report.results[2].status, CheckStatus::Reported);
        assert_eq!(report.results[2].rows.len(), 1);
        assert!(!report.is_success());
        assert_eq!(report.with_status(CheckStatus::Passed).count(), 1);
    }

    #[test]
    fn test_check_json_format() {
        let json = r#"{
            "name": "negative_age",
            "table": "people",
            "label": "Age must not be negative",
            "clauses": [{"column": "age", "op": "<", "value": 0}],
            "success": "SUCCESS_NONE"
        }"#;
        let check: Check = serde_json::from_str(json).unwrap();
        assert_eq!(check.success, SuccessPolicy::NoRows);
        assert_eq!(check.clauses[0].op, CompareOp::Lt);
        assert_eq!(check.clauses[0].value, Value::Integer(0));
    }

    #[test]
    fn test_validate() {
        let table = table();
        let schema = table.schema();
        assert!(check("ok", vec![clause("age", CompareOp::Eq, Value::Integer(1))], SuccessPolicy::Report)
            .validate(schema)
            .is_ok());
        assert!(check("bad", vec![clause("height", CompareOp::Eq, Value::Integer(1))], SuccessPolicy::Report)
            .validate(schema)
            .is_err());
    }

    #[test]
    fn test_no_clauses_selects_everything() {
        let table = table();
        let report = run_checks(&table, &[check("all", vec![], SuccessPolicy::AnyRows)]).unwrap();
        assert_eq!(report.results[0].rows.len(), 3);
        assert!(report.is_success());
    }
}
