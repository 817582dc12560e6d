//! Select queries and their serialization per SQL dialect

use crosslink_core::{
    Column, CompareOp, Condition, Error as CoreError, Value, FIELD_PLACEHOLDER, LIKE_ESCAPE, PARAM_MARKER,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::error::{QueryError, Result};

/// Parameter marker style of the target database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `?` markers
    #[default]
    Sqlite,
    /// `$1`, `$2`, ... markers
    Postgres,
}

/// `SELECT <row id>, <columns> FROM <table> WHERE <filter>`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    pub row_id_column: Option<String>,
    pub columns: Vec<String>,
    pub filter: Condition,
}

impl SelectQuery {
    /// Every column must be bound and every template must agree with its
    /// parameter count. Run before handing the query to an executor.
    pub fn validate(&self) -> Result<()> {
        validate_condition(&self.filter)
    }

    /// Bound values in left-to-right clause order
    pub fn params(&self) -> Vec<Value> {
        self.filter.params().into_iter().cloned().collect()
    }

    pub fn render(&self, dialect: Dialect) -> Result<ParameterizedQuery> {
        self.validate()?;

        let mut writer = SqlWriter::new(dialect);
        writer.sql.push_str("SELECT ");
        let columns = self.row_id_column.iter().chain(self.columns.iter());
        for (i, column) in columns.enumerate() {
            if i > 0 {
                writer.sql.push_str(", ");
            }
            writer.push_ident(column);
        }
        writer.sql.push_str(" FROM ");
        writer.push_ident(&self.table);
        writer.sql.push_str(" WHERE ");
        writer.push_condition(&self.filter, false)?;

        Ok(ParameterizedQuery {
            sql: writer.sql,
            params: writer.params,
        })
    }
}

fn validate_condition(condition: &Condition) -> Result<()> {
    match condition {
        Condition::Compare { column, .. } => column_name(column).map(|_| ()),
        Condition::Template { column, .. } => {
            let name = column_name(column)?;
            condition.validate(name).map_err(QueryError::from)
        }
        Condition::And(children) | Condition::Or(children) => {
            children.iter().try_for_each(validate_condition)
        }
    }
}

fn column_name(column: &Column) -> Result<&str> {
    match column {
        Column::Named(name) => Ok(name),
        Column::This => Err(QueryError::UnboundColumn),
    }
}

/// SQL text plus the values bound to its markers, in marker order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedQuery {
    sql: String,
    params: Vec<Value>,
}

impl ParameterizedQuery {
    #[inline]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[inline]
    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

struct SqlWriter {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_ident(&mut self, ident: &str) {
        self.sql.push_str(&quote_ident(ident));
    }

    fn push_param(&mut self, value: &Value) {
        self.params.push(value.clone());
        match self.dialect {
            Dialect::Sqlite => self.sql.push('?'),
            Dialect::Postgres => {
                let _ = write!(self.sql, "${}", self.params.len());
            }
        }
    }

    fn push_condition(&mut self, condition: &Condition, nested: bool) -> Result<()> {
        match condition {
            Condition::Compare { column, op, param } => {
                self.push_ident(column_name(column)?);
                let sql_op = match op {
                    CompareOp::Eq => " = ",
                    CompareOp::Ne => " <> ",
                    CompareOp::Lt => " < ",
                    CompareOp::Le => " <= ",
                    CompareOp::Gt => " > ",
                    CompareOp::Ge => " >= ",
                    CompareOp::Like => " LIKE ",
                };
                self.sql.push_str(sql_op);
                self.push_param(param);
                if *op == CompareOp::Like {
                    let _ = write!(self.sql, " ESCAPE '{}'", LIKE_ESCAPE);
                }
            }
            Condition::Template {
                column,
                template,
                params,
            } => {
                let name = column_name(column)?;
                let quoted = quote_ident(name);
                let mut values = params.iter();
                self.sql.push('(');
                // Markers are taken from the template text only, never from the identifier
                for (i, segment) in template.split(FIELD_PLACEHOLDER).enumerate() {
                    if i > 0 {
                        self.sql.push_str(&quoted);
                    }
                    for ch in segment.chars() {
                        if ch != PARAM_MARKER {
                            self.sql.push(ch);
                            continue;
                        }
                        let value = values.next().ok_or_else(|| CoreError::ArityMismatch {
                            field: name.to_string(),
                            expected: template.matches(PARAM_MARKER).count(),
                            actual: params.len(),
                        })?;
                        self.push_param(value);
                    }
                }
                if values.next().is_some() {
                    return Err(CoreError::ArityMismatch {
                        field: name.to_string(),
                        expected: template.matches(PARAM_MARKER).count(),
                        actual: params.len(),
                    }
                    .into());
                }
                self.sql.push(')');
            }
            Condition::And(children) => self.push_joined(children, " AND ", "1 = 1", nested)?,
            Condition::Or(children) => self.push_joined(children, " OR ", "1 = 0", nested)?,
        }
        Ok(())
    }

    fn push_joined(&mut self, children: &[Condition], joiner: &str, empty: &str, nested: bool) -> Result<()> {
        match children {
            [] => self.sql.push_str(empty),
            [only] => self.push_condition(only, nested)?,
            _ => {
                if nested {
                    self.sql.push('(');
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(joiner);
                    }
                    self.push_condition(child, true)?;
                }
                if nested {
                    self.sql.push(')');
                }
            }
        }
        Ok(())
    }
}
