//! Filter expression AST.
//!
//! Field conditions produce trees of `(column, operator, parameter)` nodes.
//! Column names only ever come from schema definitions and values only ever
//! travel as parameters, so rendering a tree cannot splice data into SQL.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::value::Value;

/// Placeholder standing for "this field's name" inside a template
pub const FIELD_PLACEHOLDER: &str = "{field}";

/// Parameter marker inside a template
pub const PARAM_MARKER: char = '?';

/// Escape character used for LIKE patterns
pub const LIKE_ESCAPE: char = '\\';

/// Column reference of a condition leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    /// The field the condition was generated for, bound later by the builder
    This,
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    #[serde(alias = "=")]
    Eq,
    #[serde(alias = "!=", alias = "<>")]
    Ne,
    #[serde(alias = "<")]
    Lt,
    #[serde(alias = "<=")]
    Le,
    #[serde(alias = ">")]
    Gt,
    #[serde(alias = ">=")]
    Ge,
    Like,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Compare {
        column: Column,
        op: CompareOp,
        param: Value,
    },
    /// Hand written fragment: `{field}` names the column, each `?` binds one
    /// entry of `params` in order
    Template {
        column: Column,
        template: String,
        params: Vec<Value>,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn compare(op: CompareOp, param: Value) -> Self {
        Condition::Compare {
            column: Column::This,
            op,
            param,
        }
    }

    pub fn equals(param: Value) -> Self {
        Self::compare(CompareOp::Eq, param)
    }

    /// `LIKE %text%` with `text` escaped
    pub fn contains(text: &str) -> Self {
        Self::compare(CompareOp::Like, Value::Text(format!("%{}%", escape_like(text))))
    }

    pub fn template(template: impl Into<String>, params: Vec<Value>) -> Self {
        Condition::Template {
            column: Column::This,
            template: template.into(),
            params,
        }
    }

    /// Replace every `Column::This` with `name`
    #[must_use]
    pub fn bind(self, name: &str) -> Self {
        let bind_column = |column: Column| match column {
            Column::This => Column::Named(name.to_string()),
            named => named,
        };
        match self {
            Condition::Compare { column, op, param } => Condition::Compare {
                column: bind_column(column),
                op,
                param,
            },
            Condition::Template {
                column,
                template,
                params,
            } => Condition::Template {
                column: bind_column(column),
                template,
                params,
            },
            Condition::And(children) => {
                Condition::And(children.into_iter().map(|c| c.bind(name)).collect())
            }
            Condition::Or(children) => {
                Condition::Or(children.into_iter().map(|c| c.bind(name)).collect())
            }
        }
    }

    /// Bound values in left-to-right order
    pub fn params(&self) -> SmallVec<[&Value; 4]> {
        let mut out = SmallVec::new();
        self.collect_params(&mut out);
        out
    }

    fn collect_params<'a>(&'a self, out: &mut SmallVec<[&'a Value; 4]>) {
        match self {
            Condition::Compare { param, .. } => out.push(param),
            Condition::Template { params, .. } => out.extend(params.iter()),
            Condition::And(children) | Condition::Or(children) => {
                for child in children {
                    child.collect_params(out);
                }
            }
        }
    }

    /// Check every template node: the name placeholder must be present and
    /// the number of `?` markers must equal the number of bound values.
    ///
    /// `field` only labels the error.
    pub fn validate(&self, field: &str) -> Result<()> {
        match self {
            Condition::Compare { .. } => Ok(()),
            Condition::Template {
                template, params, ..
            } => {
                if !template.contains(FIELD_PLACEHOLDER) {
                    return Err(Error::InvalidTemplate {
                        field: field.to_string(),
                        reason: format!("missing {} placeholder", FIELD_PLACEHOLDER),
                    });
                }
                let markers = template.matches(PARAM_MARKER).count();
                if markers != params.len() {
                    return Err(Error::ArityMismatch {
                        field: field.to_string(),
                        expected: markers,
                        actual: params.len(),
                    });
                }
                Ok(())
            }
            Condition::And(children) | Condition::Or(children) => {
                children.iter().try_for_each(|c| c.validate(field))
            }
        }
    }
}

/// Escape LIKE wildcards so `text` matches literally
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
