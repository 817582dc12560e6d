//! In-memory evaluation of condition trees
//!
//! Mirrors how a SQL engine would evaluate the rendered query so that tables
//! held in memory answer related-rows and duplicates queries identically.
//! Comparisons against `NULL` are never true.

use crosslink_core::{Column, CompareOp, Condition, Row, TableSchema, Value, LIKE_ESCAPE};
use std::cmp::Ordering;

use crate::error::{QueryError, Result};

pub trait Filter {
    fn matches(&self, row: &Row) -> bool;
}

/// Condition tree with columns resolved to row positions
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    node: Node,
}

#[derive(Debug, Clone)]
enum Node {
    Compare { pos: usize, op: CompareOp, param: Value },
    And(Vec<Node>),
    Or(Vec<Node>),
}

impl CompiledFilter {
    /// Resolve every column of `condition` against `schema`.
    ///
    /// Template nodes are opaque SQL and cannot be evaluated here.
    pub fn compile(condition: &Condition, schema: &TableSchema) -> Result<Self> {
        Ok(Self {
            node: compile_node(condition, schema)?,
        })
    }
}

fn compile_node(condition: &Condition, schema: &TableSchema) -> Result<Node> {
    match condition {
        Condition::Compare { column, op, param } => {
            let name = match column {
                Column::Named(name) => name,
                Column::This => return Err(QueryError::UnboundColumn),
            };
            let pos = schema.position(name).ok_or_else(|| QueryError::UnknownColumn {
                table: schema.name().to_string(),
                column: name.clone(),
            })?;
            Ok(Node::Compare {
                pos,
                op: *op,
                param: param.clone(),
            })
        }
        Condition::Template { template, .. } => Err(QueryError::UnsupportedInMemory(template.clone())),
        Condition::And(children) => Ok(Node::And(
            children
                .iter()
                .map(|c| compile_node(c, schema))
                .collect::<Result<_>>()?,
        )),
        Condition::Or(children) => Ok(Node::Or(
            children
                .iter()
                .map(|c| compile_node(c, schema))
                .collect::<Result<_>>()?,
        )),
    }
}

impl Filter for CompiledFilter {
    fn matches(&self, row: &Row) -> bool {
        matches_node(&self.node, row)
    }
}

fn matches_node(node: &Node, row: &Row) -> bool {
    match node {
        Node::Compare { pos, op, param } => row
            .get(*pos)
            .map(|value| compare(value, *op, param))
            .unwrap_or(false),
        Node::And(children) => children.iter().all(|c| matches_node(c, row)),
        Node::Or(children) => children.iter().any(|c| matches_node(c, row)),
    }
}

fn compare(value: &Value, op: CompareOp, param: &Value) -> bool {
    if value.is_null() || param.is_null() {
        return false;
    }

    if op == CompareOp::Like {
        return match (value.as_str(), param.as_str()) {
            (Some(text), Some(pattern)) => like(text, pattern),
            _ => false,
        };
    }

    let ordering = match (value, param) {
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Text(_), _) | (_, Value::Text(_)) => None,
        _ => match (value.as_f64(), param.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };

    match ordering {
        Some(ord) => match op {
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Ne => ord != Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Le => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Ge => ord != Ordering::Less,
            CompareOp::Like => false,
        },
        // Text against a number is never equal
        None => op == CompareOp::Ne,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Literal(char),
    AnyOne,
    AnyMany,
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            LIKE_ESCAPE => Token::Literal(chars.next().unwrap_or(LIKE_ESCAPE)),
            '%' => Token::AnyMany,
            '_' => Token::AnyOne,
            other => Token::Literal(other),
        };
        tokens.push(token);
    }
    tokens
}

/// SQL `LIKE` with `%`, `_` and a `\` escape, ASCII case-insensitive as in
/// sqlite
pub fn like(text: &str, pattern: &str) -> bool {
    let tokens = tokenize(pattern);
    let text: Vec<char> = text.chars().collect();

    // Greedy matcher with single backtrack point on the last `%`
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(Token::AnyMany) => {
                star = Some((p, t));
                p += 1;
            }
            Some(Token::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(Token::Literal(c)) if c.eq_ignore_ascii_case(&text[t]) => {
                t += 1;
                p += 1;
            }
            _ => match star {
                Some((sp, st)) => {
                    p = sp + 1;
                    t = st + 1;
                    star = Some((sp, st + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|tok| *tok == Token::AnyMany)
}
