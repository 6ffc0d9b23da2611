//! The typed relational request a store executes.
//!
//! The query builder compiles navigation chains into a [`Select`]: a
//! predicate tree over named columns, orderings, and an optional limit. A
//! [`Select`] is store-agnostic — [`MemoryStore`](super::MemoryStore)
//! evaluates it directly, and [`Select::to_sql`] renders the equivalent
//! parameterized SQL for adopting the library over a real connection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A row identifier assigned by the store on insert.
pub type RowId = i64;

/// A single column value.
///
/// Mirrors the value families of the required table schema: text for the
/// path, wide floats for the boundaries, integers for level and keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// The value as an `i64`, when it is numeric and integral.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as an `f64`; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    /// The value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Orders two values the way the database would for comparison
    /// predicates: numerics cross-compare, text compares bytewise, and
    /// `Null` (or mixed families) compares as unknown.
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => {
                let a = self.as_f64()?;
                let b = other.as_f64()?;
                Some(a.total_cmp(&b))
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// One stored row: its id plus the named column values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub values: BTreeMap<String, Value>,
}

impl Row {
    /// The value of `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn sql(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "<>",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    fn matches(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Eq => ordering == Equal,
            CmpOp::Ne => ordering != Equal,
            CmpOp::Lt => ordering == Less,
            CmpOp::Le => ordering != Greater,
            CmpOp::Gt => ordering == Greater,
            CmpOp::Ge => ordering != Less,
        }
    }
}

/// A predicate tree over named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `column op value`.
    Cmp {
        column: String,
        op: CmpOp,
        value: Value,
    },
    /// Conjunction; empty is `TRUE`.
    All(Vec<Predicate>),
    /// Disjunction; empty is `FALSE`.
    Any(Vec<Predicate>),
    /// Negation.
    Not(Box<Predicate>),
}

impl Predicate {
    /// Shorthand for a comparison leaf.
    pub fn cmp(column: impl Into<String>, op: CmpOp, value: impl Into<Value>) -> Predicate {
        Predicate::Cmp {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluates the predicate against a row. Comparisons against missing
    /// columns or across incomparable families are false, as in SQL.
    pub fn eval(&self, row: &Row) -> bool {
        match self {
            Predicate::Cmp { column, op, value } => row
                .get(column)
                .and_then(|actual| actual.compare(value))
                .is_some_and(|ordering| op.matches(ordering)),
            Predicate::All(parts) => parts.iter().all(|p| p.eval(row)),
            Predicate::Any(parts) => parts.iter().any(|p| p.eval(row)),
            Predicate::Not(inner) => !inner.eval(row),
        }
    }

    fn render_sql(&self, out: &mut String, params: &mut Vec<Value>) {
        match self {
            Predicate::Cmp { column, op, value } => {
                out.push_str(column);
                out.push(' ');
                out.push_str(op.sql());
                out.push_str(" ?");
                params.push(value.clone());
            }
            Predicate::All(parts) if parts.is_empty() => out.push_str("1 = 1"),
            Predicate::Any(parts) if parts.is_empty() => out.push_str("1 = 0"),
            Predicate::All(parts) | Predicate::Any(parts) => {
                let joiner = if matches!(self, Predicate::All(_)) {
                    " AND "
                } else {
                    " OR "
                };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        out.push_str(joiner);
                    }
                    out.push('(');
                    part.render_sql(out, params);
                    out.push(')');
                }
            }
            Predicate::Not(inner) => {
                out.push_str("NOT (");
                inner.render_sql(out, params);
                out.push(')');
            }
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column: impl Into<String>) -> SortKey {
        SortKey {
            column: column.into(),
            descending: false,
        }
    }

    pub fn desc(column: impl Into<String>) -> SortKey {
        SortKey {
            column: column.into(),
            descending: true,
        }
    }
}

/// A complete relational read request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Select {
    /// Row filter; `None` selects everything.
    pub predicate: Option<Predicate>,
    /// Sort keys, applied left to right.
    pub order: Vec<SortKey>,
    /// Maximum number of rows.
    pub limit: Option<usize>,
}

impl Select {
    /// A select with the given predicate and no ordering.
    pub fn filtered(predicate: Predicate) -> Select {
        Select {
            predicate: Some(predicate),
            ..Select::default()
        }
    }

    /// Renders `SELECT * FROM table …` with `?` placeholders, returning
    /// the statement and its parameters in order.
    pub fn to_sql(&self, table: &str) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {table}");
        let mut params = Vec::new();
        if let Some(predicate) = &self.predicate {
            sql.push_str(" WHERE ");
            predicate.render_sql(&mut sql, &mut params);
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            for (i, key) in self.order.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&key.column);
                sql.push_str(if key.descending { " DESC" } else { " ASC" });
            }
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        (sql, params)
    }
}
