//! Tagged predicate tree rendered to positional (`$n`) Postgres SQL.
//!
//! Placeholders are numbered while rendering, in the same pass that pushes the
//! bound value, so the parameter list always lines up with the text.

use std::cmp::Ordering;
use std::ops::Bound;

use mirror_core::Operator;
use sqlx::postgres::types::PgRange;

/// A bound value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlValue {
    BigInt(i64),
    Text(String),
    Bytes(Vec<u8>),
    Int8Range(Int8Range),
}

impl SqlValue {
    fn compare(&self, other: &SqlValue) -> Option<Ordering> {
        match (self, other) {
            (SqlValue::BigInt(a), SqlValue::BigInt(b)) => Some(a.cmp(b)),
            (SqlValue::Text(a), SqlValue::Text(b)) => Some(a.cmp(b)),
            (SqlValue::Bytes(a), SqlValue::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// `int8range` value. Bounds are discrete, so `[1, 5)` and `[1, 4]` behave the
/// same in the set operations below.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Int8Range {
    pub lower: Bound<i64>,
    pub upper: Bound<i64>,
}

impl Int8Range {
    pub fn new(lower: Bound<i64>, upper: Bound<i64>) -> Self {
        Self { lower, upper }
    }

    /// `[start, end)`; `None` end is open-ended.
    pub fn half_open(start: i64, end: Option<i64>) -> Self {
        Self::new(
            Bound::Included(start),
            end.map_or(Bound::Unbounded, Bound::Excluded),
        )
    }

    /// `[value, value]`
    pub fn point(value: i64) -> Self {
        Self::new(Bound::Included(value), Bound::Included(value))
    }

    fn inclusive(&self) -> Option<(i128, i128)> {
        let lo = match self.lower {
            Bound::Included(v) => i128::from(v),
            Bound::Excluded(v) => i128::from(v) + 1,
            Bound::Unbounded => i128::MIN,
        };
        let hi = match self.upper {
            Bound::Included(v) => i128::from(v),
            Bound::Excluded(v) => i128::from(v) - 1,
            Bound::Unbounded => i128::MAX,
        };
        (lo <= hi).then_some((lo, hi))
    }

    pub fn is_empty(&self) -> bool {
        self.inclusive().is_none()
    }

    /// Postgres `&&`.
    pub fn overlaps(&self, other: &Int8Range) -> bool {
        match (self.inclusive(), other.inclusive()) {
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => a_lo <= b_hi && b_lo <= a_hi,
            _ => false,
        }
    }

    /// Postgres `self <@ other`. The empty range is contained by everything.
    pub fn is_within(&self, other: &Int8Range) -> bool {
        match (self.inclusive(), other.inclusive()) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some((a_lo, a_hi)), Some((b_lo, b_hi))) => b_lo <= a_lo && a_hi <= b_hi,
        }
    }
}

impl From<Int8Range> for PgRange<i64> {
    fn from(r: Int8Range) -> Self {
        PgRange {
            start: r.lower,
            end: r.upper,
        }
    }
}

impl From<PgRange<i64>> for Int8Range {
    fn from(r: PgRange<i64>) -> Self {
        Int8Range::new(r.start, r.end)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SqlExpr {
    /// `column <op> $n`
    Comparison {
        column: &'static str,
        op: Operator,
        value: SqlValue,
    },
    /// `column in ($a, $b, ...)`; a single value renders as `=`.
    InList {
        column: &'static str,
        values: Vec<SqlValue>,
    },
    /// `column && $n`
    RangeOverlap {
        column: &'static str,
        range: Int8Range,
    },
    /// `not column <@ $n`
    RangeExcludes {
        column: &'static str,
        range: Int8Range,
    },
    Conjunction(Vec<SqlExpr>),
}

impl SqlExpr {
    pub fn and(parts: Vec<SqlExpr>) -> Self {
        SqlExpr::Conjunction(parts)
    }

    pub fn eq(column: &'static str, value: SqlValue) -> Self {
        SqlExpr::Comparison {
            column,
            op: Operator::Eq,
            value,
        }
    }

    /// True for a conjunction with nothing in it (at any depth).
    pub fn is_empty(&self) -> bool {
        match self {
            SqlExpr::Conjunction(parts) => parts.iter().all(SqlExpr::is_empty),
            _ => false,
        }
    }

    /// Render, appending bound values to `params`. Placeholder numbers
    /// continue from whatever `params` already holds.
    pub fn render(&self, params: &mut Vec<SqlValue>) -> String {
        match self {
            SqlExpr::Comparison { column, op, value } => {
                let slot = push(params, value.clone());
                format!("{column} {} {slot}", op.sql())
            }
            SqlExpr::InList { column, values } => match values.as_slice() {
                [] => "false".to_string(),
                [single] => {
                    let slot = push(params, single.clone());
                    format!("{column} = {slot}")
                }
                many => {
                    let slots: Vec<String> =
                        many.iter().map(|v| push(params, v.clone())).collect();
                    format!("{column} in ({})", slots.join(", "))
                }
            },
            SqlExpr::RangeOverlap { column, range } => {
                let slot = push(params, SqlValue::Int8Range(*range));
                format!("{column} && {slot}")
            }
            SqlExpr::RangeExcludes { column, range } => {
                let slot = push(params, SqlValue::Int8Range(*range));
                format!("not {column} <@ {slot}")
            }
            SqlExpr::Conjunction(parts) => {
                let rendered: Vec<String> = parts
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| p.render(params))
                    .collect();
                if rendered.is_empty() {
                    "true".to_string()
                } else {
                    rendered.join(" and ")
                }
            }
        }
    }

    /// Evaluate against one row. `lookup` returns `None` for SQL `NULL`,
    /// which fails every test as it would in Postgres.
    pub fn matches<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<SqlValue>,
    {
        match self {
            SqlExpr::Comparison { column, op, value } => lookup(column)
                .and_then(|actual| actual.compare(value))
                .is_some_and(|ord| match op {
                    Operator::Eq => ord == Ordering::Equal,
                    Operator::Ne => ord != Ordering::Equal,
                    Operator::Lt => ord == Ordering::Less,
                    Operator::Lte => ord != Ordering::Greater,
                    Operator::Gt => ord == Ordering::Greater,
                    Operator::Gte => ord != Ordering::Less,
                }),
            SqlExpr::InList { column, values } => lookup(column).is_some_and(|actual| {
                values
                    .iter()
                    .any(|v| actual.compare(v) == Some(Ordering::Equal))
            }),
            SqlExpr::RangeOverlap { column, range } => {
                matches!(lookup(column), Some(SqlValue::Int8Range(r)) if r.overlaps(range))
            }
            SqlExpr::RangeExcludes { column, range } => {
                matches!(lookup(column), Some(SqlValue::Int8Range(r)) if !r.is_within(range))
            }
            SqlExpr::Conjunction(parts) => parts.iter().all(|p| p.matches(lookup)),
        }
    }
}

fn push(params: &mut Vec<SqlValue>, value: SqlValue) -> String {
    params.push(value);
    format!("${}", params.len())
}
