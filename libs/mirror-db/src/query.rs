//! Parsed filters → [`QueryPlan`] compiler.
//!
//! Parsing belongs to `mirror-core`; this module only consumes
//! [`ParsedFilter`]s that already passed their field rules.

use std::ops::Bound;

use mirror_core::filter::{LIMIT, ORDER};
use mirror_core::{BadParameters, FilterValue, InvalidParam, Operator, ParsedFilter, SortOrder};

use crate::sql::{Int8Range, SqlExpr, SqlValue};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar,
    /// `int8range` validity interval.
    Range,
}

#[derive(Clone, Copy, Debug)]
pub struct Column {
    /// Query parameter name.
    pub key: &'static str,
    /// SQL column expression.
    pub name: &'static str,
    pub kind: ColumnKind,
}

/// Whitelisted parameter → column mapping. Predicates are emitted in
/// declaration order.
#[derive(Clone, Debug, Default)]
pub struct ColumnMap {
    columns: Vec<Column>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, key: &'static str, name: &'static str) -> Self {
        self.columns.push(Column {
            key,
            name,
            kind: ColumnKind::Scalar,
        });
        self
    }

    pub fn range(mut self, key: &'static str, name: &'static str) -> Self {
        self.columns.push(Column {
            key,
            name,
            kind: ColumnKind::Range,
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LimitCfg {
    pub default: u64,
    pub max: u64,
}

impl Default for LimitCfg {
    fn default() -> Self {
        Self {
            default: 25,
            max: 100,
        }
    }
}

pub fn clamp_limit(req: Option<u64>, cfg: LimitCfg) -> u64 {
    req.unwrap_or(cfg.default).clamp(1, cfg.max.max(1))
}

/// One fully compiled statement shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryPlan {
    pub condition: SqlExpr,
    /// Rendered `condition`; empty when there is nothing to filter on.
    pub predicate: String,
    pub parameters: Vec<SqlValue>,
    pub order: SortOrder,
    pub limit: u64,
}

impl QueryPlan {
    /// Rows to request: one extra to learn whether another page exists.
    pub fn fetch_limit(&self) -> u64 {
        self.limit.saturating_add(1)
    }

    /// `select … [where …] order by <order_by> <dir> limit $n`.
    pub fn to_sql(&self, select: &str, order_by: &str) -> (String, Vec<SqlValue>) {
        let mut params = self.parameters.clone();
        let mut sql = select.trim_end().to_string();
        if !self.predicate.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.predicate);
        }
        params.push(SqlValue::BigInt(
            i64::try_from(self.fetch_limit()).unwrap_or(i64::MAX),
        ));
        sql.push_str(&format!(
            " order by {order_by} {} limit ${}",
            self.order,
            params.len()
        ));
        (sql, params)
    }

    pub fn matches<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<SqlValue>,
    {
        self.condition.matches(lookup)
    }
}

/// Result of an over-fetched query with the extra row removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn from_overfetch(mut rows: Vec<T>, limit: u64) -> Self {
        let has_more = rows.len() as u64 > limit;
        if has_more {
            rows.truncate(limit as usize);
        }
        Self {
            items: rows,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_more: self.has_more,
        }
    }
}

/// Per-resource plan builder.
#[derive(Clone, Debug)]
pub struct QueryBuilder<'a> {
    columns: &'a ColumnMap,
    default_order: SortOrder,
    limits: LimitCfg,
    base: Vec<SqlExpr>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(columns: &'a ColumnMap, default_order: SortOrder, limits: LimitCfg) -> Self {
        Self {
            columns,
            default_order,
            limits,
            base: Vec::new(),
        }
    }

    /// Fixed predicate placed before every filter-derived one (e.g. a path id).
    pub fn with_condition(mut self, expr: SqlExpr) -> Self {
        self.base.push(expr);
        self
    }

    pub fn build(&self, filters: &[ParsedFilter]) -> Result<QueryPlan, BadParameters> {
        let mut bad = BadParameters::new();
        let mut order = self.default_order;
        let mut requested_limit = None;

        for f in filters {
            match (f.key.as_str(), &f.value) {
                (LIMIT, FilterValue::Int(n)) => requested_limit = Some((*n).max(0) as u64),
                (ORDER, FilterValue::Order(o)) => order = *o,
                _ => {}
            }
        }

        let mut parts = self.base.clone();
        for column in self.columns.iter() {
            let mine = filters.iter().filter(|f| f.key == column.key);
            match column.kind {
                ColumnKind::Scalar => {
                    let mut in_list = Vec::new();
                    let mut bounds = Vec::new();
                    for f in mine {
                        let Some(value) = to_sql_value(&f.value) else {
                            bad.push(InvalidParam::invalid(&f.key, "unsupported value type"));
                            continue;
                        };
                        if f.operator == Operator::Eq {
                            in_list.push(value);
                        } else {
                            bounds.push(SqlExpr::Comparison {
                                column: column.name,
                                op: f.operator,
                                value,
                            });
                        }
                    }
                    if !in_list.is_empty() {
                        parts.push(SqlExpr::InList {
                            column: column.name,
                            values: in_list,
                        });
                    }
                    parts.extend(bounds);
                }
                ColumnKind::Range => {
                    for f in mine {
                        match f.value.as_i64() {
                            Some(v) => parts.push(range_predicate(column.name, f.operator, v)),
                            None => {
                                bad.push(InvalidParam::invalid(&f.key, "range needs an integer"))
                            }
                        }
                    }
                }
            }
        }

        let condition = SqlExpr::and(parts);
        let mut parameters = Vec::new();
        let predicate = if condition.is_empty() {
            String::new()
        } else {
            condition.render(&mut parameters)
        };

        bad.into_result(QueryPlan {
            condition,
            predicate,
            parameters,
            order,
            limit: clamp_limit(requested_limit, self.limits),
        })
    }
}

fn to_sql_value(value: &FilterValue) -> Option<SqlValue> {
    match value {
        FilterValue::Text(s) => Some(SqlValue::Text(s.clone())),
        other => other.as_i64().map(SqlValue::BigInt),
    }
}

fn range_predicate(column: &'static str, op: Operator, v: i64) -> SqlExpr {
    let overlap = |lower, upper| SqlExpr::RangeOverlap {
        column,
        range: Int8Range::new(lower, upper),
    };
    match op {
        Operator::Lt => overlap(Bound::Unbounded, Bound::Excluded(v)),
        Operator::Lte | Operator::Eq => overlap(Bound::Unbounded, Bound::Included(v)),
        Operator::Gt => overlap(Bound::Excluded(v), Bound::Unbounded),
        Operator::Gte => overlap(Bound::Included(v), Bound::Unbounded),
        Operator::Ne => SqlExpr::RangeExcludes {
            column,
            range: Int8Range::point(v),
        },
    }
}
