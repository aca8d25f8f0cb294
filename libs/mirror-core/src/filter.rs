//! `operator:value` query parameter grammar.
//!
//! A raw value is either bare (`5`, implicit `eq`) or `op:value` with `op` one
//! of `eq ne lt lte gt gte`. A leading token that is not an operator stays part
//! of the value; more than one colon is always rejected.
//!
//! [`FilterSchema`] runs every parameter of a request through its field rule and
//! collects *all* failures into one [`BadParameters`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity_id::{EntityId, EntityIdCodec, Identity};
use crate::error::{BadParameters, FilterError, InvalidParam};
use crate::timestamp::Timestamp;

pub const LIMIT: &str = "limit";
pub const ORDER: &str = "order";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            _ => return None,
        })
    }

    /// SQL comparison symbol.
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Strict operator that moves past the cursor in this direction.
    pub fn continuation_operator(&self) -> Operator {
        match self {
            SortOrder::Asc => Operator::Gt,
            SortOrder::Desc => Operator::Lt,
        }
    }

    /// Whether `op` bounds the anchor in the direction of travel.
    pub fn is_continuation(&self, op: Operator) -> bool {
        match self {
            SortOrder::Asc => matches!(op, Operator::Gt | Operator::Gte),
            SortOrder::Desc => matches!(op, Operator::Lt | Operator::Lte),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Timestamp(Timestamp),
    Id(EntityId),
    Text(String),
    Order(SortOrder),
}

impl FilterValue {
    /// Numeric storage form: ints as-is, timestamps in ns, ids packed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Int(v) => Some(*v),
            FilterValue::Timestamp(ts) => Some(ts.nanos()),
            FilterValue::Id(id) => Some(id.packed()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFilter {
    pub key: String,
    pub operator: Operator,
    pub value: FilterValue,
}

/// Split `raw` into operator and value.
pub fn tokenize(raw: &str) -> Result<(Operator, &str), FilterError> {
    if raw.is_empty() {
        return Err(FilterError::EmptyValue);
    }
    let Some((head, tail)) = raw.split_once(':') else {
        return Ok((Operator::Eq, raw));
    };
    if tail.contains(':') {
        return Err(FilterError::Malformed(raw.to_string()));
    }
    match Operator::from_token(head) {
        Some(_) if tail.is_empty() => Err(FilterError::EmptyValue),
        Some(op) => Ok((op, tail)),
        None => Ok((Operator::Eq, raw)),
    }
}

/// Validation applied to one query parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRule {
    /// `shard.realm.num` in any non-derived form.
    EntityId,
    Integer { min: i64 },
    Timestamp,
    /// Case-insensitive enumeration; only `eq`/`ne`.
    OneOf(&'static [&'static str]),
    /// Positive page size; `eq` only.
    Limit,
    /// `asc`/`desc`; `eq` only.
    Order,
}

impl FieldRule {
    fn allows(&self, op: Operator) -> bool {
        match self {
            FieldRule::Limit | FieldRule::Order => op == Operator::Eq,
            FieldRule::OneOf(_) => matches!(op, Operator::Eq | Operator::Ne),
            _ => true,
        }
    }

    fn validate(
        &self,
        key: &str,
        value: &str,
        codec: &EntityIdCodec,
    ) -> Result<FilterValue, InvalidParam> {
        let invalid = |detail: &str| InvalidParam::invalid(key, format!("{detail}: '{value}'"));
        match self {
            FieldRule::EntityId => match codec.parse(Some(value), key, false)? {
                Identity::Id(id) => Ok(FilterValue::Id(id)),
                _ => Err(invalid("not an entity id")),
            },
            FieldRule::Integer { min } => match value.parse::<i64>() {
                Ok(v) if v >= *min => Ok(FilterValue::Int(v)),
                _ => Err(invalid("not an integer in range")),
            },
            FieldRule::Timestamp => Timestamp::parse(value)
                .map(FilterValue::Timestamp)
                .ok_or_else(|| invalid("not a timestamp")),
            FieldRule::OneOf(allowed) => allowed
                .iter()
                .find(|a| a.eq_ignore_ascii_case(value))
                .map(|a| FilterValue::Text((*a).to_string()))
                .ok_or_else(|| invalid("unsupported value")),
            FieldRule::Limit => match value.parse::<i64>() {
                Ok(v) if v > 0 => Ok(FilterValue::Int(v)),
                _ => Err(invalid("not a positive integer")),
            },
            FieldRule::Order => SortOrder::parse(value)
                .map(FilterValue::Order)
                .ok_or_else(|| invalid("not asc or desc")),
        }
    }
}

/// Accepted parameters of one resource.
#[derive(Clone, Debug)]
pub struct FilterSchema {
    fields: Vec<(&'static str, FieldRule)>,
    closed: bool,
}

impl FilterSchema {
    /// Unknown keys are ignored.
    pub fn open() -> Self {
        Self {
            fields: Vec::new(),
            closed: false,
        }
    }

    /// Unknown keys are bad parameters.
    pub fn closed() -> Self {
        Self {
            fields: Vec::new(),
            closed: true,
        }
    }

    pub fn field(mut self, key: &'static str, rule: FieldRule) -> Self {
        self.fields.push((key, rule));
        self
    }

    /// Adds the `limit` and `order` parameters every list resource accepts.
    pub fn paged(self) -> Self {
        self.field(LIMIT, FieldRule::Limit)
            .field(ORDER, FieldRule::Order)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn rule(&self, key: &str) -> Option<FieldRule> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, rule)| *rule)
    }

    /// Parse every `(key, raw)` pair in request order.
    ///
    /// Repeated keys produce repeated filters. Failures are collected so the
    /// caller can report all of them at once.
    pub fn parse(
        &self,
        pairs: &[(String, String)],
        codec: &EntityIdCodec,
    ) -> Result<Vec<ParsedFilter>, BadParameters> {
        let mut out = Vec::with_capacity(pairs.len());
        let mut bad = BadParameters::new();

        for (raw_key, raw_value) in pairs {
            let key = raw_key.to_ascii_lowercase();
            let Some(rule) = self.rule(&key) else {
                if self.closed {
                    bad.push(InvalidParam::unknown(key));
                }
                continue;
            };

            let (operator, value) = match tokenize(raw_value) {
                Ok(t) => t,
                Err(e) => {
                    bad.push(InvalidParam::invalid(key, e.to_string()));
                    continue;
                }
            };
            if !rule.allows(operator) {
                bad.push(InvalidParam::invalid(
                    key,
                    format!("operator {operator} not supported"),
                ));
                continue;
            }

            match rule.validate(&key, value, codec) {
                Ok(value) => out.push(ParsedFilter {
                    key,
                    operator,
                    value,
                }),
                Err(e) => bad.push(e),
            }
        }

        bad.into_result(out)
    }
}
