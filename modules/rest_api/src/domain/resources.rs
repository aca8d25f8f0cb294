//! Per-resource query parameters and the columns they filter on.
//!
//! Column names are shared by the Postgres adapter (SQL text) and any
//! in-memory repository that evaluates plans with [`mirror_db::SqlExpr::matches`].

use mirror_core::{FieldRule, FilterSchema, SortOrder};
use mirror_db::ColumnMap;

use crate::contract::model::TokenType;

pub mod accounts {
    use super::*;

    pub const ID_PARAM: &str = "account.id";
    pub const BALANCE_PARAM: &str = "account.balance";
    pub const TIMESTAMP_PARAM: &str = "timestamp";

    pub const ID: &str = "e.id";
    pub const BALANCE: &str = "e.balance";
    pub const EVM_ADDRESS: &str = "e.evm_address";
    pub const TIMESTAMP_RANGE: &str = "e.timestamp_range";

    pub const DEFAULT_ORDER: SortOrder = SortOrder::Asc;

    pub fn schema() -> FilterSchema {
        FilterSchema::closed()
            .field(ID_PARAM, FieldRule::EntityId)
            .field(BALANCE_PARAM, FieldRule::Integer { min: 0 })
            .field(TIMESTAMP_PARAM, FieldRule::Timestamp)
            .paged()
    }

    pub fn columns() -> ColumnMap {
        ColumnMap::new()
            .scalar(ID_PARAM, ID)
            .scalar(BALANCE_PARAM, BALANCE)
            .range(TIMESTAMP_PARAM, TIMESTAMP_RANGE)
    }
}

pub mod tokens {
    use super::*;

    pub const ID_PARAM: &str = "token.id";
    pub const TYPE_PARAM: &str = "type";

    pub const ID: &str = "t.token_id";
    pub const TYPE: &str = "t.type::text";

    pub const DEFAULT_ORDER: SortOrder = SortOrder::Asc;

    pub fn schema() -> FilterSchema {
        FilterSchema::closed()
            .field(ID_PARAM, FieldRule::EntityId)
            .field(TYPE_PARAM, FieldRule::OneOf(TokenType::ALL))
            .paged()
    }

    pub fn columns() -> ColumnMap {
        ColumnMap::new().scalar(ID_PARAM, ID).scalar(TYPE_PARAM, TYPE)
    }
}

pub mod topic_messages {
    use super::*;

    pub const SEQUENCE_PARAM: &str = "sequencenumber";
    pub const TIMESTAMP_PARAM: &str = "timestamp";
    pub const TOPIC_PATH_PARAM: &str = "topicId";

    pub const TOPIC_ID: &str = "m.topic_id";
    pub const SEQUENCE_NUMBER: &str = "m.sequence_number";
    pub const CONSENSUS_TIMESTAMP: &str = "m.consensus_timestamp";

    pub const DEFAULT_ORDER: SortOrder = SortOrder::Asc;

    /// Open: parameters it does not know are ignored.
    pub fn schema() -> FilterSchema {
        FilterSchema::open()
            .field(SEQUENCE_PARAM, FieldRule::Integer { min: 1 })
            .field(TIMESTAMP_PARAM, FieldRule::Timestamp)
            .paged()
    }

    pub fn columns() -> ColumnMap {
        ColumnMap::new()
            .scalar(SEQUENCE_PARAM, SEQUENCE_NUMBER)
            .scalar(TIMESTAMP_PARAM, CONSENSUS_TIMESTAMP)
    }
}
