use mirror_core::{EntityId, Timestamp};
use mirror_db::Int8Range;

/// Account or contract entity as stored (no serde).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: EntityId,
    pub evm_address: Option<Vec<u8>>,
    pub balance: Option<i64>,
    pub memo: String,
    pub deleted: Option<bool>,
    pub created_timestamp: Option<Timestamp>,
    /// Validity of this version of the row, `[from, to)` in ns.
    pub timestamp_range: Int8Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    FungibleCommon,
    NonFungibleUnique,
}

impl TokenType {
    pub const ALL: &'static [&'static str] = &["FUNGIBLE_COMMON", "NON_FUNGIBLE_UNIQUE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::FungibleCommon => "FUNGIBLE_COMMON",
            TokenType::NonFungibleUnique => "NON_FUNGIBLE_UNIQUE",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "FUNGIBLE_COMMON" => Some(TokenType::FungibleCommon),
            "NON_FUNGIBLE_UNIQUE" => Some(TokenType::NonFungibleUnique),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_id: EntityId,
    pub name: String,
    pub symbol: String,
    pub token_type: TokenType,
    pub decimals: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    pub consensus_timestamp: Timestamp,
    pub topic_id: EntityId,
    pub sequence_number: i64,
    pub message: Vec<u8>,
    pub running_hash: Vec<u8>,
    pub running_hash_version: i32,
    pub payer_account_id: Option<EntityId>,
}
