use std::ops::Bound;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mirror_core::{Links, Timestamp};
use mirror_db::Int8Range;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{Account, Token, TopicMessage};

/// Validity window of an entity version; `to` is null while current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimestampRangeDto {
    #[schema(example = "1700000000.000000001")]
    pub from: Option<String>,
    pub to: Option<String>,
}

impl From<Int8Range> for TimestampRangeDto {
    fn from(r: Int8Range) -> Self {
        // Half-open rendering: `from` inclusive, `to` exclusive.
        let from = match r.lower {
            Bound::Included(v) => Some(v),
            Bound::Excluded(v) => v.checked_add(1),
            Bound::Unbounded => None,
        };
        let to = match r.upper {
            Bound::Excluded(v) => Some(v),
            Bound::Included(v) => v.checked_add(1),
            Bound::Unbounded => None,
        };
        let render = |ns: i64| Timestamp::from_nanos(ns).to_string();
        Self {
            from: from.map(render),
            to: to.map(render),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountDto {
    #[schema(example = "0.0.1001")]
    pub account: String,
    /// Alias address if set, otherwise the long-zero address of `account`.
    #[schema(example = "0x00000000000000000000000000000000000003e9")]
    pub evm_address: String,
    pub balance: Option<i64>,
    pub memo: String,
    pub deleted: Option<bool>,
    pub created_timestamp: Option<String>,
    pub timestamp: TimestampRangeDto,
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        let evm_address = match &a.evm_address {
            Some(bytes) => format!("0x{}", hex::encode(bytes)),
            None => a.id.to_address(),
        };
        Self {
            account: a.id.to_string(),
            evm_address,
            balance: a.balance,
            memo: a.memo,
            deleted: a.deleted,
            created_timestamp: a.created_timestamp.map(|t| t.to_string()),
            timestamp: a.timestamp_range.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenDto {
    #[schema(example = "0.0.2001")]
    pub token_id: String,
    pub name: String,
    pub symbol: String,
    #[serde(rename = "type")]
    #[schema(example = "FUNGIBLE_COMMON")]
    pub token_type: String,
    pub decimals: i64,
}

impl From<Token> for TokenDto {
    fn from(t: Token) -> Self {
        Self {
            token_id: t.token_id.to_string(),
            name: t.name,
            symbol: t.symbol,
            token_type: t.token_type.as_str().to_string(),
            decimals: t.decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TopicMessageDto {
    #[schema(example = "1700000000.000000001")]
    pub consensus_timestamp: String,
    pub topic_id: String,
    pub sequence_number: i64,
    /// Base64.
    pub message: String,
    /// Base64.
    pub running_hash: String,
    pub running_hash_version: i32,
    pub payer_account_id: Option<String>,
}

impl From<TopicMessage> for TopicMessageDto {
    fn from(m: TopicMessage) -> Self {
        Self {
            consensus_timestamp: m.consensus_timestamp.to_string(),
            topic_id: m.topic_id.to_string(),
            sequence_number: m.sequence_number,
            message: STANDARD.encode(&m.message),
            running_hash: STANDARD.encode(&m.running_hash),
            running_hash_version: m.running_hash_version,
            payer_account_id: m.payer_account_id.map(|id| id.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountDto>,
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokensResponse {
    pub tokens: Vec<TokenDto>,
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TopicMessagesResponse {
    pub messages: Vec<TopicMessageDto>,
    pub links: Links,
}
