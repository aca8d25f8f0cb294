use anyhow::{anyhow, Result};
use mirror_core::{EntityId, Timestamp};

use crate::contract::model::{Account, Token, TokenType, TopicMessage};
use crate::infra::storage::entity::{AccountRow, TokenRow, TopicMessageRow};

fn entity_id(column: &str, packed: i64) -> Result<EntityId> {
    EntityId::from_packed(packed).ok_or_else(|| anyhow!("{column}: bad encoded id {packed}"))
}

pub fn account_from_row(row: AccountRow) -> Result<Account> {
    Ok(Account {
        id: entity_id("entity.id", row.id)?,
        evm_address: row.evm_address,
        balance: row.balance,
        memo: row.memo,
        deleted: row.deleted,
        created_timestamp: row.created_timestamp.map(Timestamp::from_nanos),
        timestamp_range: row.timestamp_range.into(),
    })
}

pub fn token_from_row(row: TokenRow) -> Result<Token> {
    Ok(Token {
        token_id: entity_id("token.token_id", row.token_id)?,
        token_type: TokenType::parse(&row.token_type)
            .ok_or_else(|| anyhow!("token.type: unknown value {}", row.token_type))?,
        name: row.name,
        symbol: row.symbol,
        decimals: row.decimals,
    })
}

pub fn topic_message_from_row(row: TopicMessageRow) -> Result<TopicMessage> {
    Ok(TopicMessage {
        consensus_timestamp: Timestamp::from_nanos(row.consensus_timestamp),
        topic_id: entity_id("topic_message.topic_id", row.topic_id)?,
        sequence_number: row.sequence_number,
        message: row.message,
        running_hash: row.running_hash,
        running_hash_version: row.running_hash_version,
        payer_account_id: row
            .payer_account_id
            .map(|p| entity_id("topic_message.payer_account_id", p))
            .transpose()?,
    })
}
