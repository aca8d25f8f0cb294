use sqlx::postgres::types::PgRange;

/// `entity` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub evm_address: Option<Vec<u8>>,
    pub balance: Option<i64>,
    pub memo: String,
    pub deleted: Option<bool>,
    pub created_timestamp: Option<i64>,
    pub timestamp_range: PgRange<i64>,
}

pub const ACCOUNT_SELECT: &str = "select e.id, e.evm_address, e.balance, e.memo, e.deleted, \
     e.created_timestamp, e.timestamp_range from entity e";

/// `token` row; `type` is a Postgres enum read as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRow {
    pub token_id: i64,
    pub name: String,
    pub symbol: String,
    #[sqlx(rename = "type")]
    pub token_type: String,
    pub decimals: i64,
}

pub const TOKEN_SELECT: &str =
    "select t.token_id, t.name, t.symbol, t.type::text as type, t.decimals from token t";

/// `topic_message` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicMessageRow {
    pub consensus_timestamp: i64,
    pub topic_id: i64,
    pub sequence_number: i64,
    pub message: Vec<u8>,
    pub running_hash: Vec<u8>,
    pub running_hash_version: i32,
    pub payer_account_id: Option<i64>,
}

pub const TOPIC_MESSAGE_SELECT: &str = "select m.consensus_timestamp, m.topic_id, \
     m.sequence_number, m.message, m.running_hash, m.running_hash_version, \
     m.payer_account_id from topic_message m";

/// DDL for the tables above; used by integration tests and local setups.
pub const SCHEMA: &str = r#"
do $$ begin
    create type token_type as enum ('FUNGIBLE_COMMON', 'NON_FUNGIBLE_UNIQUE');
exception when duplicate_object then null;
end $$;

create table if not exists entity (
    id                bigint primary key,
    evm_address       bytea,
    balance           bigint,
    memo              text not null default '',
    deleted           boolean,
    created_timestamp bigint,
    timestamp_range   int8range not null
);

create table if not exists token (
    token_id bigint primary key,
    name     varchar(100) not null,
    symbol   varchar(100) not null,
    type     token_type not null,
    decimals bigint not null
);

create table if not exists topic_message (
    consensus_timestamp  bigint primary key,
    topic_id             bigint not null,
    sequence_number      bigint not null,
    message              bytea not null,
    running_hash         bytea not null,
    running_hash_version int not null,
    payer_account_id     bigint
);
"#;
