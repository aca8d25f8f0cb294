#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use mirror_core::{EntityId, SortOrder, Timestamp};
use mirror_db::{Int8Range, QueryPlan, SqlValue};
use mirror_kit::HttpLayers;
use rest_api::contract::model::{Account, Token, TokenType, TopicMessage};
use rest_api::domain::resources::{accounts, tokens, topic_messages};
use rest_api::{AccountKey, LedgerRepository, Service, ServiceConfig};
use tower::ServiceExt;

/// Repository that evaluates query plans against rows held in memory, the
/// way Postgres would evaluate the rendered SQL.
#[derive(Default)]
pub struct MemoryRepo {
    pub accounts: Mutex<Vec<Account>>,
    pub tokens: Mutex<Vec<Token>>,
    pub messages: Mutex<Vec<TopicMessage>>,
    /// Every call fails while set.
    pub broken: AtomicBool,
}

fn select<T: Clone>(
    rows: &[T],
    plan: &QueryPlan,
    sort_key: impl Fn(&T) -> i64,
    column: impl Fn(&T, &str) -> Option<SqlValue>,
) -> Vec<T> {
    let mut out: Vec<T> = rows
        .iter()
        .filter(|row| plan.matches(&|c: &str| column(row, c)))
        .cloned()
        .collect();
    out.sort_by_key(|r| sort_key(r));
    if plan.order == SortOrder::Desc {
        out.reverse();
    }
    out.truncate(plan.fetch_limit() as usize);
    out
}

fn account_column(a: &Account, col: &str) -> Option<SqlValue> {
    match col {
        accounts::ID => Some(SqlValue::BigInt(a.id.packed())),
        accounts::BALANCE => a.balance.map(SqlValue::BigInt),
        accounts::EVM_ADDRESS => a.evm_address.clone().map(SqlValue::Bytes),
        accounts::TIMESTAMP_RANGE => Some(SqlValue::Int8Range(a.timestamp_range)),
        _ => None,
    }
}

fn token_column(t: &Token, col: &str) -> Option<SqlValue> {
    match col {
        tokens::ID => Some(SqlValue::BigInt(t.token_id.packed())),
        tokens::TYPE => Some(SqlValue::Text(t.token_type.as_str().to_string())),
        _ => None,
    }
}

fn message_column(m: &TopicMessage, col: &str) -> Option<SqlValue> {
    match col {
        topic_messages::TOPIC_ID => Some(SqlValue::BigInt(m.topic_id.packed())),
        topic_messages::SEQUENCE_NUMBER => Some(SqlValue::BigInt(m.sequence_number)),
        topic_messages::CONSENSUS_TIMESTAMP => {
            Some(SqlValue::BigInt(m.consensus_timestamp.nanos()))
        }
        _ => None,
    }
}

impl MemoryRepo {
    fn check(&self) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            bail!("connection refused (10.0.0.7:5432)");
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for MemoryRepo {
    async fn list_accounts(&self, plan: &QueryPlan) -> Result<Vec<Account>> {
        self.check()?;
        let rows = self.accounts.lock().unwrap();
        Ok(select(&rows, plan, |a| a.id.packed(), account_column))
    }

    async fn find_account(&self, key: AccountKey) -> Result<Option<Account>> {
        self.check()?;
        let rows = self.accounts.lock().unwrap();
        Ok(rows
            .iter()
            .find(|a| match key {
                AccountKey::Id(id) => a.id == id,
                AccountKey::EvmAddress(addr) => {
                    a.evm_address.as_deref() == Some(addr.as_bytes().as_slice())
                }
            })
            .cloned())
    }

    async fn list_tokens(&self, plan: &QueryPlan) -> Result<Vec<Token>> {
        self.check()?;
        let rows = self.tokens.lock().unwrap();
        Ok(select(&rows, plan, |t| t.token_id.packed(), token_column))
    }

    async fn list_topic_messages(&self, plan: &QueryPlan) -> Result<Vec<TopicMessage>> {
        self.check()?;
        let rows = self.messages.lock().unwrap();
        Ok(select(&rows, plan, |m| m.sequence_number, message_column))
    }
}

pub fn id(num: u64) -> EntityId {
    EntityId::new(0, 0, num).unwrap()
}

pub fn account(num: u64, balance: i64, valid_from: i64) -> Account {
    Account {
        id: id(num),
        evm_address: None,
        balance: Some(balance),
        memo: String::new(),
        deleted: Some(false),
        created_timestamp: Some(Timestamp::from_nanos(valid_from)),
        timestamp_range: Int8Range::half_open(valid_from, None),
    }
}

pub fn token(num: u64, token_type: TokenType) -> Token {
    Token {
        token_id: id(num),
        name: format!("token {num}"),
        symbol: format!("T{num}"),
        token_type,
        decimals: 2,
    }
}

pub fn message(topic: u64, seq: i64) -> TopicMessage {
    TopicMessage {
        consensus_timestamp: Timestamp::from_nanos(1_000 + seq),
        topic_id: id(topic),
        sequence_number: seq,
        message: format!("msg {seq}").into_bytes(),
        running_hash: vec![seq as u8; 4],
        running_hash_version: 3,
        payer_account_id: Some(id(2)),
    }
}

pub fn app_with(repo: Arc<MemoryRepo>, cfg: ServiceConfig) -> Router {
    let service = Service::new(repo, cfg).unwrap();
    rest_api::build_router(Arc::new(service), &HttpLayers::default())
}

pub fn app(repo: Arc<MemoryRepo>) -> Router {
    app_with(repo, ServiceConfig::default())
}

/// GET `uri` and return status plus parsed JSON body.
pub async fn get(app: &Router, uri: &str) -> (axum::http::StatusCode, serde_json::Value) {
    let resp = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}
