use anyhow::{Context, Result};
use async_trait::async_trait;
use mirror_db::{DbHandle, QueryPlan, SqlExpr, SqlValue};

use crate::contract::model::{Account, Token, TopicMessage};
use crate::domain::repo::{AccountKey, LedgerRepository};
use crate::domain::resources::{accounts, tokens, topic_messages};
use crate::infra::storage::entity::{
    AccountRow, TokenRow, TopicMessageRow, ACCOUNT_SELECT, TOKEN_SELECT, TOPIC_MESSAGE_SELECT,
};
use crate::infra::storage::mapper;

/// [`LedgerRepository`] over the mirror Postgres schema.
#[derive(Clone)]
pub struct PgLedgerRepository {
    db: DbHandle,
}

impl PgLedgerRepository {
    pub fn new(db: DbHandle) -> Self {
        Self { db }
    }

    async fn list<R, T>(
        &self,
        what: &'static str,
        select: &str,
        order_by: &str,
        plan: &QueryPlan,
        map: fn(R) -> Result<T>,
    ) -> Result<Vec<T>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let (sql, params) = plan.to_sql(select, order_by);
        let rows: Vec<R> = self
            .db
            .fetch_all(&sql, &params)
            .await
            .with_context(|| format!("list {what}"))?;
        rows.into_iter().map(map).collect()
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn list_accounts(&self, plan: &QueryPlan) -> Result<Vec<Account>> {
        self.list::<AccountRow, _>(
            "accounts",
            ACCOUNT_SELECT,
            accounts::ID,
            plan,
            mapper::account_from_row,
        )
        .await
    }

    async fn find_account(&self, key: AccountKey) -> Result<Option<Account>> {
        let cond = match key {
            AccountKey::Id(id) => SqlExpr::eq(accounts::ID, SqlValue::BigInt(id.packed())),
            AccountKey::EvmAddress(addr) => {
                SqlExpr::eq(accounts::EVM_ADDRESS, SqlValue::Bytes(addr.as_bytes().to_vec()))
            }
        };
        let mut params = Vec::new();
        let sql = format!("{ACCOUNT_SELECT} where {}", cond.render(&mut params));
        let row: Option<AccountRow> = self
            .db
            .fetch_optional(&sql, &params)
            .await
            .with_context(|| format!("find account {key:?}"))?;
        row.map(mapper::account_from_row).transpose()
    }

    async fn list_tokens(&self, plan: &QueryPlan) -> Result<Vec<Token>> {
        self.list::<TokenRow, _>("tokens", TOKEN_SELECT, tokens::ID, plan, mapper::token_from_row)
            .await
    }

    async fn list_topic_messages(&self, plan: &QueryPlan) -> Result<Vec<TopicMessage>> {
        self.list::<TopicMessageRow, _>(
            "topic messages",
            TOPIC_MESSAGE_SELECT,
            topic_messages::SEQUENCE_NUMBER,
            plan,
            mapper::topic_message_from_row,
        )
        .await
    }
}
