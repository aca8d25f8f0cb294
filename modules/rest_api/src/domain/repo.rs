use async_trait::async_trait;
use mirror_core::{DerivedAddress, EntityId};
use mirror_db::QueryPlan;

use crate::contract::model::{Account, Token, TopicMessage};

/// How an account is looked up by the single-account route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKey {
    Id(EntityId),
    EvmAddress(DerivedAddress),
}

/// Storage port of the read API.
///
/// List methods execute `plan` as given and return up to
/// `plan.fetch_limit()` rows in `plan.order`; trimming the extra row is the
/// caller's job.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn list_accounts(&self, plan: &QueryPlan) -> anyhow::Result<Vec<Account>>;

    async fn find_account(&self, key: AccountKey) -> anyhow::Result<Option<Account>>;

    async fn list_tokens(&self, plan: &QueryPlan) -> anyhow::Result<Vec<Token>>;

    /// `plan` already carries the topic condition.
    async fn list_topic_messages(&self, plan: &QueryPlan) -> anyhow::Result<Vec<TopicMessage>>;
}
