use std::sync::Arc;
use std::time::Duration;

use mirror_core::{EntityIdCache, EntityIdCodec, Identity, SortOrder};
use mirror_db::{LimitCfg, Page, QueryBuilder, QueryPlan, SqlExpr, SqlValue};
use tracing::{debug, instrument};

use crate::contract::model::{Account, Token, TopicMessage};
use crate::domain::error::DomainError;
use crate::domain::repo::{AccountKey, LedgerRepository};
use crate::domain::resources::{accounts, tokens, topic_messages};

pub type Result<T> = std::result::Result<T, DomainError>;

/// Read-API settings the server derives from its `api` config section.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub shard: u64,
    pub realm: u64,
    pub limits: LimitCfg,
    /// 0 disables identity memoization.
    pub cache_size: usize,
    pub cache_max_age: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            shard: 0,
            realm: 0,
            limits: LimitCfg::default(),
            cache_size: 100_000,
            cache_max_age: Duration::from_secs(1_800),
        }
    }
}

/// One page of a list resource and the order it was read in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing<T> {
    pub page: Page<T>,
    pub order: SortOrder,
}

impl<T> Listing<T> {
    fn from_rows(rows: Vec<T>, plan: &QueryPlan) -> Self {
        Self {
            page: Page::from_overfetch(rows, plan.limit),
            order: plan.order,
        }
    }

    pub fn is_last_page(&self) -> bool {
        !self.page.has_more
    }
}

/// Turns raw request parameters into plans and runs them against the repository.
pub struct Service {
    repo: Arc<dyn LedgerRepository>,
    codec: EntityIdCodec,
    limits: LimitCfg,
}

impl Service {
    pub fn new(repo: Arc<dyn LedgerRepository>, cfg: ServiceConfig) -> Result<Self> {
        let mut codec = EntityIdCodec::new(cfg.shard, cfg.realm)?;
        if let Some(cache) = EntityIdCache::from_settings(cfg.cache_size, cfg.cache_max_age) {
            codec = codec.with_cache(Arc::new(cache));
        }
        Ok(Self {
            repo,
            codec,
            limits: cfg.limits,
        })
    }

    pub fn codec(&self) -> &EntityIdCodec {
        &self.codec
    }

    fn plan(
        &self,
        schema: mirror_core::FilterSchema,
        columns: &mirror_db::ColumnMap,
        default_order: SortOrder,
        base: Option<SqlExpr>,
        params: &[(String, String)],
    ) -> Result<QueryPlan> {
        let filters = schema.parse(params, &self.codec)?;
        let mut builder = QueryBuilder::new(columns, default_order, self.limits);
        if let Some(expr) = base {
            builder = builder.with_condition(expr);
        }
        let plan = builder.build(&filters)?;
        debug!(predicate = %plan.predicate, limit = plan.limit, order = %plan.order, "query plan");
        Ok(plan)
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    pub async fn list_accounts(&self, params: &[(String, String)]) -> Result<Listing<Account>> {
        let plan = self.plan(
            accounts::schema(),
            &accounts::columns(),
            accounts::DEFAULT_ORDER,
            None,
            params,
        )?;
        let rows = self
            .repo
            .list_accounts(&plan)
            .await
            .map_err(DomainError::database)?;
        Ok(Listing::from_rows(rows, &plan))
    }

    /// `raw` may be a dotted id, a bare number, a long-zero address or a
    /// derived EVM address.
    #[instrument(skip(self))]
    pub async fn get_account(&self, raw: &str) -> Result<Account> {
        let key = match self
            .codec
            .parse_allow_derived(Some(raw), "idOrEvmAddress", false)?
        {
            Identity::Id(id) => AccountKey::Id(id),
            Identity::Derived(addr) => AccountKey::EvmAddress(addr),
            Identity::Null => return Err(DomainError::not_found("account")),
        };
        self.repo
            .find_account(key)
            .await
            .map_err(DomainError::database)?
            .ok_or_else(|| DomainError::not_found("account"))
    }

    #[instrument(skip(self, params), fields(params = params.len()))]
    pub async fn list_tokens(&self, params: &[(String, String)]) -> Result<Listing<Token>> {
        let plan = self.plan(
            tokens::schema(),
            &tokens::columns(),
            tokens::DEFAULT_ORDER,
            None,
            params,
        )?;
        let rows = self
            .repo
            .list_tokens(&plan)
            .await
            .map_err(DomainError::database)?;
        Ok(Listing::from_rows(rows, &plan))
    }

    /// Path and query parameter errors are reported together.
    #[instrument(skip(self, params), fields(params = params.len()))]
    pub async fn list_topic_messages(
        &self,
        topic: &str,
        params: &[(String, String)],
    ) -> Result<Listing<TopicMessage>> {
        let topic_id = self
            .codec
            .parse_id(topic, topic_messages::TOPIC_PATH_PARAM)
            .map_err(mirror_core::BadParameters::from);

        let base = topic_id
            .as_ref()
            .ok()
            .map(|id| SqlExpr::eq(topic_messages::TOPIC_ID, SqlValue::BigInt(id.packed())));
        let plan = self.plan(
            topic_messages::schema(),
            &topic_messages::columns(),
            topic_messages::DEFAULT_ORDER,
            base,
            params,
        );

        let plan = match (topic_id, plan) {
            (Ok(_), Ok(plan)) => plan,
            (Err(mut bad), Err(DomainError::BadParameters(more))) => {
                bad.extend(more);
                return Err(bad.into());
            }
            (Err(bad), _) => return Err(bad.into()),
            (Ok(_), Err(e)) => return Err(e),
        };

        let rows = self
            .repo
            .list_topic_messages(&plan)
            .await
            .map_err(DomainError::database)?;
        Ok(Listing::from_rows(rows, &plan))
    }
}
