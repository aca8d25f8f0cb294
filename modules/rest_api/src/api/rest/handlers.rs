use std::sync::Arc;

use axum::{extract::Path, response::Json, Extension};
use mirror_core::{next_link, Links};
use mirror_kit::{ApiError, ApiQuery, ErrorBody};
use serde_json::{json, Value};
use tracing::debug;

use crate::api::rest::dto::{
    AccountDto, AccountsResponse, TokenDto, TokensResponse, TopicMessageDto,
    TopicMessagesResponse,
};
use crate::domain::resources::{accounts, tokens, topic_messages};
use crate::domain::service::{Listing, Service};

/// `links.next` for `listing`, anchored at the last item it holds.
fn links<T>(
    query: &ApiQuery,
    listing: &Listing<T>,
    anchor_field: &str,
    anchor: impl Fn(&T) -> String,
) -> Links {
    let next = listing.page.items.last().and_then(|last| {
        next_link(
            &query.path,
            query.query(),
            listing.is_last_page(),
            anchor_field,
            &anchor(last),
            listing.order,
        )
    });
    Links { next }
}

/// List accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    params(
        ("account.id" = Option<String>, Query, description = "Entity id, optionally prefixed by an operator (`gt:0.0.5`); repeatable"),
        ("account.balance" = Option<String>, Query, description = "Balance in tinybars with optional operator"),
        ("timestamp" = Option<String>, Query, description = "`seconds[.nanos]` with optional operator"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("order" = Option<String>, Query, description = "`asc` or `desc`"),
    ),
    responses(
        (status = 200, description = "One page of accounts", body = AccountsResponse),
        (status = 400, description = "Invalid parameter", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn list_accounts(
    Extension(svc): Extension<Arc<Service>>,
    query: ApiQuery,
) -> Result<Json<AccountsResponse>, ApiError> {
    debug!(query = ?query.raw, "list accounts");
    let listing = svc.list_accounts(&query.pairs).await?;
    let links = links(&query, &listing, accounts::ID_PARAM, |a| a.id.to_string());
    Ok(Json(AccountsResponse {
        accounts: listing.page.items.into_iter().map(AccountDto::from).collect(),
        links,
    }))
}

/// Get one account
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{idOrEvmAddress}",
    tag = "accounts",
    params(
        ("idOrEvmAddress" = String, Path, description = "`shard.realm.num`, number, or 40 hex digit EVM address"),
    ),
    responses(
        (status = 200, description = "Account", body = AccountDto),
        (status = 400, description = "Invalid parameter", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn get_account(
    Extension(svc): Extension<Arc<Service>>,
    Path(id_or_address): Path<String>,
) -> Result<Json<AccountDto>, ApiError> {
    let account = svc.get_account(&id_or_address).await?;
    Ok(Json(AccountDto::from(account)))
}

/// List tokens
#[utoipa::path(
    get,
    path = "/api/v1/tokens",
    tag = "tokens",
    params(
        ("token.id" = Option<String>, Query, description = "Token id with optional operator; repeatable"),
        ("type" = Option<String>, Query, description = "`FUNGIBLE_COMMON` or `NON_FUNGIBLE_UNIQUE`, `eq`/`ne` only"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("order" = Option<String>, Query, description = "`asc` or `desc`"),
    ),
    responses(
        (status = 200, description = "One page of tokens", body = TokensResponse),
        (status = 400, description = "Invalid parameter", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn list_tokens(
    Extension(svc): Extension<Arc<Service>>,
    query: ApiQuery,
) -> Result<Json<TokensResponse>, ApiError> {
    debug!(query = ?query.raw, "list tokens");
    let listing = svc.list_tokens(&query.pairs).await?;
    let links = links(&query, &listing, tokens::ID_PARAM, |t| t.token_id.to_string());
    Ok(Json(TokensResponse {
        tokens: listing.page.items.into_iter().map(TokenDto::from).collect(),
        links,
    }))
}

/// List messages of a topic
#[utoipa::path(
    get,
    path = "/api/v1/topics/{topicId}/messages",
    tag = "topics",
    params(
        ("topicId" = String, Path, description = "Topic entity id"),
        ("sequencenumber" = Option<String>, Query, description = "Sequence number with optional operator"),
        ("timestamp" = Option<String>, Query, description = "Consensus timestamp with optional operator"),
        ("limit" = Option<u64>, Query, description = "Page size"),
        ("order" = Option<String>, Query, description = "`asc` or `desc`"),
    ),
    responses(
        (status = 200, description = "One page of messages", body = TopicMessagesResponse),
        (status = 400, description = "Invalid parameter", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    )
)]
pub async fn list_topic_messages(
    Extension(svc): Extension<Arc<Service>>,
    Path(topic_id): Path<String>,
    query: ApiQuery,
) -> Result<Json<TopicMessagesResponse>, ApiError> {
    debug!(%topic_id, query = ?query.raw, "list topic messages");
    let listing = svc.list_topic_messages(&topic_id, &query.pairs).await?;
    let links = links(&query, &listing, topic_messages::SEQUENCE_PARAM, |m| {
        m.sequence_number.to_string()
    });
    Ok(Json(TopicMessagesResponse {
        messages: listing
            .page
            .items
            .into_iter()
            .map(TopicMessageDto::from)
            .collect(),
        links,
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
