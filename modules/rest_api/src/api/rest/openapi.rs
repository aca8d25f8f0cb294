use axum::response::Json;
use mirror_core::Links;
use mirror_kit::{ErrorBody, ErrorMessage, ErrorStatus};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};

#[derive(OpenApi)]
#[openapi(
    info(title = "Mirror read API", description = "Read-only view of mirrored ledger state"),
    paths(
        handlers::list_accounts,
        handlers::get_account,
        handlers::list_tokens,
        handlers::list_topic_messages,
    ),
    components(schemas(
        dto::AccountDto,
        dto::AccountsResponse,
        dto::TimestampRangeDto,
        dto::TokenDto,
        dto::TokensResponse,
        dto::TopicMessageDto,
        dto::TopicMessagesResponse,
        Links,
        ErrorBody,
        ErrorStatus,
        ErrorMessage,
    )),
    tags(
        (name = "accounts"),
        (name = "tokens"),
        (name = "topics"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        let paths = doc["paths"].as_object().unwrap();
        for p in [
            "/api/v1/accounts",
            "/api/v1/accounts/{idOrEvmAddress}",
            "/api/v1/tokens",
            "/api/v1/topics/{topicId}/messages",
        ] {
            assert!(paths.contains_key(p), "missing {p}");
        }
        assert!(doc["components"]["schemas"]["ErrorBody"].is_object());
    }
}
