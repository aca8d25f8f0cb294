use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::api::rest::{handlers, openapi};
use crate::domain::service::Service;

pub const API_PREFIX: &str = "/api/v1";

/// Resource routes under [`API_PREFIX`].
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let api = Router::new()
        .route("/accounts", get(handlers::list_accounts))
        .route("/accounts/{idOrEvmAddress}", get(handlers::get_account))
        .route("/tokens", get(handlers::list_tokens))
        .route("/topics/{topicId}/messages", get(handlers::list_topic_messages))
        .route("/docs/openapi.json", get(openapi::openapi_json))
        .layer(Extension(service));

    router
        .route("/health", get(handlers::health_check))
        .nest(API_PREFIX, api)
}
