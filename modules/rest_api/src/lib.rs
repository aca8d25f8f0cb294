//! Read-only HTTP resources over the mirrored ledger tables.
//!
//! Layout: `contract` holds plain models, `domain` turns request parameters
//! into query plans, `infra` runs them on Postgres, and `api::rest` renders
//! view models.

pub mod api;
pub mod contract;
pub mod domain;
pub mod infra;

use std::sync::Arc;

use axum::Router;
use mirror_kit::{not_found_fallback, with_http_layers, HttpLayers};

pub use domain::repo::{AccountKey, LedgerRepository};
pub use domain::service::{Service, ServiceConfig};
pub use infra::storage::PgLedgerRepository;

/// Complete application router: resources, health, OpenAPI document,
/// `_status`-shaped 404 fallback and the shared HTTP middleware.
pub fn build_router(service: Arc<Service>, layers: &HttpLayers) -> Router {
    let router = api::rest::routes::register_routes(Router::new(), service)
        .fallback(not_found_fallback);
    with_http_layers(router, layers)
}
