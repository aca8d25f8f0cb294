//! HTTP kit for the mirror API: error envelope, raw query extraction and the
//! request-id/trace middleware stack.

pub mod error;
pub mod layers;
pub mod query;
pub mod request_id;

pub use error::{not_found_fallback, ApiError, ErrorBody, ErrorMessage, ErrorStatus};
pub use layers::{with_http_layers, HttpLayers};
pub use query::ApiQuery;
pub use request_id::XRequestId;
