use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mirror_core::BadParameters;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const INTERNAL_MESSAGE: &str = "Internal error";
pub const TIMEOUT_MESSAGE: &str = "Request timeout";

/// Error envelope shared by every non-2xx response:
/// `{"_status": {"messages": [{"message": "..."}]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(title = "Error")]
pub struct ErrorBody {
    #[serde(rename = "_status")]
    pub status: ErrorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorStatus {
    pub messages: Vec<ErrorMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorBody {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            status: ErrorStatus {
                messages: messages
                    .into_iter()
                    .map(|m| ErrorMessage { message: m.into() })
                    .collect(),
            },
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.status
            .messages
            .iter()
            .map(|m| m.message.as_str())
            .collect()
    }
}

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    BadParameters(#[from] BadParameters),

    #[error("not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,

    /// Cause is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        ApiError::Internal(cause.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadParameters(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadParameters(bad) => ErrorBody::new(bad.messages()),
            ApiError::NotFound => ErrorBody::new([NOT_FOUND_MESSAGE]),
            ApiError::Timeout => ErrorBody::new([TIMEOUT_MESSAGE]),
            ApiError::Internal(_) => ErrorBody::new([INTERNAL_MESSAGE]),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::BadParameters(bad) => {
                for p in bad.iter() {
                    tracing::debug!(field = %p.field, detail = %p.detail, "bad parameter");
                }
            }
            ApiError::NotFound => {}
            ApiError::Timeout => tracing::warn!("request timed out"),
            ApiError::Internal(cause) => tracing::error!(%cause, "request failed"),
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// Router fallback so unmatched paths get the same error shape.
pub async fn not_found_fallback() -> ApiError {
    ApiError::NotFound
}
