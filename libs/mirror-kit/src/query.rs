use std::convert::Infallible;

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;

/// Raw query parameters of a request, duplicates and order preserved.
///
/// Typed extraction (`Query<T>`) would collapse repeated keys like
/// `?account.id=gt:1&account.id=lt:9`, so resources take this instead and run
/// the pairs through their own filter schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiQuery {
    /// Path as the client sent it (before any nesting was stripped).
    pub path: String,
    /// Undecoded query string, if any.
    pub raw: Option<String>,
    /// Decoded `(key, value)` pairs.
    pub pairs: Vec<(String, String)>,
}

impl ApiQuery {
    pub fn from_uri(uri: &axum::http::Uri) -> Self {
        let raw = uri.query().filter(|q| !q.is_empty()).map(str::to_owned);
        let pairs = raw
            .as_deref()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            path: uri.path().to_string(),
            raw,
            pairs,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl<S> FromRequestParts<S> for ApiQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl core::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let uri = match parts.extensions.get::<OriginalUri>() {
                Some(OriginalUri(original)) => original.clone(),
                None => parts.uri.clone(),
            };
            Ok(ApiQuery::from_uri(&uri))
        }
    }
}
