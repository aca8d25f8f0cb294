use std::time::Duration;

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{from_fn, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

use crate::error::ApiError;
use crate::request_id::{self, MakeReqId};

/// Knobs for [`with_http_layers`].
#[derive(Clone, Debug)]
pub struct HttpLayers {
    /// `None` disables the per-request timeout.
    pub timeout: Option<Duration>,
    pub cors: bool,
    pub body_limit: usize,
}

impl Default for HttpLayers {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            cors: true,
            body_limit: 64 * 1024,
        }
    }
}

/// Gives the bare 408 from [`TimeoutLayer`] the usual error envelope.
async fn timeout_envelope(req: Request, next: Next) -> Response {
    let resp = next.run(req).await;
    if resp.status() == StatusCode::REQUEST_TIMEOUT {
        return ApiError::Timeout.into_response();
    }
    resp
}

/// Wrap `router` in the standard middleware stack.
///
/// `Router::layer` wraps what is already there, so the last layer added runs
/// first. Resulting order, outermost first:
/// SetRequestId → PropagateRequestId → Trace → push_req_id_to_extensions →
/// timeout_envelope → Timeout → CORS → BodyLimit → handler.
pub fn with_http_layers<S>(router: Router<S>, cfg: &HttpLayers) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let x_request_id = request_id::header();

    let mut router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit));
    if cfg.cors {
        router = router.layer(CorsLayer::permissive());
    }
    if let Some(timeout) = cfg.timeout {
        router = router
            .layer(TimeoutLayer::new(timeout))
            .layer(from_fn(timeout_envelope));
    }
    router
        .layer(from_fn(request_id::push_req_id_to_extensions))
        .layer(request_id::create_trace_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Extension};
    use tower::ServiceExt;

    async fn echo(Extension(rid): Extension<request_id::XRequestId>) -> String {
        rid.0
    }

    fn app() -> Router {
        with_http_layers(Router::new().route("/", get(echo)), &HttpLayers::default())
    }

    #[tokio::test]
    async fn generates_request_id_when_missing() {
        let resp = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let header = resp
            .headers()
            .get(request_id::REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(header.len(), 21);
        assert_eq!(&body[..], header.as_bytes());
    }

    #[tokio::test]
    async fn timeout_uses_error_envelope() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }
        let cfg = HttpLayers {
            timeout: Some(Duration::from_millis(20)),
            ..HttpLayers::default()
        };
        let resp = with_http_layers(Router::new().route("/", get(slow)), &cfg)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
        assert!(resp.headers().contains_key(request_id::REQUEST_ID_HEADER));
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: crate::ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.messages(), vec![crate::error::TIMEOUT_MESSAGE]);
    }

    #[tokio::test]
    async fn propagates_client_request_id() {
        let resp = app()
            .oneshot(
                Request::get("/")
                    .header(request_id::REQUEST_ID_HEADER, "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get(request_id::REQUEST_ID_HEADER).unwrap(),
            "abc-123"
        );
    }
}
