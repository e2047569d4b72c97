use axum::body::Body;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, VARY,
};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, Default)]
pub(crate) struct CorsPolicy {
    allowed_origin: Option<HeaderValue>,
}

impl CorsPolicy {
    pub(crate) fn from_config(allowed_origin: Option<&str>) -> Self {
        let allowed_origin = allowed_origin
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .and_then(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(origin, %err, "ignoring invalid allowed origin");
                    None
                }
            });
        Self { allowed_origin }
    }
}

/// Adds CORS headers for the configured origin and answers preflight
/// requests without reaching the routes.
pub(crate) async fn cors_middleware(
    State(policy): State<CorsPolicy>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(origin) = policy.allowed_origin else {
        return next.run(req).await;
    };

    let mut response = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, DELETE"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(VARY, HeaderValue::from_static("origin"));
    response
}
