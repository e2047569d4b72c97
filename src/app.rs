use crate::ports::Ports;
use crate::ports::store::StoreError;
use crate::state;
use crate::weather::ProviderError;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;

mod cors;
mod push;
mod subscriptions;
mod weather;

pub(crate) use cors::CorsPolicy;

pub fn app<P: Ports>(state: state::AppState<P>) -> Router {
    let cors = CorsPolicy::from_config(state.config.allowed_origin.as_deref());
    Router::new()
        .route(
            "/subscribe",
            post(subscriptions::subscribe::<P>).delete(subscriptions::unsubscribe::<P>),
        )
        .route("/subscribe/check", post(subscriptions::check::<P>))
        .route("/weather/search/{query}", get(weather::search::<P>))
        .route("/weather/city", get(weather::by_city::<P>))
        .route("/weather/coords", get(weather::by_coords::<P>))
        .route("/push/public-key", get(push::public_key::<P>))
        .route("/push/schedule", get(push::schedule::<P>))
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn_with_state(cors, cors::cors_middleware))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

#[derive(Serialize)]
pub(crate) struct SuccessResponse {
    pub(crate) success: bool,
}

/// Request failures and the status codes they answer with.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        source: ProviderError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub(crate) fn upstream(message: &'static str) -> impl FnOnce(ProviderError) -> Self {
        move |source| Self::Upstream { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            Self::Upstream { message, source } => {
                tracing::warn!(err = %source, "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
            Self::Store(err) => {
                tracing::error!(%err, "subscription store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
