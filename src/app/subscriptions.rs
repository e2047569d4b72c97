use super::{ApiError, SuccessResponse};
use crate::location::Location;
use crate::next_notification::compute_next;
use crate::ports::Ports;
use crate::ports::store::SubscriptionStore;
use crate::ports::time::TimeProvider;
use crate::state;
use crate::types::push::{PushKeys, Subscription};

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct PushSubscriptionBody {
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    #[serde(default)]
    pub(crate) keys: Option<PushKeys>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubscribeRequest {
    #[serde(default)]
    pub(crate) subscription: Option<PushSubscriptionBody>,
    #[serde(default)]
    pub(crate) location: Option<String>,
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EndpointRequest {
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct CheckResponse {
    pub(crate) subscribed: bool,
    pub(crate) location: String,
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(body)| body)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

fn required_endpoint(endpoint: Option<String>) -> Result<String, ApiError> {
    endpoint
        .map(|endpoint| endpoint.trim().to_string())
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing endpoint".to_string()))
}

pub(crate) async fn subscribe<P: Ports>(
    State(state): State<state::AppState<P>>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    let request = parse_body(body)?;
    let (endpoint, keys) = match request.subscription {
        Some(PushSubscriptionBody {
            endpoint: Some(endpoint),
            keys: Some(keys),
        }) if !endpoint.trim().is_empty() => (endpoint.trim().to_string(), keys),
        _ => return Err(ApiError::Validation("Invalid subscription format".to_string())),
    };
    let location = request
        .location
        .as_deref()
        .map(Location::parse)
        .filter(|location| !location.is_empty())
        .ok_or_else(|| ApiError::Validation("Missing location".to_string()))?;
    let user_id = request
        .user_id
        .map(|user_id| user_id.trim().to_string())
        .filter(|user_id| !user_id.is_empty());

    let notifier = &state.notifier;
    let now = notifier.time().now();
    let existing = notifier.store().find_by_endpoint(&endpoint)?;
    let created_at = existing
        .as_ref()
        .map(|existing| existing.created_at)
        .unwrap_or(now);
    let timezone = existing
        .filter(|existing| existing.location == location)
        .and_then(|existing| existing.timezone);

    let subscription = Subscription {
        endpoint,
        keys,
        user_id,
        next_notification_time: compute_next(now, timezone.as_deref().unwrap_or("UTC")),
        location,
        created_at,
        last_notified: None,
        timezone,
    };
    notifier.store().upsert(subscription.clone())?;
    tracing::info!(
        endpoint = %subscription.endpoint,
        location = %subscription.location,
        "subscription saved"
    );

    let outcome = notifier.notify(&subscription).await;
    tracing::debug!(endpoint = %subscription.endpoint, ?outcome, "welcome notification sent");

    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

pub(crate) async fn unsubscribe<P: Ports>(
    State(state): State<state::AppState<P>>,
    body: Result<Json<EndpointRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let endpoint = required_endpoint(parse_body(body)?.endpoint)?;
    if !state.notifier.store().delete(&endpoint)? {
        return Err(ApiError::NotFound("Subscription not found"));
    }

    tracing::info!(%endpoint, "subscription removed");
    Ok(Json(SuccessResponse { success: true }))
}

pub(crate) async fn check<P: Ports>(
    State(state): State<state::AppState<P>>,
    body: Result<Json<EndpointRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let endpoint = required_endpoint(parse_body(body)?.endpoint)?;
    let response = match state.notifier.store().find_by_endpoint(&endpoint)? {
        Some(subscription) => Json(CheckResponse {
            subscribed: true,
            location: subscription.location.as_str().to_string(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    };
    Ok(response)
}
