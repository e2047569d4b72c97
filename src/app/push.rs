use super::ApiError;
use crate::ports::Ports;
use crate::ports::store::SubscriptionStore;
use crate::ports::time::TimeProvider;
use crate::push::ScheduleStatus;
use crate::state;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use time::OffsetDateTime;

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn public_key<P: Ports>(
    State(state): State<state::AppState<P>>,
) -> Json<PublicKeyResponse> {
    Json(PublicKeyResponse {
        public_key: state.config.vapid.public_key.clone(),
    })
}

#[derive(Serialize)]
pub(crate) struct ScheduleResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) server_time: OffsetDateTime,
    pub(crate) subscriptions: usize,
    #[serde(flatten)]
    pub(crate) status: ScheduleStatus,
}

pub(crate) async fn schedule<P: Ports>(
    State(state): State<state::AppState<P>>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let subscriptions = state.notifier.store().list_all()?.len();
    Ok(Json(ScheduleResponse {
        server_time: state.notifier.time().now(),
        subscriptions,
        status: state.schedule.snapshot(),
    }))
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use crate::app::tests::{read_body, test_app};
    use crate::config::AppConfig;
    use crate::test_support::{at, notifier};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value as JsonValue;
    use serde_json::from_slice as json_from_slice;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn public_key__should_expose_configured_vapid_key() {
        // Given
        let harness = notifier("push-public-key", at("2025-01-12T13:30:00Z"));
        let app = test_app(&harness, AppConfig::default());

        // When
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/push/public-key")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: JsonValue = json_from_slice(&read_body(response).await).expect("json");
        assert_eq!(body, json!({ "publicKey": "public" }));
    }

    #[tokio::test]
    async fn schedule__should_report_waiting_scheduler() {
        // Given
        let harness = notifier("push-schedule", at("2025-01-12T13:30:00Z"));
        let app = test_app(&harness, AppConfig::default());

        // When
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/push/schedule")
                    .body(Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body: JsonValue = json_from_slice(&read_body(response).await).expect("json");
        assert_eq!(body["server_time"], "2025-01-12T13:30:00Z");
        assert_eq!(body["phase"], "waiting");
        assert_eq!(body["subscriptions"], 0);
        assert_eq!(body["cycles_completed"], 0);
        assert_eq!(body["last_report"], JsonValue::Null);
    }
}
