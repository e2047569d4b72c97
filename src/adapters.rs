use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use crate::ports;
use crate::ports::push::DeliveryError;
use crate::store::JsonFileStore;
use crate::types::push::{Subscription, VapidConfig};
use crate::weather::WeatherApiClient;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::time::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, web_push::WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn deliver(
        &self,
        subscription: &Subscription,
        message: &str,
    ) -> Result<(), web_push::WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, message.as_bytes());
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

/// 404 and 410 from the push service mean the endpoint will never accept
/// another message.
pub(crate) fn classify_delivery_error(err: web_push::WebPushError) -> DeliveryError {
    match err {
        web_push::WebPushError::EndpointNotValid | web_push::WebPushError::EndpointNotFound => {
            DeliveryError::Gone
        }
        other => DeliveryError::Transient(other.to_string()),
    }
}

impl ports::push::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, message: &'a str) -> Self::Fut<'a> {
        Box::pin(async move {
            self.deliver(subscription, message)
                .await
                .map_err(classify_delivery_error)
        })
    }
}

/// Production collaborators: tokio clock, weatherapi.com, web-push and
/// the JSON file store.
#[derive(Debug, Clone, Copy, Default)]
pub struct LivePorts;

impl ports::Ports for LivePorts {
    type Time = TokioTimeProvider;
    type Weather = WeatherApiClient;
    type Sender = WebPushSender;
    type Store = JsonFileStore;
}
