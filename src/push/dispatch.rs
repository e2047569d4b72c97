use crate::ports::push::{DeliveryError, PushSender};
use crate::ports::store::SubscriptionStore;
use crate::types::push::{NotificationPayload, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The endpoint is gone and its subscription was removed.
    Pruned,
    Failed,
}

/// Sends one payload to one subscriber, once.
#[derive(Debug, Clone)]
pub struct Dispatcher<S, St> {
    sender: S,
    store: St,
}

impl<S, St> Dispatcher<S, St>
where
    S: PushSender,
    St: SubscriptionStore,
{
    pub fn new(sender: S, store: St) -> Self {
        Self { sender, store }
    }

    pub async fn deliver(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> DeliveryOutcome {
        let message = match serde_json::to_string(payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::error!(endpoint = %subscription.endpoint, %err, "failed to encode payload");
                return DeliveryOutcome::Failed;
            }
        };

        match self.sender.send(subscription, &message).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(DeliveryError::Gone) => {
                match self.store.delete(&subscription.endpoint) {
                    Ok(_) => tracing::info!(
                        endpoint = %subscription.endpoint,
                        location = %subscription.location,
                        "removed subscription for gone endpoint"
                    ),
                    Err(err) => tracing::error!(
                        endpoint = %subscription.endpoint,
                        %err,
                        "failed to remove gone subscription"
                    ),
                }
                DeliveryOutcome::Pruned
            }
            Err(err) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    kind = payload.kind().unwrap_or("failure_notice"),
                    %err,
                    "push delivery failed"
                );
                DeliveryOutcome::Failed
            }
        }
    }

    /// Whether the payload reached the push service.
    pub async fn send(&self, subscription: &Subscription, payload: &NotificationPayload) -> bool {
        self.deliver(subscription, payload).await == DeliveryOutcome::Delivered
    }
}
