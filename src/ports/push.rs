use crate::types::push::Subscription;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The push service reported the endpoint as permanently invalid.
    #[error("push endpoint is gone")]
    Gone,
    #[error("push delivery failed: {0}")]
    Transient(String),
}

impl DeliveryError {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone)
    }
}

pub trait PushSender: Clone + Send + Sync + 'static {
    type Fut<'a>: Future<Output = Result<(), DeliveryError>> + Send + 'a
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, message: &'a str) -> Self::Fut<'a>;
}
