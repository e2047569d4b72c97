use crate::location::Location;
use crate::types::push::{NotificationStamp, Subscription};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("subscription store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("subscription store data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("subscription store lock poisoned")]
    Poisoned,
}

/// Durable subscriptions keyed by push endpoint.
///
/// Every call is atomic for the record it touches; there are no
/// cross-record transactions.
pub trait SubscriptionStore: Clone + Send + Sync + 'static {
    /// Replaces the record with the same endpoint, or inserts it.
    fn upsert(&self, subscription: Subscription) -> Result<(), StoreError>;
    /// Returns whether a record was removed.
    fn delete(&self, endpoint: &str) -> Result<bool, StoreError>;
    fn find_by_endpoint(&self, endpoint: &str) -> Result<Option<Subscription>, StoreError>;
    /// Snapshot of every record at call time.
    fn list_all(&self) -> Result<Vec<Subscription>, StoreError>;
    /// Updates timestamps of an existing record. Returns `false` when the
    /// endpoint is no longer stored; a missing record is never recreated.
    fn mark_notified(&self, endpoint: &str, stamp: NotificationStamp) -> Result<bool, StoreError>;
    fn find_by_location(&self, location: &Location) -> Result<Vec<Subscription>, StoreError>;
    fn find_by_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError>;
}
