pub mod push;
pub mod store;
pub mod time;
pub mod weather;

/// The collaborators a notifier runs against, bundled so state and
/// handlers carry a single type parameter.
pub trait Ports: Clone + Send + Sync + 'static {
    type Time: time::TimeProvider;
    type Weather: weather::WeatherProvider;
    type Sender: push::PushSender;
    type Store: store::SubscriptionStore;
}
