//! Fake ports shared by the unit tests.

use crate::location::Location;
use crate::ports;
use crate::ports::push::DeliveryError;
use crate::ports::store::{StoreError, SubscriptionStore};
use crate::push::Notifier;
use crate::store::JsonFileStore;
use crate::types::push::{NotificationPayload, NotificationStamp, PushKeys, Subscription};
use crate::types::weather::WeatherSnapshot;
use crate::weather::{ForecastQuery, ProviderError, fixtures, snapshot_from_value};

use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::sync::oneshot;

pub(crate) fn at(raw: &str) -> OffsetDateTime {
    OffsetDateTime::parse(raw, &Rfc3339).expect("parse instant")
}

pub(crate) fn paris_snapshot() -> WeatherSnapshot {
    snapshot_from_value(&fixtures::paris_forecast()).expect("decode fixture")
}

pub(crate) fn subscription(endpoint: &str, location: &str) -> Subscription {
    let created_at = at("2025-01-12T09:30:00Z");
    Subscription {
        endpoint: endpoint.to_string(),
        keys: PushKeys {
            p256dh: "p256".to_string(),
            auth: "auth".to_string(),
        },
        user_id: None,
        location: Location::parse(location),
        created_at,
        last_notified: None,
        next_notification_time: at("2025-01-12T10:00:00Z"),
        timezone: None,
    }
}

fn create_temp_root(test_name: &str) -> PathBuf {
    let mut root = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    root.push(format!("weatherly-{}-{}", test_name, nanos));
    std::fs::create_dir_all(&root).expect("create temp dir");
    root
}

/// A file-backed store in its own temp dir whose listing can be made to fail.
#[derive(Clone)]
pub(crate) struct TestStore {
    inner: JsonFileStore,
    root: Arc<PathBuf>,
    list_fails: Arc<Mutex<bool>>,
}

impl TestStore {
    pub(crate) fn fail_listing(&self) {
        *self.list_fails.lock().expect("list lock") = true;
    }

    pub(crate) fn cleanup(&self) {
        let _ = std::fs::remove_dir_all(self.root.as_path());
    }
}

pub(crate) fn test_store(test_name: &str) -> TestStore {
    let root = create_temp_root(test_name);
    let inner = JsonFileStore::open(root.join("subscriptions.json")).expect("open store");
    TestStore {
        inner,
        root: Arc::new(root),
        list_fails: Arc::new(Mutex::new(false)),
    }
}

impl SubscriptionStore for TestStore {
    fn upsert(&self, subscription: Subscription) -> Result<(), StoreError> {
        self.inner.upsert(subscription)
    }

    fn delete(&self, endpoint: &str) -> Result<bool, StoreError> {
        self.inner.delete(endpoint)
    }

    fn find_by_endpoint(&self, endpoint: &str) -> Result<Option<Subscription>, StoreError> {
        self.inner.find_by_endpoint(endpoint)
    }

    fn list_all(&self) -> Result<Vec<Subscription>, StoreError> {
        if *self.list_fails.lock().expect("list lock") {
            return Err(StoreError::Io(std::io::Error::other("disk unavailable")));
        }
        self.inner.list_all()
    }

    fn mark_notified(&self, endpoint: &str, stamp: NotificationStamp) -> Result<bool, StoreError> {
        self.inner.mark_notified(endpoint, stamp)
    }

    fn find_by_location(&self, location: &Location) -> Result<Vec<Subscription>, StoreError> {
        self.inner.find_by_location(location)
    }

    fn find_by_user(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.inner.find_by_user(user_id)
    }
}

#[derive(Clone)]
pub(crate) struct TestTime {
    now: OffsetDateTime,
    sleeps: Arc<Mutex<Vec<oneshot::Sender<()>>>>,
    durations: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            sleeps: Arc::new(Mutex::new(Vec::new())),
            durations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.durations.lock().expect("durations lock").clone()
    }

    pub(crate) fn trigger_all(&self) {
        let mut sends = self.sleeps.lock().expect("sleeps lock");
        for sender in sends.drain(..) {
            let _ = sender.send(());
        }
    }

    /// Yields until at least `count` sleeps were requested.
    pub(crate) async fn wait_for_sleeps(&self, count: usize) {
        for _ in 0..1000 {
            if self.sleep_durations().len() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {count} sleeps, saw {:?}", self.sleep_durations());
    }
}

pub(crate) struct ManualSleep {
    receiver: oneshot::Receiver<()>,
}

impl Future for ManualSleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl ports::time::TimeProvider for TestTime {
    type Sleep<'a>
        = ManualSleep
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        let (sender, receiver) = oneshot::channel();
        self.durations
            .lock()
            .expect("durations lock")
            .push(duration);
        self.sleeps.lock().expect("sleeps lock").push(sender);
        ManualSleep { receiver }
    }
}

/// Records decoded payloads; endpoints can be marked gone or failing.
#[derive(Clone, Default)]
pub(crate) struct TestSender {
    sent: Arc<Mutex<Vec<(String, NotificationPayload)>>>,
    attempts: Arc<Mutex<usize>>,
    gone: Arc<Mutex<HashSet<String>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl TestSender {
    pub(crate) fn sent(&self) -> Vec<(String, NotificationPayload)> {
        self.sent.lock().expect("sent lock").clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("attempts lock")
    }

    pub(crate) fn mark_gone(&self, endpoint: &str) {
        self.gone
            .lock()
            .expect("gone lock")
            .insert(endpoint.to_string());
    }

    pub(crate) fn mark_failing(&self, endpoint: &str) {
        self.failing
            .lock()
            .expect("failing lock")
            .insert(endpoint.to_string());
    }
}

impl ports::push::PushSender for TestSender {
    type Fut<'a>
        = std::future::Ready<Result<(), DeliveryError>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, message: &'a str) -> Self::Fut<'a> {
        *self.attempts.lock().expect("attempts lock") += 1;
        let endpoint = &subscription.endpoint;
        if self.gone.lock().expect("gone lock").contains(endpoint) {
            return std::future::ready(Err(DeliveryError::Gone));
        }
        if self.failing.lock().expect("failing lock").contains(endpoint) {
            return std::future::ready(Err(DeliveryError::Transient(
                "push service unavailable".to_string(),
            )));
        }

        let payload = serde_json::from_str(message).expect("payload json");
        self.sent
            .lock()
            .expect("sent lock")
            .push((endpoint.clone(), payload));
        std::future::ready(Ok(()))
    }
}

/// Snapshots keyed by canonical location. `None` and unknown locations
/// fail the fetch.
#[derive(Clone, Default)]
pub(crate) struct TestWeather {
    snapshots: Arc<Mutex<HashMap<String, Option<WeatherSnapshot>>>>,
    fetched: Arc<Mutex<Vec<String>>>,
    passthrough_fails: Arc<Mutex<bool>>,
}

impl TestWeather {
    pub(crate) fn insert(&self, location: &str, snapshot: Option<WeatherSnapshot>) {
        self.snapshots
            .lock()
            .expect("snapshots lock")
            .insert(Location::parse(location).as_str().to_string(), snapshot);
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().expect("fetched lock").clone()
    }

    pub(crate) fn fail_passthrough(&self) {
        *self.passthrough_fails.lock().expect("passthrough lock") = true;
    }

    fn passthrough(&self, value: Value) -> Result<Value, ProviderError> {
        if *self.passthrough_fails.lock().expect("passthrough lock") {
            return Err(ProviderError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(value)
    }
}

impl ports::weather::WeatherProvider for TestWeather {
    type SnapshotFut<'a>
        = std::future::Ready<Result<WeatherSnapshot, ProviderError>>
    where
        Self: 'a;
    type JsonFut<'a>
        = std::future::Ready<Result<Value, ProviderError>>
    where
        Self: 'a;

    fn fetch_for_location<'a>(&'a self, location: &'a Location) -> Self::SnapshotFut<'a> {
        self.fetched
            .lock()
            .expect("fetched lock")
            .push(location.as_str().to_string());
        let snapshot = self
            .snapshots
            .lock()
            .expect("snapshots lock")
            .get(location.as_str())
            .cloned()
            .flatten();
        std::future::ready(snapshot.ok_or_else(|| ProviderError::Status {
            status: 400,
            body: "No matching location found.".to_string(),
        }))
    }

    fn search<'a>(&'a self, query: &'a str) -> Self::JsonFut<'a> {
        std::future::ready(self.passthrough(json!([{ "name": query }])))
    }

    fn forecast<'a>(&'a self, query: &'a ForecastQuery) -> Self::JsonFut<'a> {
        std::future::ready(self.passthrough(json!({ "q": query.to_query() })))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TestPorts;

impl ports::Ports for TestPorts {
    type Time = TestTime;
    type Weather = TestWeather;
    type Sender = TestSender;
    type Store = TestStore;
}

/// A notifier over fake ports plus handles to inspect them.
pub(crate) struct Harness {
    pub(crate) notifier: Notifier<TestPorts>,
    pub(crate) time: TestTime,
    pub(crate) weather: TestWeather,
    pub(crate) sender: TestSender,
    pub(crate) store: TestStore,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.store.cleanup();
    }
}

pub(crate) fn notifier(test_name: &str, now: OffsetDateTime) -> Harness {
    let time = TestTime::new(now);
    let weather = TestWeather::default();
    let sender = TestSender::default();
    let store = test_store(test_name);
    let notifier = Notifier::<TestPorts>::new(
        time.clone(),
        weather.clone(),
        sender.clone(),
        store.clone(),
    );
    Harness {
        notifier,
        time,
        weather,
        sender,
        store,
    }
}
