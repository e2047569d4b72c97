use super::dispatch::{DeliveryOutcome, Dispatcher};
use crate::compose;
use crate::next_notification::compute_next;
use crate::ports::Ports;
use crate::ports::store::{StoreError, SubscriptionStore};
use crate::ports::time::TimeProvider;
use crate::ports::weather::WeatherProvider;
use crate::timezone;
use crate::types::push::{NotificationPayload, NotificationStamp, Subscription};
use crate::types::weather::WeatherSnapshot;

use serde::Serialize;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberOutcome {
    /// Weather was composed and sent; `delivered` counts accepted payloads.
    Notified { delivered: usize },
    FailureNotice,
    Pruned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub subscribers: usize,
    pub notified: usize,
    pub failure_notices: usize,
    pub pruned: usize,
    pub delivered: usize,
}

impl CycleReport {
    fn record(&mut self, outcome: SubscriberOutcome) {
        self.subscribers += 1;
        match outcome {
            SubscriberOutcome::Notified { delivered } => {
                self.notified += 1;
                self.delivered += delivered;
            }
            SubscriberOutcome::FailureNotice => self.failure_notices += 1,
            SubscriberOutcome::Pruned => self.pruned += 1,
        }
    }
}

/// Runs the per-subscriber pipeline: fetch, compose, deliver, stamp.
#[derive(Clone)]
pub struct Notifier<P: Ports> {
    time: P::Time,
    weather: P::Weather,
    store: P::Store,
    dispatcher: Dispatcher<P::Sender, P::Store>,
}

impl<P: Ports> Notifier<P> {
    pub fn new(time: P::Time, weather: P::Weather, sender: P::Sender, store: P::Store) -> Self {
        Self {
            time,
            weather,
            dispatcher: Dispatcher::new(sender, store.clone()),
            store,
        }
    }

    pub fn time(&self) -> &P::Time {
        &self.time
    }

    pub fn weather(&self) -> &P::Weather {
        &self.weather
    }

    pub fn store(&self) -> &P::Store {
        &self.store
    }

    /// One notification round for one subscriber. Never fails: problems
    /// end in a failure notice or a log entry.
    pub async fn notify(&self, subscription: &Subscription) -> SubscriberOutcome {
        let now = self.time.now();
        let snapshot = match self.weather.fetch_for_location(&subscription.location).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    location = %subscription.location,
                    %err,
                    "weather fetch failed"
                );
                return self.send_failure_notice(subscription, now).await;
            }
        };

        match self.send_weather(subscription, &snapshot, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    endpoint = %subscription.endpoint,
                    location = %subscription.location,
                    %err,
                    "weather data incomplete"
                );
                self.send_failure_notice(subscription, now).await
            }
        }
    }

    async fn send_weather(
        &self,
        subscription: &Subscription,
        snapshot: &WeatherSnapshot,
        now: OffsetDateTime,
    ) -> Result<SubscriberOutcome, compose::DataGapError> {
        let tz = timezone::resolve_timezone(&snapshot.timezone);
        let hour = timezone::local_hour(now, tz);
        let (current, forecast) =
            compose::current_and_forecast(snapshot, &subscription.location, hour)?;

        let mut payloads = vec![current, forecast];
        payloads.extend(
            snapshot
                .alerts
                .iter()
                .map(|alert| compose::alert(alert, &subscription.location, &snapshot.timezone)),
        );

        let Some(delivered) = self.deliver_all(subscription, &payloads).await else {
            return Ok(SubscriberOutcome::Pruned);
        };

        self.stamp(
            subscription,
            NotificationStamp {
                last_notified: Some(now),
                next_notification_time: compute_next(now, &snapshot.timezone),
                timezone: Some(snapshot.timezone.clone()),
            },
        );
        Ok(SubscriberOutcome::Notified { delivered })
    }

    /// Number of delivered payloads, or `None` once the endpoint is pruned.
    async fn deliver_all(
        &self,
        subscription: &Subscription,
        payloads: &[NotificationPayload],
    ) -> Option<usize> {
        let mut delivered = 0;
        for payload in payloads {
            match self.dispatcher.deliver(subscription, payload).await {
                DeliveryOutcome::Delivered => delivered += 1,
                DeliveryOutcome::Failed => {}
                DeliveryOutcome::Pruned => return None,
            }
        }
        Some(delivered)
    }

    async fn send_failure_notice(
        &self,
        subscription: &Subscription,
        now: OffsetDateTime,
    ) -> SubscriberOutcome {
        let notice = compose::failure_notice(&subscription.location);
        if self.dispatcher.deliver(subscription, &notice).await == DeliveryOutcome::Pruned {
            return SubscriberOutcome::Pruned;
        }

        let timezone = subscription.timezone.as_deref().unwrap_or("UTC");
        self.stamp(
            subscription,
            NotificationStamp {
                last_notified: None,
                next_notification_time: compute_next(now, timezone),
                timezone: None,
            },
        );
        SubscriberOutcome::FailureNotice
    }

    fn stamp(&self, subscription: &Subscription, stamp: NotificationStamp) {
        match self.store.mark_notified(&subscription.endpoint, stamp) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(
                endpoint = %subscription.endpoint,
                "subscription removed before it could be stamped"
            ),
            Err(err) => tracing::error!(
                endpoint = %subscription.endpoint,
                %err,
                "failed to record notification time"
            ),
        }
    }

    /// Notifies every stored subscriber in turn. Only a failure to list
    /// the store abandons the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        let subscriptions = self.store.list_all()?;
        let mut report = CycleReport::default();
        for subscription in &subscriptions {
            report.record(self.notify(subscription).await);
        }

        tracing::info!(
            subscribers = report.subscribers,
            notified = report.notified,
            failure_notices = report.failure_notices,
            pruned = report.pruned,
            delivered = report.delivered,
            "notification cycle finished"
        );
        Ok(report)
    }
}
