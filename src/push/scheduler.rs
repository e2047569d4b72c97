use super::notifier::{CycleReport, Notifier};
use crate::ports::Ports;
use crate::ports::time::TimeProvider;

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

pub(crate) const CYCLE_INTERVAL: time::Duration = time::Duration::hours(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// Counting down to the first even UTC hour.
    Waiting,
    Running,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStatus {
    pub phase: SchedulerPhase,
    #[serde(with = "time::serde::rfc3339::option")]
    pub next_cycle_at: Option<OffsetDateTime>,
    pub cycle_in_progress: bool,
    pub cycles_completed: u64,
    pub last_report: Option<CycleReport>,
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        Self {
            phase: SchedulerPhase::Waiting,
            next_cycle_at: None,
            cycle_in_progress: false,
            cycles_completed: 0,
            last_report: None,
        }
    }
}

/// Shared view of the scheduler for the debug endpoint.
#[derive(Debug, Clone, Default)]
pub struct ScheduleTracker {
    status: Arc<Mutex<ScheduleStatus>>,
}

impl ScheduleTracker {
    pub fn snapshot(&self) -> ScheduleStatus {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ScheduleStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn waiting_until(&self, at: OffsetDateTime) {
        self.lock().next_cycle_at = Some(at);
    }

    fn cycle_started(&self) {
        let mut status = self.lock();
        status.phase = SchedulerPhase::Running;
        status.cycle_in_progress = true;
    }

    fn cycle_finished(&self, report: Option<CycleReport>) {
        let mut status = self.lock();
        status.cycle_in_progress = false;
        status.cycles_completed += 1;
        if report.is_some() {
            status.last_report = report;
        }
    }
}

/// Minutes until the next even UTC hour; zero exactly on one.
pub(crate) fn initial_delay(now: OffsetDateTime) -> time::Duration {
    let minutes_into_window = i64::from(now.hour() % 2) * 60 + i64::from(now.minute());
    time::Duration::minutes((120 - minutes_into_window) % 120)
}

pub(crate) struct PushScheduler<P: Ports> {
    notifier: Arc<Notifier<P>>,
    tracker: ScheduleTracker,
}

impl<P: Ports> PushScheduler<P> {
    pub(crate) fn new(notifier: Arc<Notifier<P>>, tracker: ScheduleTracker) -> Self {
        Self { notifier, tracker }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        let time = self.notifier.time().clone();
        let now = time.now();
        let mut next_at = now + initial_delay(now);
        tracing::info!(first_cycle_at = %next_at, "push scheduler started");

        loop {
            self.tracker.waiting_until(next_at);
            if let Some(delay) = compute_delay(&time, next_at) {
                time.sleep(delay).await;
            }

            self.tracker.cycle_started();
            let report = match self.notifier.run_cycle().await {
                Ok(report) => Some(report),
                Err(err) => {
                    tracing::error!(%err, "notification cycle abandoned");
                    None
                }
            };
            self.tracker.cycle_finished(report);
            next_at += CYCLE_INTERVAL;
        }
    }
}

fn compute_delay<T: TimeProvider>(time: &T, at: OffsetDateTime) -> Option<Duration> {
    let now = time.now();
    let delay = at - now;
    if delay.is_positive() {
        match delay.try_into() {
            Ok(std_delay) => Some(std_delay),
            Err(_) => Some(Duration::MAX),
        }
    } else {
        None
    }
}
