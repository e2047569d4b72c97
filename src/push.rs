use crate::ports::Ports;

mod dispatch;
mod notifier;
mod scheduler;
pub(crate) mod vapid;

use std::sync::Arc;
use tokio::task::JoinHandle;

pub use dispatch::{DeliveryOutcome, Dispatcher};
pub use notifier::{CycleReport, Notifier, SubscriberOutcome};
pub use scheduler::{ScheduleStatus, ScheduleTracker, SchedulerPhase};
pub use vapid::{
    VapidConfigStatus, VapidCredentials, generate_vapid_credentials, load_vapid_config,
};

use scheduler::PushScheduler;

/// Starts the two-hourly notification cycle on its own task.
pub fn start_scheduler<P: Ports>(
    notifier: Arc<Notifier<P>>,
    tracker: ScheduleTracker,
) -> JoinHandle<()> {
    PushScheduler::new(notifier, tracker).spawn()
}
