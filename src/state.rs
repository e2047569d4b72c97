use crate::config::AppConfig;
use crate::ports::Ports;
use crate::push::{Notifier, ScheduleTracker};

use std::sync::Arc;

pub struct AppState<P: Ports> {
    pub config: Arc<AppConfig>,
    pub notifier: Arc<Notifier<P>>,
    pub schedule: ScheduleTracker,
}

impl<P: Ports> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            notifier: Arc::clone(&self.notifier),
            schedule: self.schedule.clone(),
        }
    }
}
