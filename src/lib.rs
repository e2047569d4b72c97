pub mod adapters;
pub mod app;
pub mod compose;
pub mod config;
pub mod location;
pub mod next_notification;
pub mod ports;
pub mod push;
pub mod state;
pub mod store;
pub mod timezone;
pub mod types;
pub mod weather;

#[cfg(test)]
mod test_support;

use adapters::{LivePorts, TokioTimeProvider, WebPushSender};
use ports::store::StoreError;
use push::{Notifier, ScheduleTracker};
use store::JsonFileStore;
use weather::{ProviderError, WeatherApiClient};

use std::net::SocketAddr;
use std::sync::Arc;

pub use push::generate_vapid_credentials;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to open subscription store: {0}")]
    Store(#[from] StoreError),
    #[error("failed to build weather client: {0}")]
    Weather(#[from] ProviderError),
    #[error("failed to init web-push: {0}")]
    Push(#[from] web_push::WebPushError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Logs to stderr, filtered by `RUST_LOG` with `info` as the default.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn serve(config: config::AppConfig) -> Result<(), StartupError> {
    let store = JsonFileStore::open(&config.store_path)?;
    let weather = WeatherApiClient::new(&config.weather)?;
    let sender = WebPushSender::new(config.vapid.clone())?;
    let notifier = Arc::new(Notifier::<LivePorts>::new(
        TokioTimeProvider,
        weather,
        sender,
        store,
    ));

    let schedule = ScheduleTracker::default();
    let _scheduler = push::start_scheduler(Arc::clone(&notifier), schedule.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = state::AppState {
        config: Arc::new(config),
        notifier,
        schedule,
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app::app(state)).await?;
    Ok(())
}
