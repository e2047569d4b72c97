use crate::location::Location;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// Encryption material the browser hands out with a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub endpoint: String,
    pub keys: PushKeys,
    #[serde(default)]
    pub user_id: Option<String>,
    pub location: Location,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_notified: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub next_notification_time: OffsetDateTime,
    /// Provider timezone from the last successful fetch.
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Timestamps written back after a notification attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationStamp {
    /// `None` leaves the stored value untouched.
    pub last_notified: Option<OffsetDateTime>,
    pub next_notification_time: OffsetDateTime,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,
}

impl NotificationPayload {
    pub fn kind(&self) -> Option<&'static str> {
        self.data.as_ref().map(NotificationData::kind)
    }
}

/// Routing context for the service worker, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationData {
    CurrentWeather {
        location: String,
        time: String,
        timezone: String,
    },
    Forecast {
        location: String,
        time: String,
        timezone: String,
    },
    WeatherAlert {
        location: String,
        event: String,
        severity: String,
    },
}

impl NotificationData {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CurrentWeather { .. } => "current_weather",
            Self::Forecast { .. } => "forecast",
            Self::WeatherAlert { .. } => "weather_alert",
        }
    }
}
