//! Builds notification payloads from weather snapshots.

use crate::location::Location;
use crate::timezone::{format_hour_label, resolve_timezone};
use crate::types::push::{NotificationData, NotificationPayload};
use crate::types::weather::{HourSlice, WeatherAlert, WeatherSnapshot};

use chrono::DateTime;

pub const ALERT_ICON: &str = "/icons/alert.png";
pub const ERROR_ICON: &str = "/icons/error.png";

const ALERT_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// The snapshot has no hourly entry for a local hour the composer needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("weather data has no entry for local hour {hour}")]
pub struct DataGapError {
    pub hour: u32,
}

/// Current conditions for `target_hour` and the forecast for the hour after.
///
/// Hours are looked up on the snapshot's first forecast day only, so at 23:00
/// the "next hour" is that day's 00:00 entry rather than tomorrow's.
pub fn current_and_forecast(
    snapshot: &WeatherSnapshot,
    location: &Location,
    target_hour: u32,
) -> Result<(NotificationPayload, NotificationPayload), DataGapError> {
    let next_hour = (target_hour + 1) % 24;
    let current = snapshot
        .hour(target_hour)
        .ok_or(DataGapError { hour: target_hour })?;
    let next = snapshot
        .hour(next_hour)
        .ok_or(DataGapError { hour: next_hour })?;

    let city = location.display_name();
    let current_label = format_hour_label(target_hour);
    let next_label = format_hour_label(next_hour);

    let current_payload = NotificationPayload {
        title: format!("⏱️ {current_label} Weather ({city})"),
        body: conditions_body(current),
        icon: current.condition.icon.clone(),
        data: Some(NotificationData::CurrentWeather {
            location: location.as_str().to_string(),
            time: current_label,
            timezone: snapshot.timezone.clone(),
        }),
    };
    let forecast_payload = NotificationPayload {
        title: format!("🔮 {next_label} Forecast ({city})"),
        body: format!("Expected: {}", conditions_body(next)),
        icon: next.condition.icon.clone(),
        data: Some(NotificationData::Forecast {
            location: location.as_str().to_string(),
            time: next_label,
            timezone: snapshot.timezone.clone(),
        }),
    };

    Ok((current_payload, forecast_payload))
}

fn conditions_body(hour: &HourSlice) -> String {
    format!(
        "{}°C, {}\n☁️ Cloud: {}%\n☔ Rain: {}%\n🌬️ Wind: {} kph {}",
        hour.temp_c,
        hour.condition.text,
        hour.cloud,
        hour.chance_of_rain,
        hour.wind_kph,
        hour.wind_dir
    )
}

pub fn alert(alert: &WeatherAlert, location: &Location, timezone: &str) -> NotificationPayload {
    let mut body = format!(
        "{}\n\nSeverity: {}\nEffective: {}\nExpires: {}\n\n{}",
        alert.headline,
        alert.severity,
        format_alert_time(&alert.effective, timezone),
        format_alert_time(&alert.expires, timezone),
        alert.description
    );
    if let Some(instruction) = alert.instruction.as_deref() {
        body.push_str("\n\n");
        body.push_str(instruction);
    }

    NotificationPayload {
        title: format!("⚠️ {} - {}", alert.event, location.display_name()),
        body,
        icon: ALERT_ICON.to_string(),
        data: Some(NotificationData::WeatherAlert {
            location: location.as_str().to_string(),
            event: alert.event.clone(),
            severity: alert.severity.clone(),
        }),
    }
}

/// Unparseable timestamps are shown as the provider sent them.
fn format_alert_time(raw: &str, timezone: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(instant) => instant
            .with_timezone(&resolve_timezone(timezone))
            .format(ALERT_TIME_FORMAT)
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn failure_notice(location: &Location) -> NotificationPayload {
    NotificationPayload {
        title: "Weather Update Failed".to_string(),
        body: format!(
            "We couldn't get the latest weather for {}",
            location.display_name()
        ),
        icon: ERROR_ICON.to_string(),
        data: None,
    }
}
