use super::ProviderError;
use crate::timezone;
use crate::types::weather::{
    AirQuality, Condition, CurrentConditions, ForecastDay, HourSlice, Place, WeatherAlert,
    WeatherSnapshot,
};

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(super) struct RawForecastResponse {
    location: RawPlace,
    current: RawCurrent,
    forecast: RawForecast,
    #[serde(default)]
    alerts: Option<RawAlerts>,
}

#[derive(Debug, Deserialize)]
struct RawPlace {
    name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
    tz_id: String,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    text: String,
    #[serde(default)]
    icon: String,
    #[serde(default)]
    code: i32,
}

#[derive(Debug, Deserialize)]
struct RawCurrent {
    temp_c: f64,
    feelslike_c: f64,
    condition: RawCondition,
    wind_kph: f64,
    wind_dir: String,
    humidity: u8,
    cloud: u8,
    #[serde(default)]
    is_day: u8,
    #[serde(default)]
    air_quality: Option<RawAirQuality>,
}

#[derive(Debug, Deserialize)]
struct RawAirQuality {
    #[serde(rename = "us-epa-index", default)]
    us_epa_index: Option<u8>,
    #[serde(default)]
    pm2_5: Option<f64>,
    #[serde(default)]
    pm10: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    forecastday: Vec<RawForecastDay>,
}

#[derive(Debug, Deserialize)]
struct RawForecastDay {
    date: String,
    day: RawDay,
    #[serde(default)]
    astro: Option<RawAstro>,
    hour: Vec<RawHour>,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    maxtemp_c: f64,
    mintemp_c: f64,
    condition: RawCondition,
    #[serde(default)]
    daily_chance_of_rain: u8,
}

#[derive(Debug, Deserialize)]
struct RawAstro {
    #[serde(default)]
    sunrise: String,
    #[serde(default)]
    sunset: String,
}

#[derive(Debug, Deserialize)]
struct RawHour {
    time_epoch: i64,
    temp_c: f64,
    condition: RawCondition,
    cloud: u8,
    #[serde(default)]
    chance_of_rain: u8,
    wind_kph: f64,
    wind_dir: String,
}

#[derive(Debug, Deserialize)]
struct RawAlerts {
    #[serde(default)]
    alert: Vec<RawAlert>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAlert {
    headline: String,
    event: String,
    severity: String,
    effective: String,
    expires: String,
    desc: String,
    instruction: Option<String>,
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        Self {
            text: raw.text,
            icon: raw.icon,
            code: raw.code,
        }
    }
}

impl From<RawAlert> for WeatherAlert {
    fn from(raw: RawAlert) -> Self {
        Self {
            headline: raw.headline,
            event: raw.event,
            severity: raw.severity,
            effective: raw.effective,
            expires: raw.expires,
            description: raw.desc,
            instruction: raw.instruction.filter(|text| !text.trim().is_empty()),
        }
    }
}

pub(super) fn snapshot_from_slice(bytes: &[u8]) -> Result<WeatherSnapshot, ProviderError> {
    let raw: RawForecastResponse = serde_json::from_slice(bytes)?;
    snapshot_from_raw(raw)
}

fn snapshot_from_raw(raw: RawForecastResponse) -> Result<WeatherSnapshot, ProviderError> {
    let RawForecastResponse {
        location,
        current,
        forecast,
        alerts,
    } = raw;

    let tz = timezone::parse_timezone(&location.tz_id).ok_or_else(|| {
        ProviderError::Malformed(format!("unknown timezone '{}'", location.tz_id))
    })?;

    let mut days = forecast.forecastday.into_iter();
    let today = days
        .next()
        .ok_or_else(|| ProviderError::Malformed("forecast has no days".to_string()))?;

    let hourly = today
        .hour
        .into_iter()
        .map(|hour| hour_slice(hour, tz))
        .collect::<Result<Vec<_>, _>>()?;
    let mut forecast_days = vec![forecast_day(today.date, today.day, today.astro)];
    forecast_days.extend(days.map(|day| forecast_day(day.date, day.day, day.astro)));

    let air_quality = current.air_quality.map(|raw| AirQuality {
        us_epa_index: raw.us_epa_index,
        pm2_5: raw.pm2_5,
        pm10: raw.pm10,
    });

    Ok(WeatherSnapshot {
        place: Place {
            name: location.name,
            region: location.region,
            country: location.country,
            lat: location.lat,
            lon: location.lon,
        },
        timezone: location.tz_id,
        current: CurrentConditions {
            temp_c: current.temp_c,
            feels_like_c: current.feelslike_c,
            condition: current.condition.into(),
            wind_kph: current.wind_kph,
            wind_dir: current.wind_dir,
            humidity: current.humidity,
            cloud: current.cloud,
            is_day: current.is_day == 1,
        },
        hourly,
        forecast: forecast_days,
        air_quality,
        alerts: alerts
            .map(|alerts| alerts.alert.into_iter().map(WeatherAlert::from).collect())
            .unwrap_or_default(),
    })
}

fn hour_slice(raw: RawHour, tz: Tz) -> Result<HourSlice, ProviderError> {
    let local_hour = timezone::local_hour_from_epoch(raw.time_epoch, tz).ok_or_else(|| {
        ProviderError::Malformed(format!("invalid hourly timestamp {}", raw.time_epoch))
    })?;

    Ok(HourSlice {
        time_epoch: raw.time_epoch,
        local_hour,
        temp_c: raw.temp_c,
        condition: raw.condition.into(),
        cloud: raw.cloud,
        chance_of_rain: raw.chance_of_rain,
        wind_kph: raw.wind_kph,
        wind_dir: raw.wind_dir,
    })
}

fn forecast_day(date: String, day: RawDay, astro: Option<RawAstro>) -> ForecastDay {
    let (sunrise, sunset) = astro
        .map(|astro| (astro.sunrise, astro.sunset))
        .unwrap_or_default();

    ForecastDay {
        date,
        max_temp_c: day.maxtemp_c,
        min_temp_c: day.mintemp_c,
        condition: day.condition.into(),
        chance_of_rain: day.daily_chance_of_rain,
        sunrise,
        sunset,
    }
}

/// Adds `local_hour`, `local_time` and `formatted_time` to every hourly
/// entry of a raw forecast response. Entries without `time_epoch` are left
/// as they are.
pub(super) fn localize_hourly(response: &mut Value) {
    let Some(tz) = response
        .pointer("/location/tz_id")
        .and_then(Value::as_str)
        .map(timezone::resolve_timezone)
    else {
        return;
    };

    let Some(days) = response
        .pointer_mut("/forecast/forecastday")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for day in days {
        let Some(hours) = day.get_mut("hour").and_then(Value::as_array_mut) else {
            continue;
        };
        for hour in hours {
            let Some(local) = hour
                .get("time_epoch")
                .and_then(Value::as_i64)
                .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
                .map(|instant| instant.with_timezone(&tz))
            else {
                continue;
            };
            let Some(entry) = hour.as_object_mut() else {
                continue;
            };
            entry.insert(
                "local_hour".to_string(),
                Value::from(chrono::Timelike::hour(&local)),
            );
            entry.insert(
                "local_time".to_string(),
                Value::from(local.format("%H:%M").to_string()),
            );
            entry.insert(
                "formatted_time".to_string(),
                Value::from(timezone::format_local_time(&local)),
            );
        }
    }
}
