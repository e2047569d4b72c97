use serde::{Deserialize, Serialize};

/// One provider response for a location, decoded and validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub place: Place,
    /// IANA timezone id reported by the provider.
    pub timezone: String,
    pub current: CurrentConditions,
    /// Today's hours, each tagged with its local hour of day.
    pub hourly: Vec<HourSlice>,
    pub forecast: Vec<ForecastDay>,
    pub air_quality: Option<AirQuality>,
    pub alerts: Vec<WeatherAlert>,
}

impl WeatherSnapshot {
    pub fn hour(&self, local_hour: u32) -> Option<&HourSlice> {
        self.hourly
            .iter()
            .find(|slice| slice.local_hour == local_hour)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
    pub code: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub feels_like_c: f64,
    pub condition: Condition,
    pub wind_kph: f64,
    pub wind_dir: String,
    pub humidity: u8,
    pub cloud: u8,
    pub is_day: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSlice {
    pub time_epoch: i64,
    pub local_hour: u32,
    pub temp_c: f64,
    pub condition: Condition,
    pub cloud: u8,
    pub chance_of_rain: u8,
    pub wind_kph: f64,
    pub wind_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub max_temp_c: f64,
    pub min_temp_c: f64,
    pub condition: Condition,
    pub chance_of_rain: u8,
    pub sunrise: String,
    pub sunset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub us_epa_index: Option<u8>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub headline: String,
    pub event: String,
    pub severity: String,
    /// RFC 3339 timestamps as sent by the provider.
    pub effective: String,
    pub expires: String,
    pub description: String,
    pub instruction: Option<String>,
}
