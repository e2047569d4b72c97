use crate::types::push::VapidConfig;
use crate::weather::DEFAULT_WEATHER_API_URL;

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STORE_PATH: &str = "weatherly-subscriptions.json";
pub const DEFAULT_VAPID_SUBJECT: &str = "mailto:weather@example.com";

#[derive(Debug, Clone)]
pub struct WeatherApiConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub weather: WeatherApiConfig,
    pub vapid: VapidConfig,
    /// Origin allowed to call the API from a browser; no CORS headers when unset.
    pub allowed_origin: Option<String>,
    pub port: u16,
    pub store_path: PathBuf,
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather: WeatherApiConfig {
                api_key: "test-key".to_string(),
                base_url: DEFAULT_WEATHER_API_URL.to_string(),
            },
            vapid: VapidConfig {
                private_key: "private".to_string(),
                public_key: "public".to_string(),
                subject: DEFAULT_VAPID_SUBJECT.to_string(),
            },
            allowed_origin: None,
            port: DEFAULT_PORT,
            store_path: DEFAULT_STORE_PATH.into(),
        }
    }
}
