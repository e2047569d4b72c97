//! Client for the third-party weather API.
//!
//! Snapshots are decoded into [`WeatherSnapshot`](crate::types::weather::WeatherSnapshot)
//! at the boundary, so a malformed response surfaces as [`ProviderError`]
//! before any notification is composed. The passthrough endpoints keep the
//! provider JSON but tag every hourly entry with its local hour.

mod client;
mod decode;

pub use client::WeatherApiClient;

#[cfg(test)]
pub(crate) use decode::fixtures;

#[cfg(test)]
pub(crate) fn snapshot_from_value(
    value: &serde_json::Value,
) -> Result<crate::types::weather::WeatherSnapshot, ProviderError> {
    decode::snapshot_from_slice(&serde_json::to_vec(value)?)
}

pub const DEFAULT_WEATHER_API_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("weather provider request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("weather provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("weather provider returned malformed data: {0}")]
    Malformed(String),
}

// The api key travels in the query string, so the url never reaches an error.
impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.without_url())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastQuery {
    City {
        name: String,
        region: Option<String>,
        country: Option<String>,
    },
    Coords {
        lat: f64,
        lon: f64,
    },
}

impl ForecastQuery {
    /// Value of the provider's `q` parameter.
    pub fn to_query(&self) -> String {
        match self {
            Self::City {
                name,
                region,
                country,
            } => [Some(name.as_str()), region.as_deref(), country.as_deref()]
                .into_iter()
                .flatten()
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Self::Coords { lat, lon } => format!("{lat},{lon}"),
        }
    }
}
