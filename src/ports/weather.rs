use crate::location::Location;
use crate::types::weather::WeatherSnapshot;
use crate::weather::{ForecastQuery, ProviderError};

pub trait WeatherProvider: Clone + Send + Sync + 'static {
    type SnapshotFut<'a>: Future<Output = Result<WeatherSnapshot, ProviderError>> + Send + 'a
    where
        Self: 'a;
    type JsonFut<'a>: Future<Output = Result<serde_json::Value, ProviderError>> + Send + 'a
    where
        Self: 'a;

    fn fetch_for_location<'a>(&'a self, location: &'a Location) -> Self::SnapshotFut<'a>;
    /// Location autocomplete, passed through as provider JSON.
    fn search<'a>(&'a self, query: &'a str) -> Self::JsonFut<'a>;
    /// Forecast as provider JSON with local hour tags on every hourly entry.
    fn forecast<'a>(&'a self, query: &'a ForecastQuery) -> Self::JsonFut<'a>;
}
