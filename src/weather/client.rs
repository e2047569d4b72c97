use super::{ProviderError, decode};
use crate::config::WeatherApiConfig;
use crate::location::Location;
use crate::ports;
use crate::types::weather::WeatherSnapshot;
use crate::weather::ForecastQuery;

use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

const FORECAST_DAYS: &str = "3";

#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
}

impl WeatherApiClient {
    pub fn new(config: &WeatherApiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Location autocomplete results as returned by the provider.
    #[instrument(skip(self), level = "debug")]
    pub async fn search_locations(&self, query: &str) -> Result<Value, ProviderError> {
        let bytes = self.get("search.json", &[("q", query)]).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Raw forecast JSON with local time fields on every hourly entry.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_forecast(&self, query: &ForecastQuery) -> Result<Value, ProviderError> {
        let bytes = self.get_forecast(&query.to_query()).await?;
        let mut value: Value = serde_json::from_slice(&bytes)?;
        decode::localize_hourly(&mut value);
        Ok(value)
    }

    #[instrument(skip(self), fields(location = %location), level = "debug")]
    pub async fn fetch_snapshot(&self, location: &Location) -> Result<WeatherSnapshot, ProviderError> {
        let bytes = self.get_forecast(&location.query()).await?;
        decode::snapshot_from_slice(&bytes)
    }

    async fn get_forecast(&self, q: &str) -> Result<Vec<u8>, ProviderError> {
        self.get(
            "forecast.json",
            &[
                ("q", q),
                ("days", FORECAST_DAYS),
                ("aqi", "yes"),
                ("alerts", "yes"),
            ],
        )
        .await
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<u8>, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, path, "weather provider rejected request");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

impl ports::weather::WeatherProvider for WeatherApiClient {
    type SnapshotFut<'a>
        = Pin<Box<dyn Future<Output = Result<WeatherSnapshot, ProviderError>> + Send + 'a>>
    where
        Self: 'a;
    type JsonFut<'a>
        = Pin<Box<dyn Future<Output = Result<Value, ProviderError>> + Send + 'a>>
    where
        Self: 'a;

    fn fetch_for_location<'a>(&'a self, location: &'a Location) -> Self::SnapshotFut<'a> {
        Box::pin(self.fetch_snapshot(location))
    }

    fn search<'a>(&'a self, query: &'a str) -> Self::JsonFut<'a> {
        Box::pin(self.search_locations(query))
    }

    fn forecast<'a>(&'a self, query: &'a ForecastQuery) -> Self::JsonFut<'a> {
        Box::pin(self.fetch_forecast(query))
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::weather::fixtures::paris_forecast;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> WeatherApiClient {
        WeatherApiClient::new(&WeatherApiConfig {
            api_key: "test-key".to_string(),
            base_url: format!("{}/", server.uri()),
        })
        .expect("build client")
    }

    #[tokio::test]
    async fn fetch_snapshot__should_query_trimmed_location_parts() {
        // Given
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("key", "test-key"))
            .and(query_param("q", "Paris, Ile-de-France, France"))
            .and(query_param("days", "3"))
            .and(query_param("alerts", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_forecast()))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);
        let location = Location::parse("Paris , Ile-de-France, France");

        // When
        let snapshot = client.fetch_snapshot(&location).await.expect("snapshot");

        // Then
        assert_eq!(snapshot.place.name, "Paris");
        assert_eq!(snapshot.hour(15).map(|slice| slice.local_hour), Some(15));
    }

    #[tokio::test]
    async fn fetch_snapshot__should_fail_on_error_status() {
        // Given
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(400).set_body_string("No matching location found."))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // When
        let result = client.fetch_snapshot(&Location::parse("Atlantis")).await;

        // Then
        match result {
            Err(ProviderError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "No matching location found.");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_snapshot__should_fail_on_malformed_body() {
        // Given
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // When
        let result = client.fetch_snapshot(&Location::parse("Paris")).await;

        // Then
        assert!(matches!(result, Err(ProviderError::Malformed(_))));
    }

    #[tokio::test]
    async fn fetch_forecast__should_tag_hours_for_coordinates() {
        // Given
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast.json"))
            .and(query_param("q", "48.87,2.33"))
            .and(query_param("aqi", "yes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(paris_forecast()))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // When
        let value = client
            .fetch_forecast(&ForecastQuery::Coords {
                lat: 48.87,
                lon: 2.33,
            })
            .await
            .expect("forecast");

        // Then
        let hour = &value["forecast"]["forecastday"][0]["hour"][9];
        assert_eq!(hour["local_hour"], 9);
        assert_eq!(hour["formatted_time"], "9:00 AM");
    }

    #[tokio::test]
    async fn fetch_snapshot__should_keep_api_key_out_of_network_errors() {
        // Given
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };
        let client = WeatherApiClient::new(&WeatherApiConfig {
            api_key: "secret-weather-key".to_string(),
            base_url: format!("http://127.0.0.1:{port}"),
        })
        .expect("build client");

        // When
        let err = client
            .fetch_snapshot(&Location::parse("Paris"))
            .await
            .expect_err("closed port");

        // Then
        assert!(matches!(err, ProviderError::Network(_)));
        assert!(!err.to_string().contains("secret-weather-key"));
        assert!(!format!("{err:?}").contains("secret-weather-key"));
    }

    #[tokio::test]
    async fn search_locations__should_pass_through_provider_json() {
        // Given
        let server = MockServer::start().await;
        let results = serde_json::json!([
            { "id": 1, "name": "Paris", "region": "Ile-de-France", "country": "France" }
        ]);
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "par"))
            .respond_with(ResponseTemplate::new(200).set_body_json(results.clone()))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // When
        let value = client.search_locations("par").await.expect("search");

        // Then
        assert_eq!(value, results);
    }
}
