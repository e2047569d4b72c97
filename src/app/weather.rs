use super::ApiError;
use crate::ports::Ports;
use crate::ports::weather::WeatherProvider;
use crate::state;
use crate::weather::ForecastQuery;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct CityParams {
    pub(crate) name: Option<String>,
    pub(crate) region: Option<String>,
    pub(crate) country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CoordsParams {
    pub(crate) lat: Option<f64>,
    pub(crate) lon: Option<f64>,
}

pub(crate) async fn search<P: Ports>(
    State(state): State<state::AppState<P>>,
    Path(query): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let results = state
        .notifier
        .weather()
        .search(&query)
        .await
        .map_err(ApiError::upstream("Failed to fetch location suggestions"))?;
    Ok(Json(results))
}

pub(crate) async fn by_city<P: Ports>(
    State(state): State<state::AppState<P>>,
    params: Result<Query<CityParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let name = params
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Missing city name".to_string()))?;
    let query = ForecastQuery::City {
        name,
        region: params.region,
        country: params.country,
    };

    let forecast = state
        .notifier
        .weather()
        .forecast(&query)
        .await
        .map_err(ApiError::upstream("City weather fetch failed"))?;
    Ok(Json(forecast))
}

pub(crate) async fn by_coords<P: Ports>(
    State(state): State<state::AppState<P>>,
    params: Result<Query<CoordsParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    let (Some(lat), Some(lon)) = (params.lat, params.lon) else {
        return Err(ApiError::Validation("Missing coordinates".to_string()));
    };

    let forecast = state
        .notifier
        .weather()
        .forecast(&ForecastQuery::Coords { lat, lon })
        .await
        .map_err(ApiError::upstream("Coordinates weather fetch failed"))?;
    Ok(Json(forecast))
}
