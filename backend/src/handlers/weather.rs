//! HTTP handlers for weather ingestion

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{CellId, WeatherSample};

use crate::engine::WeatherReport;
use crate::error::AppResult;
use crate::AppState;

/// Ingest weather samples directly
pub async fn ingest_weather(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
    Json(samples): Json<Vec<WeatherSample>>,
) -> AppResult<Json<WeatherReport>> {
    let report = state.engine.ingest_weather(farm_id, samples).await?;
    Ok(Json(report))
}

/// Input for pulling fresh weather from the provider
#[derive(Debug, Deserialize)]
pub struct RefreshWeatherInput {
    #[serde(default = "default_past_days")]
    pub past_days: u32,
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

fn default_past_days() -> u32 {
    7
}

fn default_forecast_days() -> u32 {
    7
}

impl Default for RefreshWeatherInput {
    fn default() -> Self {
        Self {
            past_days: default_past_days(),
            forecast_days: default_forecast_days(),
        }
    }
}

/// Pull hourly weather from the provider for the farm's grid center
/// and ingest it
pub async fn refresh_weather(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
    input: Option<Json<RefreshWeatherInput>>,
) -> AppResult<Json<WeatherReport>> {
    let Json(input) = input.unwrap_or_default();
    let farm = state.engine.get_farm(farm_id).await?;

    let grid = &farm.grid;
    let center = grid.cell_center(CellId::new(grid.rows / 2, grid.cols / 2));

    let samples = state
        .weather
        .fetch_hourly(center, input.past_days, input.forecast_days)
        .await?;
    let report = state.engine.ingest_weather(farm_id, samples).await?;
    Ok(Json(report))
}
