//! HTTP handler for risk forecasts

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::RiskForecast;

use crate::error::AppResult;
use crate::AppState;

/// Query parameters for a forecast request
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: i64,
}

fn default_horizon_hours() -> i64 {
    72
}

/// Project outbreak risk for every cell of a farm
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<Vec<RiskForecast>>> {
    let forecasts = state
        .engine
        .get_forecast(farm_id, query.horizon_hours)
        .await?;
    Ok(Json(forecasts))
}
