//! HTTP handlers for farm registration and inspection

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{Farm, GeoPoint, GridCell, GridDefinition};

use crate::error::AppResult;
use crate::AppState;

/// Input for registering a farm and its monitoring grid
#[derive(Debug, Deserialize)]
pub struct RegisterFarmInput {
    pub name: String,
    /// South-west corner of the grid
    pub origin: GeoPoint,
    pub cell_size_deg: f64,
    pub rows: u32,
    pub cols: u32,
}

/// Register a new farm
pub async fn register_farm(
    State(state): State<AppState>,
    Json(input): Json<RegisterFarmInput>,
) -> AppResult<Json<Farm>> {
    let grid = GridDefinition {
        origin: input.origin,
        cell_size_deg: input.cell_size_deg,
        rows: input.rows,
        cols: input.cols,
    };
    let farm = state.engine.register_farm(input.name, grid).await?;
    Ok(Json(farm))
}

/// List all registered farms
pub async fn list_farms(State(state): State<AppState>) -> AppResult<Json<Vec<Farm>>> {
    Ok(Json(state.engine.list_farms().await))
}

/// Get a farm by ID
pub async fn get_farm(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<Farm>> {
    let farm = state.engine.get_farm(farm_id).await?;
    Ok(Json(farm))
}

/// Get the current cell states of a farm
pub async fn get_farm_cells(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<Vec<GridCell>>> {
    let cells = state.engine.get_cells(farm_id).await?;
    Ok(Json(cells))
}
