//! HTTP handlers for alert inspection and acknowledgment

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::{AlertEvent, AlertState, CellId};

use crate::error::AppResult;
use crate::AppState;

/// Alert event log for a farm, oldest first
pub async fn get_alerts(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<Vec<AlertEvent>>> {
    let alerts = state.engine.get_alerts(farm_id).await?;
    Ok(Json(alerts))
}

/// Acknowledge an alerting cell
pub async fn acknowledge_cell(
    State(state): State<AppState>,
    Path((farm_id, row, col)): Path<(Uuid, u32, u32)>,
) -> AppResult<Json<AlertState>> {
    let alert_state = state
        .engine
        .acknowledge(farm_id, CellId::new(row, col))
        .await?;
    Ok(Json(alert_state))
}
