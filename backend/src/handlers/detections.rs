//! HTTP handlers for detection ingestion

use axum::{
    extract::{Path, State},
    Json,
};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use shared::{GeoPoint, ImageCapture};

use crate::engine::IngestReport;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Ingest pre-processed detector output for a batch of captures
pub async fn ingest_detections(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
    Json(captures): Json<Vec<ImageCapture>>,
) -> AppResult<Json<IngestReport>> {
    let report = state.engine.ingest_detections(farm_id, captures).await?;
    Ok(Json(report))
}

/// Input for running detection on a raw image
#[derive(Debug, Deserialize)]
pub struct DetectImageInput {
    pub image_base64: String,
    pub location: GeoPoint,
    pub captured_at: DateTime<Utc>,
}

/// Run the detection service on a raw image and ingest its output
pub async fn detect_and_ingest(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
    Json(input): Json<DetectImageInput>,
) -> AppResult<Json<IngestReport>> {
    let detector = state.detector.as_ref().ok_or_else(|| {
        AppError::Configuration("Detection service endpoint not configured".to_string())
    })?;

    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(&input.image_base64)
        .map_err(|_| AppError::Validation {
            field: "image_base64".to_string(),
            message: "Image payload is not valid base64".to_string(),
        })?;

    let capture = detector
        .detect(&image_bytes, input.location, input.captured_at)
        .await?;
    let report = state.engine.ingest_detections(farm_id, vec![capture]).await?;
    Ok(Json(report))
}
