//! Route definitions for the pest outbreak forecasting API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Farm registration and inspection
        .nest("/farms", farm_routes())
}

/// Farm-scoped routes
fn farm_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_farms).post(handlers::register_farm))
        .route("/:farm_id", get(handlers::get_farm))
        .route("/:farm_id/cells", get(handlers::get_farm_cells))
        // Detection ingestion
        .route("/:farm_id/detections", post(handlers::ingest_detections))
        .route("/:farm_id/detections/image", post(handlers::detect_and_ingest))
        // Weather ingestion
        .route("/:farm_id/weather", post(handlers::ingest_weather))
        .route("/:farm_id/weather/refresh", post(handlers::refresh_weather))
        // Risk forecast
        .route("/:farm_id/forecast", get(handlers::get_forecast))
        // Alerts
        .route("/:farm_id/alerts", get(handlers::get_alerts))
        .route(
            "/:farm_id/cells/:row/:col/acknowledge",
            post(handlers::acknowledge_cell),
        )
}
