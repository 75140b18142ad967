//! Pest Outbreak Risk Forecasting - Backend Server
//!
//! Turns drone-captured pest detections and hourly weather into per-cell
//! outbreak risk scores, short-term forecasts, and debounced alerts for
//! registered farms.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod engine;
pub mod error;
pub mod external;
pub mod handlers;
pub mod routes;

pub use config::Config;
pub use engine::ForecastEngine;

use external::{PestDetector, WeatherProvider};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForecastEngine>,
    pub detector: Option<Arc<dyn PestDetector>>,
    pub weather: Arc<dyn WeatherProvider>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Pest Outbreak Risk Forecasting API v1.0"
}
