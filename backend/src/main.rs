//! Server binary

use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pest_forecast_backend::external::{
    AlertDispatcher, HttpDetectorClient, LogDispatcher, OpenMeteoClient, PestDetector,
    WeatherProvider, WebhookDispatcher,
};
use pest_forecast_backend::{create_app, AppState, Config, ForecastEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pif_server=debug,pest_forecast_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Pest Outbreak Forecasting Server");
    tracing::info!("Environment: {}", config.environment);

    let dispatcher: Arc<dyn AlertDispatcher> = if config.dispatch.webhook_url.is_empty() {
        tracing::info!("No alert webhook configured; alerts go to the log");
        Arc::new(LogDispatcher)
    } else {
        Arc::new(WebhookDispatcher::new(&config.dispatch)?)
    };

    let detector: Option<Arc<dyn PestDetector>> = if config.detector.api_endpoint.is_empty() {
        tracing::info!("No detection service configured; raw-image ingestion disabled");
        None
    } else {
        Some(Arc::new(HttpDetectorClient::new(&config.detector)?))
    };

    let weather: Arc<dyn WeatherProvider> = Arc::new(OpenMeteoClient::new(&config.weather)?);

    let engine = Arc::new(ForecastEngine::new(config.engine.clone()).with_dispatcher(dispatcher));

    let state = AppState {
        engine,
        detector,
        weather,
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
