//! Pest detection client
//!
//! Client for the hosted vision microservice that runs pest detection on
//! drone imagery. The engine only ever sees the resulting `ImageCapture`;
//! whatever model runs behind the endpoint is invisible past this seam.

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::{GeoPoint, ImageCapture, RawBox};

use crate::config::DetectorConfig;
use crate::error::{AppError, AppResult};

/// Runs pest detection on one captured image
#[async_trait]
pub trait PestDetector: Send + Sync {
    async fn detect(
        &self,
        image_bytes: &[u8],
        location: GeoPoint,
        captured_at: DateTime<Utc>,
    ) -> AppResult<ImageCapture>;
}

/// HTTP client for the detection microservice
#[derive(Clone)]
pub struct HttpDetectorClient {
    api_endpoint: String,
    api_key: String,
    http_client: Client,
}

/// Request to run detection on an image
#[derive(Debug, Serialize)]
struct DetectRequest {
    image_base64: String,
}

/// Response from the detection API
#[derive(Debug, Deserialize)]
struct DetectResponse {
    boxes: Vec<ApiBox>,
}

#[derive(Debug, Deserialize)]
struct ApiBox {
    x: f64,
    y: f64,
    #[serde(alias = "width")]
    w: f64,
    #[serde(alias = "height")]
    h: f64,
    #[serde(alias = "class_name")]
    class: String,
    #[serde(alias = "confidence")]
    score: f64,
}

impl HttpDetectorClient {
    pub fn new(config: &DetectorConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl PestDetector for HttpDetectorClient {
    async fn detect(
        &self,
        image_bytes: &[u8],
        location: GeoPoint,
        captured_at: DateTime<Utc>,
    ) -> AppResult<ImageCapture> {
        let request = DetectRequest {
            image_base64: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        };

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::DetectorUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::DetectorUnavailable(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: DetectResponse = response
            .json()
            .await
            .map_err(|e| AppError::DetectorUnavailable(format!("Failed to parse response: {}", e)))?;

        Ok(ImageCapture {
            image_id: Uuid::new_v4(),
            location,
            captured_at,
            boxes: result
                .boxes
                .into_iter()
                .map(|b| RawBox {
                    x: b.x,
                    y: b.y,
                    w: b.w,
                    h: b.h,
                    class: b.class,
                    score: b.score,
                })
                .collect(),
        })
    }
}
