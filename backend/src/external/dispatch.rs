//! Alert dispatch
//!
//! Outbound delivery of alert events. The engine emits at most one event
//! per state transition and hands it here; delivery failures are the
//! dispatcher's problem and never feed back into alert state.

use async_trait::async_trait;
use reqwest::Client;

use shared::AlertEvent;

use crate::config::DispatchConfig;
use crate::error::{AppError, AppResult};

/// Delivers alert events to an external channel
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, event: &AlertEvent) -> AppResult<()>;
}

/// POSTs alert events to a configured webhook
#[derive(Clone)]
pub struct WebhookDispatcher {
    webhook_url: String,
    http_client: Client,
}

impl WebhookDispatcher {
    pub fn new(config: &DispatchConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            webhook_url: config.webhook_url.clone(),
            http_client,
        })
    }
}

#[async_trait]
impl AlertDispatcher for WebhookDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> AppResult<()> {
        let response = self
            .http_client
            .post(&self.webhook_url)
            .json(event)
            .send()
            .await
            .map_err(|e| AppError::DispatchFailed(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::DispatchFailed(format!(
                "Webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Writes alert events to the application log
///
/// The default channel when no webhook is configured.
#[derive(Clone, Default)]
pub struct LogDispatcher;

#[async_trait]
impl AlertDispatcher for LogDispatcher {
    async fn dispatch(&self, event: &AlertEvent) -> AppResult<()> {
        tracing::warn!(
            farm_id = %event.farm_id,
            cell = %event.cell_id,
            status = ?event.status,
            risk = event.risk_score,
            "PEST ALERT"
        );
        Ok(())
    }
}
