//! Risk forecast models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::CellId;

/// Uncertainty bounds around a predicted risk, both in `[0,1]`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceBand {
    pub lower: f64,
    pub upper: f64,
}

/// One projected risk point for one cell at one future timestamp
///
/// Produced per forecast run; not persisted beyond the run unless the
/// caller chooses to store it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskForecast {
    pub farm_id: Uuid,
    pub cell_id: CellId,
    pub horizon_timestamp: DateTime<Utc>,
    pub predicted_risk: f64,
    pub confidence_band: ConfidenceBand,
}
