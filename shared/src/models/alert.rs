//! Alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::CellId;

/// Alert status per monitored cell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Normal,
    Warning,
    Escalated,
    Acknowledged,
}

/// Alert state for one `(farm, cell)` pair
///
/// Mutated only by the alert state machine; retained for audit even after
/// risk subsides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertState {
    pub status: AlertStatus,
    pub last_transition_at: DateTime<Utc>,
    /// Cycles in a row the risk score has been above the warning threshold
    pub consecutive_breaches: u32,
    /// Cycles in a row the risk score has been below the warning threshold
    pub consecutive_clears: u32,
}

impl AlertState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: AlertStatus::Normal,
            last_transition_at: now,
            consecutive_breaches: 0,
            consecutive_clears: 0,
        }
    }
}

/// Event emitted on a transition into WARNING or ESCALATED
///
/// At most one event is emitted per transition; delivery is the dispatch
/// collaborator's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub cell_id: CellId,
    pub status: AlertStatus,
    pub risk_score: f64,
    pub timestamp: DateTime<Utc>,
}
