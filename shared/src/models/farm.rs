//! Farm models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::GridDefinition;

/// A registered farm and its grid partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farm {
    pub id: Uuid,
    pub name: String,
    pub grid: GridDefinition,
    pub created_at: DateTime<Utc>,
}
