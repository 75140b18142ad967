//! Farm grid models
//!
//! A farm is partitioned into a fixed rectangular grid of lat/lon cells.
//! Cells localize risk within the farm and hold the bounded detection
//! history the risk model consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Detection;
use crate::types::{CellId, GeoPoint, KM_PER_DEG_LAT};

/// Geographic partition scheme for one farm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridDefinition {
    /// South-west corner of the grid
    pub origin: GeoPoint,
    /// Side length of a square cell, in degrees
    pub cell_size_deg: f64,
    pub rows: u32,
    pub cols: u32,
}

impl GridDefinition {
    /// Cell containing a point, or `None` if the point is outside the farm
    pub fn cell_for(&self, point: GeoPoint) -> Option<CellId> {
        let d_lat = point.latitude - self.origin.latitude;
        let d_lon = point.longitude - self.origin.longitude;
        if d_lat < 0.0 || d_lon < 0.0 {
            return None;
        }
        let row = (d_lat / self.cell_size_deg).floor() as i64;
        let col = (d_lon / self.cell_size_deg).floor() as i64;
        if row >= self.rows as i64 || col >= self.cols as i64 {
            return None;
        }
        Some(CellId::new(row as u32, col as u32))
    }

    /// Approximate cell area in km², longitude scaled by the cell row's
    /// center latitude
    pub fn cell_area_km2(&self, cell: CellId) -> f64 {
        let center_lat = self.origin.latitude + (cell.row as f64 + 0.5) * self.cell_size_deg;
        let km_lat = self.cell_size_deg * KM_PER_DEG_LAT;
        let km_lon = self.cell_size_deg * KM_PER_DEG_LAT * center_lat.to_radians().cos();
        km_lat * km_lon.abs()
    }

    /// Center coordinates of a cell
    pub fn cell_center(&self, cell: CellId) -> GeoPoint {
        GeoPoint::new(
            self.origin.latitude + (cell.row as f64 + 0.5) * self.cell_size_deg,
            self.origin.longitude + (cell.col as f64 + 0.5) * self.cell_size_deg,
        )
    }
}

/// Per-cell engine state
///
/// Created lazily on first detection within its bounds; never deleted while
/// the farm is active. The detection history is pruned to the lookback
/// window on every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCell {
    pub id: CellId,
    pub detection_history: Vec<Detection>,
    pub current_density: f64,
    pub current_risk_score: f64,
    pub last_updated: DateTime<Utc>,
}

impl GridCell {
    pub fn new(id: CellId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            detection_history: Vec::new(),
            current_density: 0.0,
            current_risk_score: 0.0,
            last_updated: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridDefinition {
        GridDefinition {
            origin: GeoPoint::new(25.0, 85.0),
            cell_size_deg: 0.01,
            rows: 10,
            cols: 10,
        }
    }

    #[test]
    fn test_cell_for_origin_corner() {
        assert_eq!(grid().cell_for(GeoPoint::new(25.0, 85.0)), Some(CellId::new(0, 0)));
    }

    #[test]
    fn test_cell_for_interior() {
        assert_eq!(
            grid().cell_for(GeoPoint::new(25.035, 85.071)),
            Some(CellId::new(3, 7))
        );
    }

    #[test]
    fn test_cell_for_out_of_bounds() {
        let g = grid();
        assert_eq!(g.cell_for(GeoPoint::new(24.99, 85.05)), None);
        assert_eq!(g.cell_for(GeoPoint::new(25.05, 84.99)), None);
        // One full grid width past the edge
        assert_eq!(g.cell_for(GeoPoint::new(25.15, 85.05)), None);
    }

    #[test]
    fn test_cell_area_positive_and_plausible() {
        // 0.01 deg at ~25°N: roughly 1.11 km x 1.0 km
        let area = grid().cell_area_km2(CellId::new(0, 0));
        assert!(area > 0.9 && area < 1.3, "area = {area}");
    }
}
