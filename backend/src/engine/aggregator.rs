//! Spatial aggregation
//!
//! Bins normalized detections into the farm grid and maintains per-cell
//! confidence-weighted, area-normalized density over the lookback window.
//! Updates are incremental: only the cells a batch actually touches are
//! recomputed.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use shared::{CellId, Detection, GridCell, GridDefinition};

use crate::config::EngineConfig;

/// What happened to the detections of one aggregation pass
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregateSummary {
    pub binned: usize,
    pub out_of_scope: usize,
}

/// Bin a batch of detections into their cells
///
/// Detections outside the farm grid are dropped with a logged notice;
/// they indicate a location outside farm scope, not a fault.
pub fn bin_detections(
    grid: &GridDefinition,
    cells: &mut HashMap<CellId, GridCell>,
    detections: Vec<Detection>,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> AggregateSummary {
    let mut summary = AggregateSummary::default();
    let mut touched: Vec<CellId> = Vec::new();

    for detection in detections {
        match grid.cell_for(detection.geo_location) {
            Some(id) => {
                let cell = cells.entry(id).or_insert_with(|| GridCell::new(id, now));
                cell.detection_history.push(detection);
                if !touched.contains(&id) {
                    touched.push(id);
                }
                summary.binned += 1;
            }
            None => {
                summary.out_of_scope += 1;
                tracing::warn!(
                    lat = detection.geo_location.latitude,
                    lon = detection.geo_location.longitude,
                    "Dropping detection outside farm grid"
                );
            }
        }
    }

    for id in touched {
        if let Some(cell) = cells.get_mut(&id) {
            refresh_cell(grid, cell, now, config);
        }
    }

    summary
}

/// Prune expired history and recompute the cell's windowed density
///
/// Density is the confidence-weighted count of in-window detections,
/// normalized by cell area so it is comparable across grid resolutions.
pub fn refresh_cell(
    grid: &GridDefinition,
    cell: &mut GridCell,
    now: DateTime<Utc>,
    config: &EngineConfig,
) {
    let cutoff = now - Duration::hours(config.lookback_window_hours);
    cell.detection_history.retain(|d| d.captured_at >= cutoff);
    cell.detection_history
        .sort_by_key(|d| d.captured_at);

    let weighted: f64 = cell.detection_history.iter().map(|d| d.confidence).sum();
    let area = grid.cell_area_km2(cell.id);
    cell.current_density = if area > 0.0 { weighted / area } else { 0.0 };
    cell.last_updated = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::{BoundingBox, GeoPoint};
    use uuid::Uuid;

    fn grid() -> GridDefinition {
        GridDefinition {
            origin: GeoPoint::new(25.0, 85.0),
            cell_size_deg: 0.01,
            rows: 10,
            cols: 10,
        }
    }

    fn detection(lat: f64, lon: f64, confidence: f64, captured_at: DateTime<Utc>) -> Detection {
        Detection {
            image_id: Uuid::new_v4(),
            species_class: "aphid".to_string(),
            confidence,
            geo_location: GeoPoint::new(lat, lon),
            captured_at,
            bounding_box: BoundingBox {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 10.0,
            },
        }
    }

    #[test]
    fn test_detections_binned_to_their_cells() {
        let g = grid();
        let mut cells = HashMap::new();
        let now = Utc::now();
        let batch = vec![
            detection(25.005, 85.005, 0.9, now),
            detection(25.005, 85.006, 0.8, now),
            detection(25.035, 85.075, 0.7, now),
        ];

        let summary = bin_detections(&g, &mut cells, batch, now, &EngineConfig::default());
        assert_eq!(summary.binned, 3);
        assert_eq!(summary.out_of_scope, 0);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[&CellId::new(0, 0)].detection_history.len(), 2);
        assert_eq!(cells[&CellId::new(3, 7)].detection_history.len(), 1);
    }

    #[test]
    fn test_out_of_scope_dropped_not_fatal() {
        let g = grid();
        let mut cells = HashMap::new();
        let now = Utc::now();
        let batch = vec![
            detection(25.005, 85.005, 0.9, now),
            detection(40.0, 85.005, 0.9, now),
        ];

        let summary = bin_detections(&g, &mut cells, batch, now, &EngineConfig::default());
        assert_eq!(summary.binned, 1);
        assert_eq!(summary.out_of_scope, 1);
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn test_density_confidence_weighted_and_area_normalized() {
        let g = grid();
        let mut cells = HashMap::new();
        let now = Utc::now();
        let batch = vec![
            detection(25.005, 85.005, 0.9, now),
            detection(25.005, 85.006, 0.6, now),
        ];
        bin_detections(&g, &mut cells, batch, now, &EngineConfig::default());

        let cell = &cells[&CellId::new(0, 0)];
        let expected = 1.5 / g.cell_area_km2(CellId::new(0, 0));
        assert!((cell.current_density - expected).abs() < 1e-9);
    }

    #[test]
    fn test_lookback_window_enforced_on_update() {
        let g = grid();
        let config = EngineConfig::default();
        let mut cells = HashMap::new();
        let now = Utc::now();
        let stale = now - Duration::hours(config.lookback_window_hours + 1);

        bin_detections(
            &g,
            &mut cells,
            vec![detection(25.005, 85.005, 0.9, stale)],
            stale,
            &config,
        );
        // New batch in the same cell, long after the first
        bin_detections(
            &g,
            &mut cells,
            vec![detection(25.005, 85.005, 0.8, now)],
            now,
            &config,
        );

        let cell = &cells[&CellId::new(0, 0)];
        assert_eq!(cell.detection_history.len(), 1);
        assert!((cell.detection_history[0].confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_untouched_cells_not_recomputed() {
        let g = grid();
        let config = EngineConfig::default();
        let mut cells = HashMap::new();
        let earlier = Utc::now() - Duration::hours(1);
        let now = Utc::now();

        bin_detections(
            &g,
            &mut cells,
            vec![detection(25.005, 85.005, 0.9, earlier)],
            earlier,
            &config,
        );
        bin_detections(
            &g,
            &mut cells,
            vec![detection(25.035, 85.075, 0.7, now)],
            now,
            &config,
        );

        // First cell keeps its earlier update stamp
        assert_eq!(cells[&CellId::new(0, 0)].last_updated, earlier);
        assert_eq!(cells[&CellId::new(3, 7)].last_updated, now);
    }
}
