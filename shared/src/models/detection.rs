//! Detection models
//!
//! Raw detector output and the canonical `Detection` records the engine
//! works with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GeoPoint;

/// One raw box from the detector collaborator, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub class: String,
    pub score: f64,
}

/// Detector output for a single drone image, plus capture metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCapture {
    pub image_id: Uuid,
    pub location: GeoPoint,
    pub captured_at: DateTime<Utc>,
    pub boxes: Vec<RawBox>,
}

/// Axis-aligned bounding box within an image, in pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Intersection-over-union with another box
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let ix = (self.x + self.w).min(other.x + other.w) - self.x.max(other.x);
        let iy = (self.y + self.h).min(other.y + other.h) - self.y.max(other.y);
        if ix <= 0.0 || iy <= 0.0 {
            return 0.0;
        }
        let intersection = ix * iy;
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// One pest sighting inferred from one image region
///
/// Immutable once created by the normalizer; retained per cell for the
/// configured lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub image_id: Uuid,
    pub species_class: String,
    pub confidence: f64,
    pub geo_location: GeoPoint,
    pub captured_at: DateTime<Utc>,
    pub bounding_box: BoundingBox,
}
