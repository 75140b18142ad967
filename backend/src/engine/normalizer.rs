//! Detection normalizer
//!
//! Converts raw per-image detector output into canonical `Detection`
//! records: per-record validation, confidence thresholding, and
//! per-class non-max suppression so one pest is not counted from several
//! overlapping boxes.

use shared::{validate_geo_point, validate_raw_box, BoundingBox, Detection, ImageCapture, RawBox};

use crate::config::EngineConfig;

/// What happened to the records of one normalization pass
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizeSummary {
    pub accepted: usize,
    pub below_threshold: usize,
    pub suppressed: usize,
    pub invalid: usize,
}

/// Normalize the detector output for one image
///
/// Malformed boxes are skipped, never fatal; an image with zero valid
/// boxes yields an empty sequence.
pub fn normalize_capture(
    capture: &ImageCapture,
    config: &EngineConfig,
) -> (Vec<Detection>, NormalizeSummary) {
    let mut summary = NormalizeSummary::default();

    if let Err(reason) = validate_geo_point(capture.location) {
        tracing::warn!(
            image_id = %capture.image_id,
            "Skipping capture with invalid location: {reason}"
        );
        summary.invalid = capture.boxes.len();
        return (Vec::new(), summary);
    }

    let mut candidates: Vec<&RawBox> = Vec::with_capacity(capture.boxes.len());
    for raw in &capture.boxes {
        match validate_raw_box(raw) {
            Ok(()) => {
                if raw.score >= config.min_confidence {
                    candidates.push(raw);
                } else {
                    summary.below_threshold += 1;
                }
            }
            Err(reason) => {
                summary.invalid += 1;
                tracing::debug!(image_id = %capture.image_id, "Skipping malformed box: {reason}");
            }
        }
    }

    let kept = suppress_overlaps(candidates, config.nms_iou_threshold);
    summary.suppressed = capture.boxes.len()
        - summary.invalid
        - summary.below_threshold
        - kept.len();
    summary.accepted = kept.len();

    let detections = kept
        .into_iter()
        .map(|raw| Detection {
            image_id: capture.image_id,
            species_class: raw.class.clone(),
            confidence: raw.score,
            geo_location: capture.location,
            captured_at: capture.captured_at,
            bounding_box: BoundingBox {
                x: raw.x,
                y: raw.y,
                w: raw.w,
                h: raw.h,
            },
        })
        .collect();

    (detections, summary)
}

/// Greedy non-max suppression, applied per species class
///
/// Keeps the highest-scoring box of each overlapping group. Idempotent:
/// the surviving set has pairwise IoU at or below the threshold, so a
/// second pass keeps everything.
fn suppress_overlaps<'a>(mut boxes: Vec<&'a RawBox>, iou_threshold: f64) -> Vec<&'a RawBox> {
    boxes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<&RawBox> = Vec::with_capacity(boxes.len());
    for candidate in boxes {
        let cand_box = BoundingBox {
            x: candidate.x,
            y: candidate.y,
            w: candidate.w,
            h: candidate.h,
        };
        let overlaps = kept.iter().any(|k| {
            k.class == candidate.class
                && BoundingBox {
                    x: k.x,
                    y: k.y,
                    w: k.w,
                    h: k.h,
                }
                .iou(&cand_box)
                    > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::GeoPoint;
    use uuid::Uuid;

    fn raw(x: f64, y: f64, class: &str, score: f64) -> RawBox {
        RawBox {
            x,
            y,
            w: 20.0,
            h: 20.0,
            class: class.to_string(),
            score,
        }
    }

    fn capture(boxes: Vec<RawBox>) -> ImageCapture {
        ImageCapture {
            image_id: Uuid::new_v4(),
            location: GeoPoint::new(25.6, 85.1),
            captured_at: Utc::now(),
            boxes,
        }
    }

    #[test]
    fn test_empty_capture_yields_empty_output() {
        let (detections, summary) = normalize_capture(&capture(vec![]), &EngineConfig::default());
        assert!(detections.is_empty());
        assert_eq!(summary.accepted, 0);
    }

    #[test]
    fn test_invalid_records_skipped_valid_kept() {
        let boxes = vec![
            raw(0.0, 0.0, "aphid", 0.9),
            raw(100.0, 100.0, "aphid", 1.3), // out-of-range score
            raw(200.0, 0.0, "aphid", f64::NAN),
            raw(200.0, 200.0, "locust", 0.8),
        ];
        let (detections, summary) = normalize_capture(&capture(boxes), &EngineConfig::default());
        assert_eq!(detections.len(), 2);
        assert_eq!(summary.invalid, 2);
        assert_eq!(summary.accepted, 2);
    }

    #[test]
    fn test_confidence_threshold_applied() {
        let boxes = vec![raw(0.0, 0.0, "aphid", 0.4), raw(100.0, 0.0, "aphid", 0.6)];
        let (detections, summary) = normalize_capture(&capture(boxes), &EngineConfig::default());
        assert_eq!(detections.len(), 1);
        assert_eq!(summary.below_threshold, 1);
        assert!((detections[0].confidence - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_same_class_suppressed() {
        // Two heavily overlapping aphid boxes: the stronger one wins
        let boxes = vec![raw(0.0, 0.0, "aphid", 0.7), raw(2.0, 2.0, "aphid", 0.9)];
        let (detections, summary) = normalize_capture(&capture(boxes), &EngineConfig::default());
        assert_eq!(detections.len(), 1);
        assert_eq!(summary.suppressed, 1);
        assert!((detections[0].confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_overlapping_different_class_kept() {
        let boxes = vec![raw(0.0, 0.0, "aphid", 0.7), raw(2.0, 2.0, "locust", 0.9)];
        let (detections, _) = normalize_capture(&capture(boxes), &EngineConfig::default());
        assert_eq!(detections.len(), 2);
    }

    #[test]
    fn test_suppression_idempotent() {
        let boxes = vec![
            raw(0.0, 0.0, "aphid", 0.9),
            raw(3.0, 3.0, "aphid", 0.8),
            raw(50.0, 50.0, "aphid", 0.7),
            raw(52.0, 50.0, "aphid", 0.6),
        ];
        let cap = capture(boxes);
        let config = EngineConfig::default();
        let (first, _) = normalize_capture(&cap, &config);

        // Re-run suppression on the survivors
        let survivors: Vec<RawBox> = first
            .iter()
            .map(|d| RawBox {
                x: d.bounding_box.x,
                y: d.bounding_box.y,
                w: d.bounding_box.w,
                h: d.bounding_box.h,
                class: d.species_class.clone(),
                score: d.confidence,
            })
            .collect();
        let (second, summary) = normalize_capture(
            &ImageCapture {
                boxes: survivors,
                ..cap.clone()
            },
            &config,
        );
        assert_eq!(second.len(), first.len());
        assert_eq!(summary.suppressed, 0);
    }

    #[test]
    fn test_invalid_capture_location_rejects_all() {
        let mut cap = capture(vec![raw(0.0, 0.0, "aphid", 0.9)]);
        cap.location = GeoPoint::new(95.0, 85.1);
        let (detections, summary) = normalize_capture(&cap, &EngineConfig::default());
        assert!(detections.is_empty());
        assert_eq!(summary.invalid, 1);
    }
}
