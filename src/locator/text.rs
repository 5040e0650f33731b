//! Text matching over a single recognition pass.

use std::sync::Arc;

use super::{BoundingBox, MatchCandidate};
use crate::capture::ScreenFrame;
use crate::ocr::TextDetection;

/// Strip all whitespace and casefold, so `"  Search "` and `"search"`
/// compare equal.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<String>().to_lowercase()
}

/// Find the first qualifying (variant, detection) pair.
///
/// Variants are scanned in the order supplied and outrank detection order:
/// a hit for the first variant wins even if a later variant matches an
/// earlier detection. A detection qualifies only if its confidence clears
/// `min_confidence`; with `exact` the normalized texts must be equal,
/// otherwise the normalized variant must be a substring of the normalized
/// detection.
///
/// A miss here is a normal value, not a failure; escalation is the retry
/// orchestrator's job.
pub fn locate(
    frame: &Arc<ScreenFrame>,
    detections: &[TextDetection],
    variants: &[String],
    min_confidence: f32,
    exact: bool,
) -> Option<MatchCandidate> {
    for variant in variants {
        let wanted = normalize(variant);
        if wanted.is_empty() {
            continue;
        }

        for detection in detections {
            if detection.confidence < min_confidence {
                continue;
            }

            let detected = normalize(&detection.text);
            let qualifies = if exact {
                detected == wanted
            } else {
                detected.contains(&wanted)
            };

            if qualifies {
                return Some(MatchCandidate {
                    bounds: BoundingBox::from_local(
                        frame,
                        detection.x,
                        detection.y,
                        detection.width,
                        detection.height,
                    ),
                    confidence: detection.confidence,
                    label: variant.clone(),
                    frame: Arc::clone(frame),
                });
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn frame_at(origin: (i32, i32)) -> Arc<ScreenFrame> {
        Arc::new(ScreenFrame::new(
            RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255])),
            origin,
        ))
    }

    fn detection(text: &str, confidence: f32, x: u32, y: u32) -> TextDetection {
        TextDetection {
            x,
            y,
            width: 40,
            height: 20,
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_matching_is_whitespace_and_case_insensitive() {
        let frame = frame_at((0, 0));
        let detections = vec![detection("  search ", 0.9, 10, 10)];
        let variants = vec!["Search".to_string()];

        let hit = locate(&frame, &detections, &variants, 0.4, false).unwrap();
        assert_eq!(hit.label, "Search");
    }

    #[test]
    fn test_exact_match_rejects_substrings() {
        let frame = frame_at((0, 0));
        let detections = vec![detection("Login", 0.9, 10, 10)];
        let variants = vec!["Log".to_string()];

        assert!(locate(&frame, &detections, &variants, 0.4, true).is_none());
        // Substring mode accepts the same pair.
        assert!(locate(&frame, &detections, &variants, 0.4, false).is_some());
    }

    #[test]
    fn test_low_confidence_detections_are_ignored() {
        let frame = frame_at((0, 0));
        let detections = vec![detection("Search", 0.3, 10, 10)];
        let variants = vec!["Search".to_string()];

        assert!(locate(&frame, &detections, &variants, 0.4, false).is_none());
    }

    #[test]
    fn test_variant_priority_outranks_detection_order() {
        let frame = frame_at((0, 0));
        // "Cancel" appears before "OK" in the recognition results.
        let detections = vec![detection("Cancel", 0.9, 5, 5), detection("OK", 0.9, 50, 5)];
        let variants = vec!["OK".to_string(), "Cancel".to_string()];

        let hit = locate(&frame, &detections, &variants, 0.4, false).unwrap();
        assert_eq!(hit.label, "OK");
    }

    #[test]
    fn test_first_qualifying_detection_wins_within_a_variant() {
        let frame = frame_at((0, 0));
        let detections = vec![
            detection("Save", 0.3, 5, 5),
            detection("Save", 0.8, 60, 5),
            detection("Save", 0.9, 120, 5),
        ];
        let variants = vec!["Save".to_string()];

        let hit = locate(&frame, &detections, &variants, 0.4, false).unwrap();
        // The 0.3 detection fails the gate; the next in produced order wins.
        assert_eq!(hit.bounds.left, 60);
    }

    #[test]
    fn test_bounds_are_translated_by_region_offset() {
        let frame = frame_at((100, 50));
        let detections = vec![detection("Go", 0.9, 10, 10)];
        let variants = vec!["Go".to_string()];

        let hit = locate(&frame, &detections, &variants, 0.4, false).unwrap();
        assert_eq!((hit.bounds.left, hit.bounds.top), (110, 60));
        assert_eq!((hit.bounds.right, hit.bounds.bottom), (150, 80));
    }
}
