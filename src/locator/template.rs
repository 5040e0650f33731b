//! Template matching by normalized cross-correlation.

use std::sync::Arc;

use image::{DynamicImage, GrayImage};
use imageproc::template_matching::{find_extremes, match_template, MatchTemplateMethod};

use super::{BoundingBox, MatchCandidate};
use crate::capture::ScreenFrame;

/// Correlate a grayscale template against the frame and take the single
/// global maximum. Qualifies only if that maximum clears `min_confidence`;
/// the candidate's bounds cover the template's footprint at the best match,
/// so its center sits at top-left + half the template dimensions.
pub fn locate(
    frame: &Arc<ScreenFrame>,
    template: &GrayImage,
    min_confidence: f32,
    label: &str,
) -> Option<MatchCandidate> {
    // A template larger than the frame can never correlate.
    if template.width() > frame.width() || template.height() > frame.height() {
        return None;
    }

    let gray = DynamicImage::ImageRgba8(frame.image().clone()).to_luma8();
    let scores = match_template(
        &gray,
        template,
        MatchTemplateMethod::CrossCorrelationNormalized,
    );
    let extremes = find_extremes(&scores);

    if extremes.max_value < min_confidence {
        tracing::debug!(
            label,
            best = extremes.max_value,
            threshold = min_confidence,
            "template below threshold"
        );
        return None;
    }

    let (x, y) = extremes.max_value_location;
    Some(MatchCandidate {
        bounds: BoundingBox::from_local(frame, x, y, template.width(), template.height()),
        confidence: extremes.max_value,
        label: label.to_string(),
        frame: Arc::clone(frame),
    })
}
