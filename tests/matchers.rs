//! End-to-end locator tests against synthetic screens.
//!
//! These drive the full request -> retry -> capture -> match pipeline with
//! injected frame sources and recognizers, so they run headless.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{imageops, Rgba, RgbaImage};

use screenpilot::artifacts::AssetStore;
use screenpilot::{
    AutomationError, FrameSource, Locator, MatchRequest, Region, RetryPolicy, ScreenFrame,
    TextDetection, TextRecognizer,
};

/// Frame source backed by one fixed synthetic screen. Region capture crops
/// exactly like the real source and records the offset.
struct StaticScreen {
    image: RgbaImage,
    captures: Arc<AtomicU32>,
}

impl StaticScreen {
    fn new(image: RgbaImage) -> Self {
        Self {
            image,
            captures: Arc::new(AtomicU32::new(0)),
        }
    }

    fn capture_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.captures)
    }
}

impl FrameSource for StaticScreen {
    fn capture(&self, region: Option<Region>) -> screenpilot::Result<ScreenFrame> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        match region {
            None => Ok(ScreenFrame::new(self.image.clone(), (0, 0))),
            Some(r) => {
                let cropped =
                    imageops::crop_imm(&self.image, r.x as u32, r.y as u32, r.width, r.height)
                        .to_image();
                Ok(ScreenFrame::new(cropped, (r.x, r.y)))
            }
        }
    }
}

/// Recognizer returning a fixed detection list for every frame.
struct FixedRecognizer {
    detections: Vec<TextDetection>,
}

impl TextRecognizer for FixedRecognizer {
    fn recognize(&self, _frame: &ScreenFrame) -> screenpilot::Result<Vec<TextDetection>> {
        Ok(self.detections.clone())
    }
}

/// Recognizer that never sees anything.
struct BlindRecognizer;

impl TextRecognizer for BlindRecognizer {
    fn recognize(&self, _frame: &ScreenFrame) -> screenpilot::Result<Vec<TextDetection>> {
        Ok(Vec::new())
    }
}

fn detection(text: &str, confidence: f32, x: u32, y: u32, w: u32, h: u32) -> TextDetection {
    TextDetection {
        x,
        y,
        width: w,
        height: h,
        text: text.to_string(),
        confidence,
    }
}

fn blank_screen(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([30, 30, 30, 255]))
}

fn make_locator(
    source: Box<dyn FrameSource>,
    recognizer: Box<dyn TextRecognizer>,
    assets_dir: &Path,
) -> Locator {
    Locator::new(source, recognizer, AssetStore::new(assets_dir), false)
}

// ============================================================================
// Text matching
// ============================================================================

#[test]
fn test_text_match_is_normalized_and_region_aware() {
    let assets = tempfile::tempdir().unwrap();
    let source = Box::new(StaticScreen::new(blank_screen(400, 300)));
    let recognizer = Box::new(FixedRecognizer {
        detections: vec![detection("  search ", 0.85, 10, 10, 40, 20)],
    });
    let locator = make_locator(source, recognizer, assets.path());

    let request = MatchRequest::text(["Search"])
        .within(Region::new(100, 50, 200, 150))
        .retry(RetryPolicy::once());

    let hit = locator.find(&request).unwrap();
    // Local (10, 10) inside region (100, 50) is absolute (110, 60).
    assert_eq!((hit.bounds.left, hit.bounds.top), (110, 60));
    assert_eq!(hit.center(), (130, 70));
    assert_eq!(hit.label, "Search");
    assert_eq!(hit.frame.origin(), (100, 50));
}

#[test]
fn test_exact_text_match_rejects_longer_detection() {
    let assets = tempfile::tempdir().unwrap();
    let source = Box::new(StaticScreen::new(blank_screen(100, 100)));
    let recognizer = Box::new(FixedRecognizer {
        detections: vec![detection("Login", 0.9, 5, 5, 40, 15)],
    });
    let locator = make_locator(source, recognizer, assets.path());

    let request = MatchRequest::text(["Log"])
        .exact(true)
        .retry(RetryPolicy::once());

    let err = locator.find(&request).unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound { .. }));
}

#[test]
fn test_confidence_floor_filters_matching_text() {
    let assets = tempfile::tempdir().unwrap();
    let source = Box::new(StaticScreen::new(blank_screen(100, 100)));
    let recognizer = Box::new(FixedRecognizer {
        detections: vec![detection("Search", 0.3, 5, 5, 40, 15)],
    });
    let locator = make_locator(source, recognizer, assets.path());

    let request = MatchRequest::text(["Search"])
        .min_confidence(0.4)
        .retry(RetryPolicy::once());

    assert!(locator.find(&request).is_err());
}

// ============================================================================
// Template matching
// ============================================================================

/// Screen with a distinctive checker block at (x, y).
fn screen_with_marker(x: u32, y: u32) -> (RgbaImage, RgbaImage) {
    let mut screen = blank_screen(200, 150);
    let mut marker = RgbaImage::new(12, 12);
    for (mx, my, pixel) in marker.enumerate_pixels_mut() {
        let value = if (mx / 3 + my / 3) % 2 == 0 { 250 } else { 15 };
        *pixel = Rgba([value, value, value, 255]);
        screen.put_pixel(x + mx, y + my, *pixel);
    }
    (screen, marker)
}

#[test]
fn test_template_match_center_and_confidence() {
    let assets = tempfile::tempdir().unwrap();
    let (screen, marker) = screen_with_marker(70, 40);
    marker.save(assets.path().join("marker.png")).unwrap();

    let source = Box::new(StaticScreen::new(screen));
    let locator = make_locator(source, Box::new(BlindRecognizer), assets.path());

    let request = MatchRequest::template("marker.png").retry(RetryPolicy::once());
    let hit = locator.find(&request).unwrap();

    assert_eq!((hit.bounds.left, hit.bounds.top), (70, 40));
    // Center = top-left + half the template dimensions.
    assert_eq!(hit.center(), (76, 46));
    assert!(hit.confidence >= 0.8);
    assert_eq!(hit.label, "marker");
}

#[test]
fn test_missing_template_is_fatal_before_any_capture() {
    let assets = tempfile::tempdir().unwrap();
    let source = StaticScreen::new(blank_screen(50, 50));
    let captures = source.capture_counter();
    let locator = Locator::new(
        Box::new(source),
        Box::new(BlindRecognizer),
        AssetStore::new(assets.path()),
        false,
    );

    let request = MatchRequest::template("nope.png")
        .retry(RetryPolicy::new(5, Duration::from_secs(1)));

    let err = locator.find(&request).unwrap_err();
    assert!(matches!(err, AutomationError::AssetNotFound { .. }));
    // Fatal on load: the retry loop never ran, no frame was captured.
    assert_eq!(captures.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Color matching
// ============================================================================

#[test]
fn test_color_match_respects_tolerance_boundaries() {
    let assets = tempfile::tempdir().unwrap();
    let mut screen = RgbaImage::from_pixel(60, 60, Rgba([200, 200, 200, 255]));
    screen.put_pixel(25, 12, Rgba([10, 10, 10, 255]));
    let source = Box::new(StaticScreen::new(screen));
    let locator = make_locator(source, Box::new(BlindRecognizer), assets.path());

    // diff = 2 per channel, within tolerance 5
    let hit = locator
        .find(&MatchRequest::color([12, 12, 12], 5).retry(RetryPolicy::once()))
        .unwrap();
    assert_eq!(hit.center(), (25, 12));

    // diff = 10 per channel, outside tolerance 5
    let err = locator
        .find(&MatchRequest::color([20, 20, 20], 5).retry(RetryPolicy::once()))
        .unwrap_err();
    assert!(matches!(err, AutomationError::ElementNotFound { .. }));
}

#[test]
fn test_color_hex_request_matches_and_labels() {
    let assets = tempfile::tempdir().unwrap();
    let mut screen = blank_screen(40, 40);
    screen.put_pixel(8, 3, Rgba([255, 0, 0, 255]));
    let source = Box::new(StaticScreen::new(screen));
    let locator = make_locator(source, Box::new(BlindRecognizer), assets.path());

    let request = MatchRequest::color_hex("#FF0000", 0)
        .unwrap()
        .retry(RetryPolicy::once());
    let hit = locator.find(&request).unwrap();
    assert_eq!(hit.center(), (8, 3));
    assert_eq!(hit.label, "#ff0000");
}

// ============================================================================
// Diagnostic artifacts
// ============================================================================

#[test]
fn test_text_match_exports_highlighted_screenshot() {
    let assets = tempfile::tempdir().unwrap();
    let source = Box::new(StaticScreen::new(blank_screen(80, 60)));
    let recognizer = Box::new(FixedRecognizer {
        detections: vec![detection("Save file", 0.9, 10, 10, 30, 12)],
    });
    // save_artifacts on for this one
    let locator = Locator::new(
        source,
        recognizer,
        AssetStore::new(assets.path()),
        true,
    );

    locator
        .find(&MatchRequest::text(["Save file"]).retry(RetryPolicy::once()))
        .unwrap();

    let names: Vec<String> = std::fs::read_dir(assets.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("text_match_Save_file_"), "{names:?}");
    assert!(names[0].ends_with(".png"));
}
