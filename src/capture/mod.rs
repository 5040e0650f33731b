//! Screen capture: raster frames of the full screen or a bounded region.
//!
//! A [`ScreenFrame`] is immutable once captured and carries the absolute
//! offset of the captured region so matches found in frame-local coordinates
//! can be translated back to screen coordinates.

use chrono::{DateTime, Utc};
use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use xcap::Monitor;

use crate::error::{AutomationError, Result};

/// Axis-aligned sub-rectangle of the screen, in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// A raster frame captured from the screen at a point in time.
///
/// Immutable after capture. `origin` is the absolute screen coordinate of
/// the frame's top-left pixel (zero for full-screen captures).
#[derive(Debug, Clone)]
pub struct ScreenFrame {
    image: RgbaImage,
    origin: (i32, i32),
    captured_at: DateTime<Utc>,
}

impl ScreenFrame {
    pub fn new(image: RgbaImage, origin: (i32, i32)) -> Self {
        Self {
            image,
            origin,
            captured_at: Utc::now(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Translate a frame-local coordinate to an absolute screen coordinate.
    pub fn to_absolute(&self, x: u32, y: u32) -> (i32, i32) {
        (self.origin.0 + x as i32, self.origin.1 + y as i32)
    }
}

/// Source of screen frames.
///
/// Abstracted behind a trait so matchers and the retry orchestrator stay
/// independent of the OS capture path and can be exercised against synthetic
/// frames in tests.
pub trait FrameSource {
    /// Capture the full screen (`region = None`) or exactly the given
    /// rectangle, recording its offset on the returned frame.
    fn capture(&self, region: Option<Region>) -> Result<ScreenFrame>;
}

/// xcap-backed capture of the primary monitor.
pub struct ScreenCapture;

impl ScreenCapture {
    pub fn new() -> Self {
        Self
    }

    fn primary_frame() -> Result<RgbaImage> {
        let monitors = Monitor::all()
            .map_err(|e| AutomationError::Capture(format!("failed to enumerate monitors: {e}")))?;

        let primary = monitors
            .into_iter()
            .find(|m| m.is_primary())
            .ok_or_else(|| AutomationError::Capture("no primary monitor found".to_string()))?;

        primary
            .capture_image()
            .map_err(|e| AutomationError::Capture(format!("failed to capture screen: {e}")))
    }
}

impl Default for ScreenCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ScreenCapture {
    fn capture(&self, region: Option<Region>) -> Result<ScreenFrame> {
        let full = Self::primary_frame()?;

        match region {
            None => Ok(ScreenFrame::new(full, (0, 0))),
            Some(r) => {
                // xcap has no sub-rectangle capture; crop the full frame.
                if r.x < 0
                    || r.y < 0
                    || (r.x as u32).saturating_add(r.width) > full.width()
                    || (r.y as u32).saturating_add(r.height) > full.height()
                {
                    return Err(AutomationError::Capture(format!(
                        "region {}x{} at ({}, {}) exceeds screen bounds {}x{}",
                        r.width,
                        r.height,
                        r.x,
                        r.y,
                        full.width(),
                        full.height()
                    )));
                }
                let cropped =
                    imageops::crop_imm(&full, r.x as u32, r.y as u32, r.width, r.height).to_image();
                Ok(ScreenFrame::new(cropped, (r.x, r.y)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_frame_translates_local_coordinates_by_origin() {
        let image = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]));
        let frame = ScreenFrame::new(image, (100, 50));
        assert_eq!(frame.to_absolute(10, 10), (110, 60));
        assert_eq!(frame.to_absolute(0, 0), (100, 50));
    }

    #[test]
    fn test_full_screen_frame_has_zero_origin() {
        let image = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let frame = ScreenFrame::new(image, (0, 0));
        assert_eq!(frame.origin(), (0, 0));
        assert_eq!((frame.width(), frame.height()), (4, 4));
    }
}
