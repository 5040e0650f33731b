//! Text recognition seam.
//!
//! Recognition itself is an external capability: the locator only needs a
//! list of `(bounds, text, confidence)` detections per frame. The default
//! engine is Tesseract behind the `ocr` feature; tests and embedders can
//! supply their own [`TextRecognizer`].

use serde::{Deserialize, Serialize};

use crate::capture::ScreenFrame;
use crate::error::Result;

#[cfg(feature = "ocr")]
pub mod tesseract;

#[cfg(feature = "ocr")]
pub use tesseract::TesseractRecognizer;

/// One recognized text region, in frame-local coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextDetection {
    /// Frame-local top-left corner.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
}

/// Recognition engine interface.
///
/// Implementations are expected to be expensive to initialize, so the
/// locator constructs one recognizer per session and reuses it for every
/// pass (see `Locator`).
pub trait TextRecognizer {
    /// Run a single recognition pass over the frame, returning detections
    /// in the engine's produced order.
    fn recognize(&self, frame: &ScreenFrame) -> Result<Vec<TextDetection>>;
}
