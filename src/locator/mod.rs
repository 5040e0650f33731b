//! Element location engine.
//!
//! A [`Locator`] owns the frame source, the recognition engine, and the
//! asset store, and resolves [`MatchRequest`]s through the bounded-retry
//! orchestrator: each attempt captures a fresh frame, runs the matcher for
//! the requested target kind, and either yields a [`MatchCandidate`] or
//! consumes one attempt from the budget.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifacts::AssetStore;
use crate::capture::{FrameSource, Region, ScreenFrame};
use crate::error::Result;
use crate::ocr::TextRecognizer;

pub mod color;
pub mod retry;
pub mod template;
pub mod text;

pub use retry::RetryPolicy;

/// Axis-aligned box in absolute screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Box for a frame-local rectangle, translated to absolute coordinates.
    pub fn from_local(frame: &ScreenFrame, x: u32, y: u32, width: u32, height: u32) -> Self {
        let (left, top) = frame.to_absolute(x, y);
        Self {
            left,
            top,
            right: left + width as i32,
            bottom: top + height as i32,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.left + self.right) / 2, (self.top + self.bottom) / 2)
    }

    pub fn width(&self) -> u32 {
        (self.right - self.left).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.bottom - self.top).max(0) as u32
    }
}

/// A located element: where it is, how confident the matcher was, what it
/// matched, and the frame it was found in (kept for diagnostics).
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub bounds: BoundingBox,
    pub confidence: f32,
    pub label: String,
    pub frame: Arc<ScreenFrame>,
}

impl MatchCandidate {
    /// Absolute screen point input actions are aimed at.
    pub fn center(&self) -> (i32, i32) {
        self.bounds.center()
    }
}

/// What to look for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Ordered text variants; earlier variants outrank any detection-order
    /// preference of later ones.
    Text {
        variants: Vec<String>,
        min_confidence: f32,
        exact: bool,
    },
    /// Reference image, normalized cross-correlation above threshold.
    Template {
        path: PathBuf,
        min_confidence: f32,
    },
    /// First pixel within per-channel tolerance of the target color.
    Color { rgb: [u8; 3], tolerance: u8 },
}

impl Target {
    /// Short human-readable description used in logs and `ElementNotFound`.
    pub fn describe(&self) -> String {
        match self {
            Target::Text { variants, .. } => format!("text {:?}", variants),
            Target::Template { path, .. } => format!("template {}", path.display()),
            Target::Color { rgb, tolerance } => format!(
                "color #{:02x}{:02x}{:02x} (tolerance {})",
                rgb[0], rgb[1], rgb[2], tolerance
            ),
        }
    }
}

/// A complete locate call: target descriptor, optional bounding region, and
/// retry policy. Constructed once per call and consumed by the retry loop.
///
/// `retry: None` means "use the session default"; [`AutomationContext`]
/// fills it from its config before dispatch, and a bare [`Locator`] falls
/// back to [`RetryPolicy::default`].
///
/// [`AutomationContext`]: crate::context::AutomationContext
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub target: Target,
    pub region: Option<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
}

impl MatchRequest {
    /// Text target with the original defaults: substring match, confidence
    /// floor 0.4.
    pub fn text<I, S>(variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: Target::Text {
                variants: variants.into_iter().map(Into::into).collect(),
                min_confidence: 0.4,
                exact: false,
            },
            region: None,
            retry: None,
        }
    }

    /// Template target, confidence threshold 0.8 by default.
    pub fn template(path: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Template {
                path: path.into(),
                min_confidence: 0.8,
            },
            region: None,
            retry: None,
        }
    }

    pub fn color(rgb: [u8; 3], tolerance: u8) -> Self {
        Self {
            target: Target::Color { rgb, tolerance },
            region: None,
            retry: None,
        }
    }

    /// Color target from a hex string such as `"#FF0000"`.
    pub fn color_hex(hex: &str, tolerance: u8) -> Result<Self> {
        Ok(Self::color(color::parse_hex(hex)?, tolerance))
    }

    /// Require exact (whole-detection) text equality instead of substring
    /// containment. Only meaningful for text targets.
    pub fn exact(mut self, exact: bool) -> Self {
        if let Target::Text { exact: e, .. } = &mut self.target {
            *e = exact;
        }
        self
    }

    /// Override the confidence threshold for text and template targets.
    pub fn min_confidence(mut self, confidence: f32) -> Self {
        match &mut self.target {
            Target::Text { min_confidence, .. } => *min_confidence = confidence,
            Target::Template { min_confidence, .. } => *min_confidence = confidence,
            Target::Color { .. } => {}
        }
        self
    }

    /// Restrict capture and search to a screen region.
    pub fn within(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Fill in the retry policy when the request does not carry its own.
    /// An explicit per-request policy always wins.
    pub fn or_retry(mut self, default: RetryPolicy) -> Self {
        self.retry.get_or_insert(default);
        self
    }
}

/// Element locator: the session-scoped owner of the recognition engine,
/// frame source, and asset store.
pub struct Locator {
    source: Box<dyn FrameSource>,
    recognizer: Box<dyn TextRecognizer>,
    assets: AssetStore,
    save_artifacts: bool,
}

impl Locator {
    pub fn new(
        source: Box<dyn FrameSource>,
        recognizer: Box<dyn TextRecognizer>,
        assets: AssetStore,
        save_artifacts: bool,
    ) -> Self {
        Self {
            source,
            recognizer,
            assets,
            save_artifacts,
        }
    }

    /// Single capture through the session's frame source, no matching.
    pub fn capture(&self, region: Option<Region>) -> Result<ScreenFrame> {
        self.source.capture(region)
    }

    /// Resolve a match request, retrying against fresh captures per the
    /// request's policy. Returns the first qualifying candidate or
    /// `ElementNotFound` once the attempt budget is exhausted.
    ///
    /// A missing or unreadable template image is fatal (`AssetNotFound`) and
    /// is raised before any capture or retry.
    pub fn find(&self, request: &MatchRequest) -> Result<MatchCandidate> {
        let target = request.target.describe();
        let retry = request.retry.unwrap_or_default();

        let candidate = match &request.target {
            Target::Text {
                variants,
                min_confidence,
                exact,
            } => retry::run(&retry, &target, |_attempt| {
                let frame = Arc::new(self.source.capture(request.region)?);
                let detections = self.recognizer.recognize(&frame)?;
                Ok(text::locate(
                    &frame,
                    &detections,
                    variants,
                    *min_confidence,
                    *exact,
                ))
            })?,

            Target::Template {
                path,
                min_confidence,
            } => {
                let template = self.assets.load_template(path)?;
                let label = template_label(path);
                retry::run(&retry, &target, |_attempt| {
                    let frame = Arc::new(self.source.capture(request.region)?);
                    Ok(template::locate(&frame, &template, *min_confidence, &label))
                })?
            }

            Target::Color { rgb, tolerance } => {
                retry::run(&retry, &target, |_attempt| {
                    let frame = Arc::new(self.source.capture(request.region)?);
                    Ok(color::locate(&frame, *rgb, *tolerance))
                })?
            }
        };

        if self.save_artifacts {
            match &request.target {
                Target::Text { .. } => self.assets.save_text_match(&candidate),
                Target::Color { .. } => self.assets.save_color_match(&candidate),
                Target::Template { .. } => {}
            }
        }

        tracing::info!(
            target = %target,
            confidence = candidate.confidence,
            center = ?candidate.center(),
            "element located"
        );

        Ok(candidate)
    }
}

fn template_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
