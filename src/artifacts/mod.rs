//! Asset store: template images in, diagnostic screenshots out.
//!
//! Diagnostics are best-effort by design: a failed export is logged and
//! never escalates, since the located element is already in hand.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::error::{AutomationError, Result};
use crate::locator::MatchCandidate;

const HIGHLIGHT: Rgba<u8> = Rgba([255, 0, 0, 255]);
/// Half-size of the box drawn around a single-pixel color match.
const COLOR_HIGHLIGHT_RADIUS: i32 = 20;

pub struct AssetStore {
    dir: PathBuf,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a template path: absolute paths pass through, bare names are
    /// taken relative to the assets directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }

    /// Load a template as grayscale. Missing or undecodable templates are
    /// fatal, not a "not found on screen" condition.
    pub fn load_template(&self, path: &Path) -> Result<GrayImage> {
        let resolved = self.resolve(path);
        let loaded = image::open(&resolved).map_err(|e| AutomationError::AssetNotFound {
            path: resolved.clone(),
            detail: e.to_string(),
        })?;
        Ok(loaded.to_luma8())
    }

    /// Export the candidate's frame with the matched text region outlined.
    pub fn save_text_match(&self, candidate: &MatchCandidate) {
        let (ox, oy) = candidate.frame.origin();
        let rect = Rect::at(candidate.bounds.left - ox, candidate.bounds.top - oy).of_size(
            candidate.bounds.width().max(1),
            candidate.bounds.height().max(1),
        );
        self.save_highlight("text_match", &candidate.label, candidate.frame.image(), rect);
    }

    /// Export the candidate's frame with a fixed-radius box around the
    /// matched pixel.
    pub fn save_color_match(&self, candidate: &MatchCandidate) {
        let (ox, oy) = candidate.frame.origin();
        let (cx, cy) = candidate.center();
        let rect = Rect::at(
            cx - ox - COLOR_HIGHLIGHT_RADIUS,
            cy - oy - COLOR_HIGHLIGHT_RADIUS,
        )
        .of_size(
            COLOR_HIGHLIGHT_RADIUS as u32 * 2,
            COLOR_HIGHLIGHT_RADIUS as u32 * 2,
        );
        self.save_highlight("color_match", &candidate.label, candidate.frame.image(), rect);
    }

    fn save_highlight(&self, kind: &str, label: &str, frame: &RgbaImage, rect: Rect) {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{kind}_{}_{timestamp}.png", sanitize_label(label));
        let path = self.dir.join(filename);

        let mut annotated = frame.clone();
        draw_hollow_rect_mut(&mut annotated, rect, HIGHLIGHT);

        let result = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|_| annotated.save(&path).map_err(|e| e.to_string()));

        match result {
            Ok(()) => tracing::info!(path = %path.display(), "diagnostic screenshot saved"),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to save diagnostic screenshot"
            ),
        }
    }
}

/// Filename-safe label: spaces become underscores, the hex `#` prefix is
/// stripped, and anything else non-alphanumeric is dropped.
fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            '#' => None,
            c if c.is_alphanumeric() || c == '_' || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScreenFrame;
    use crate::locator::BoundingBox;
    use std::sync::Arc;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("Sign in"), "Sign_in");
        assert_eq!(sanitize_label("#ff0000"), "ff0000");
        assert_eq!(sanitize_label("x.png?!"), "xpng");
    }

    #[test]
    fn test_resolve_joins_relative_paths_only() {
        let store = AssetStore::new("assets");
        assert_eq!(store.resolve(Path::new("x.png")), PathBuf::from("assets/x.png"));

        let absolute = std::env::temp_dir().join("x.png");
        assert_eq!(store.resolve(&absolute), absolute);
    }

    #[test]
    fn test_missing_template_is_asset_not_found() {
        let store = AssetStore::new(std::env::temp_dir().join("screenpilot-no-such-dir"));
        let err = store.load_template(Path::new("missing.png")).unwrap_err();
        assert!(matches!(err, AutomationError::AssetNotFound { .. }));
        assert_eq!(err.kind(), "asset_not_found");
    }

    #[test]
    fn test_save_text_match_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());

        let frame = Arc::new(ScreenFrame::new(
            RgbaImage::from_pixel(60, 40, Rgba([0, 0, 0, 255])),
            (0, 0),
        ));
        let candidate = MatchCandidate {
            bounds: BoundingBox::new(10, 10, 30, 20),
            confidence: 0.9,
            label: "Sign in".to_string(),
            frame,
        };

        store.save_text_match(&candidate);

        let saved: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(saved.len(), 1);
        let name = saved[0].as_ref().unwrap().file_name();
        let name = name.to_string_lossy();
        assert!(name.starts_with("text_match_Sign_in_"), "{name}");
        assert!(name.ends_with(".png"));
    }
}
