//! Pixel color matching.

use std::sync::Arc;

use anyhow::anyhow;

use super::{BoundingBox, MatchCandidate};
use crate::capture::ScreenFrame;
use crate::error::Result;

/// Parse `"#RRGGBB"` (leading `#` optional, case-insensitive) into RGB.
pub fn parse_hex(hex: &str) -> Result<[u8; 3]> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(anyhow!("invalid hex color: {hex:?}").into());
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| anyhow!("invalid hex color: {hex:?}"))
    };

    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

pub fn format_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Scan pixels in row-major order and take the first whose per-channel
/// absolute difference from `rgb` is within `tolerance`. The fixed scan
/// order is the tie-break when several pixels qualify.
pub fn locate(frame: &Arc<ScreenFrame>, rgb: [u8; 3], tolerance: u8) -> Option<MatchCandidate> {
    let within = |a: u8, b: u8| a.abs_diff(b) <= tolerance;

    for (x, y, pixel) in frame.image().enumerate_pixels() {
        if within(pixel[0], rgb[0]) && within(pixel[1], rgb[1]) && within(pixel[2], rgb[2]) {
            return Some(MatchCandidate {
                bounds: BoundingBox::from_local(frame, x, y, 1, 1),
                confidence: 1.0,
                label: format_hex(rgb),
                frame: Arc::clone(frame),
            });
        }
    }

    None
}
