//! Tesseract-backed text recognition (feature `ocr`).

use anyhow::{anyhow, Context};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tesseract::Tesseract;

use super::{TextDetection, TextRecognizer};
use crate::capture::ScreenFrame;
use crate::error::Result;

/// Long-lived recognizer configuration.
///
/// The tesseract binding consumes its native handle per image, so language
/// and datapath are fixed here once and the handle is rebuilt for each
/// recognition pass.
pub struct TesseractRecognizer {
    language: String,
    datapath: Option<String>,
}

impl TesseractRecognizer {
    /// English-language recognizer with the system-default data path.
    pub fn new() -> Self {
        Self::with_language("eng")
    }

    pub fn with_language(language: &str) -> Self {
        Self {
            language: language.to_string(),
            datapath: None,
        }
    }

    pub fn with_datapath(mut self, datapath: impl Into<String>) -> Self {
        self.datapath = Some(datapath.into());
        self
    }

    fn encode_grayscale_png(frame: &ScreenFrame) -> anyhow::Result<Vec<u8>> {
        // Grayscale input gives noticeably better recognition on UI text.
        let gray = image::DynamicImage::ImageRgba8(frame.image().clone()).to_luma8();
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(
                gray.as_raw(),
                gray.width(),
                gray.height(),
                ExtendedColorType::L8,
            )
            .context("failed to encode frame for recognition")?;
        Ok(buffer)
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, frame: &ScreenFrame) -> Result<Vec<TextDetection>> {
        let png = Self::encode_grayscale_png(frame)?;

        let mut tess = Tesseract::new(self.datapath.as_deref(), Some(&self.language))
            .map_err(|e| anyhow!("tesseract init failed: {e}"))?
            .set_image_from_mem(&png)
            .map_err(|e| anyhow!("tesseract rejected frame: {e}"))?;

        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| anyhow!("tesseract recognition failed: {e}"))?;

        Ok(parse_tsv(&tsv))
    }
}

/// Parse Tesseract TSV output into word-level detections.
///
/// Columns: level page block par line word left top width height conf text.
/// Word rows carry level 5; non-word rows have conf -1 and are skipped.
fn parse_tsv(tsv: &str) -> Vec<TextDetection> {
    let mut detections = Vec::new();

    for line in tsv.lines() {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let parsed = (
            cols[6].parse::<u32>(),
            cols[7].parse::<u32>(),
            cols[8].parse::<u32>(),
            cols[9].parse::<u32>(),
            cols[10].parse::<f32>(),
        );
        let (Ok(x), Ok(y), Ok(width), Ok(height), Ok(conf)) = parsed else {
            continue;
        };

        let text = cols[11].trim();
        if conf < 0.0 || text.is_empty() {
            continue;
        }

        detections.push(TextDetection {
            x,
            y,
            width,
            height,
            text: text.to_string(),
            confidence: conf / 100.0,
        });
    }

    detections
}
