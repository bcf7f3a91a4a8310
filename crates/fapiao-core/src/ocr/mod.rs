//! Text recognition backends.

#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "tesseract")]
mod tesseract;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// An OCR engine instance.
///
/// Implementations are configured once at construction (language profile,
/// data path) and then reused for every call. Calls take `&mut self`, so an
/// engine is never driven by two images at once.
pub trait TextRecognizer: Send {
    /// Recognize all text in `image`.
    fn recognize(&mut self, image: &DynamicImage) -> Result<RecognizedText, OcrError>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}

impl<R: TextRecognizer + ?Sized> TextRecognizer for Box<R> {
    fn recognize(&mut self, image: &DynamicImage) -> Result<RecognizedText, OcrError> {
        (**self).recognize(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// One recognized line of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,

    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],
}

impl TextLine {
    /// A line with no geometry, as produced by engines that only return text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 1.0,
            bbox: [0.0; 8],
        }
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedText {
    /// Recognized lines in reading order.
    pub lines: Vec<TextLine>,

    /// Full text (lines joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl RecognizedText {
    /// Build from lines already in reading order.
    pub fn from_lines(lines: Vec<TextLine>) -> Self {
        let text = join_lines(&lines);
        Self {
            lines,
            text,
            ..Default::default()
        }
    }

    /// Build from a whole-text blob, splitting it into non-empty lines.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(TextLine::plain)
            .collect();
        Self {
            lines,
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn line_texts(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.text.as_str())
    }

    /// Sort lines by reading order (top-to-bottom, left-to-right).
    pub fn sort_by_reading_order(&mut self) {
        self.lines.sort_by(|a, b| {
            let (_, ay, _, _) = a.rect();
            let (_, by, _, _) = b.rect();

            // Group by approximate vertical position (within 20 pixels)
            let row_a = (ay / 20.0) as i32;
            let row_b = (by / 20.0) as i32;

            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                let (ax, _, _, _) = a.rect();
                let (bx, _, _, _) = b.rect();
                ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.text = join_lines(&self.lines);
    }
}

fn join_lines(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the recognizer selected by `config.backend`.
///
/// Loading models blocks; async callers should run this on a blocking
/// thread.
pub fn create_recognizer(config: &OcrConfig) -> Result<Box<dyn TextRecognizer>, OcrError> {
    match config.backend {
        #[cfg(feature = "native")]
        crate::models::config::OcrBackend::Pure => {
            Ok(Box::new(PureOcrRecognizer::new(config.clone())?))
        }
        #[cfg(feature = "tesseract")]
        crate::models::config::OcrBackend::Tesseract => {
            Ok(Box::new(TesseractRecognizer::new(config)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(OcrError::ModelLoad(format!(
            "OCR backend {:?} is not compiled in",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn line_at(text: &str, x: f32, y: f32) -> TextLine {
        TextLine {
            text: text.to_string(),
            confidence: 0.9,
            bbox: [x, y, x + 50.0, y, x + 50.0, y + 10.0, x, y + 10.0],
        }
    }

    #[test]
    fn test_reading_order() {
        let mut result = RecognizedText::from_lines(vec![
            line_at("bottom", 0.0, 400.0),
            line_at("right", 200.0, 5.0),
            line_at("left", 10.0, 2.0),
        ]);
        result.sort_by_reading_order();

        assert_eq!(result.text, "left\nright\nbottom");
    }

    #[cfg(not(any(feature = "native", feature = "tesseract")))]
    #[test]
    fn test_backend_not_compiled_in() {
        let err = create_recognizer(&OcrConfig::default()).err().unwrap();
        assert!(matches!(err, OcrError::ModelLoad(_)));
    }

    #[test]
    fn test_from_text_skips_blank_lines() {
        let result = RecognizedText::from_text("发票\n\n  价税合计 ¥1.00 \n");
        let lines: Vec<_> = result.line_texts().collect();

        assert_eq!(lines, vec!["发票", "价税合计 ¥1.00"]);
    }
}
