//! Pure Rust OCR recognizer using `pure-onnx-ocr`.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{RecognizedText, TextLine, TextRecognizer};

/// Recognizer backed by PaddleOCR models through `pure-onnx-ocr`.
///
/// Expects `det.onnx`, `<language>_rec.onnx` and `<language>_dict.txt` in
/// the configured data directory.
pub struct PureOcrRecognizer {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrRecognizer {
    /// Load the models named by `config`.
    pub fn new(config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.data_file("det.onnx");
        let rec_path = config.data_file(&format!("{}_rec.onnx", config.language));
        let dict_path = config.data_file(&format!("{}_dict.txt", config.language));

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "missing model file {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded pure-onnx-ocr engine ({}) from {}",
            config.language,
            config.data_path.display()
        );

        Ok(Self { engine, config })
    }
}

impl TextRecognizer for PureOcrRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        info!("Recognizing image: {}x{}", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("pure-onnx-ocr returned {} text regions", results.len());

        let lines = results
            .iter()
            .map(|r| {
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextLine {
                    text,
                    confidence: r.confidence,
                    bbox: polygon_to_bbox(&r.bounding_box),
                }
            })
            .collect();

        let mut result = RecognizedText::from_lines(lines);
        result.sort_by_reading_order();
        result.image_size = (width, height);
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "OCR complete: {} lines in {}ms",
            result.lines.len(),
            result.processing_time_ms
        );

        Ok(result)
    }

    fn name(&self) -> &str {
        "pure-onnx-ocr"
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
