//! Tesseract recognizer via `leptess`.
//!
//! The `LepTess` handle is created on, and never leaves, a dedicated worker
//! thread. The recognizer itself only holds the sending half of a job queue.

use std::io::Cursor;
use std::thread;
use std::time::Instant;

use image::{DynamicImage, GenericImageView, ImageFormat};
use leptess::LepTess;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{RecognizedText, TextRecognizer};

/// One PNG-encoded page and the channel its text goes back on.
type Job = (Vec<u8>, oneshot::Sender<Result<String, OcrError>>);

/// Recognizer backed by a Tesseract instance initialized once with the
/// configured language profile and tessdata path.
///
/// Construction and recognition block the calling thread; call them from
/// blocking contexts.
pub struct TesseractRecognizer {
    jobs: mpsc::Sender<Job>,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let data_path = config
            .data_path
            .to_str()
            .ok_or_else(|| {
                OcrError::ModelLoad(format!(
                    "tessdata path is not UTF-8: {}",
                    config.data_path.display()
                ))
            })?
            .to_string();
        let language = config.language.clone();

        let (jobs, queue) = mpsc::channel::<Job>(1);
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name("tesseract".to_string())
            .spawn(move || run_worker(&data_path, &language, ready_tx, queue))
            .map_err(|e| OcrError::ModelLoad(format!("failed to start Tesseract worker: {}", e)))?;

        ready_rx.blocking_recv().map_err(|_| {
            OcrError::ModelLoad("Tesseract worker exited during startup".to_string())
        })??;

        info!(
            "Initialized Tesseract ({}) from {}",
            config.language,
            config.data_path.display()
        );

        Ok(Self { jobs })
    }
}

/// Owns the Tesseract handle; exits once every sender is dropped.
fn run_worker(
    data_path: &str,
    language: &str,
    ready: oneshot::Sender<Result<(), OcrError>>,
    mut queue: mpsc::Receiver<Job>,
) {
    let mut tess = match LepTess::new(Some(data_path), language) {
        Ok(tess) => tess,
        Err(e) => {
            let _ = ready.send(Err(OcrError::ModelLoad(format!(
                "failed to initialize Tesseract ({} in {}): {}",
                language, data_path, e
            ))));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while let Some((png, reply)) = queue.blocking_recv() {
        let _ = reply.send(read_page(&mut tess, &png));
    }

    debug!("Tesseract worker stopped");
}

fn read_page(tess: &mut LepTess, png: &[u8]) -> Result<String, OcrError> {
    tess.set_image_from_mem(png)
        .map_err(|e| OcrError::Recognition(format!("failed to load image: {}", e)))?;
    tess.get_utf8_text()
        .map_err(|e| OcrError::Recognition(e.to_string()))
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&mut self, image: &DynamicImage) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        // leptess reads encoded images, not raw buffers
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.jobs
            .blocking_send((png, reply_tx))
            .map_err(|_| OcrError::Recognition("Tesseract worker is gone".to_string()))?;
        let text = reply_rx
            .blocking_recv()
            .map_err(|_| OcrError::Recognition("Tesseract worker dropped the job".to_string()))??;

        let mut result = RecognizedText::from_text(&text);
        result.image_size = (width, height);
        result.processing_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            "Tesseract recognized {} lines in {}ms",
            result.lines.len(),
            result.processing_time_ms
        );

        Ok(result)
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}
