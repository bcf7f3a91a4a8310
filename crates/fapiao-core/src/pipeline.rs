//! Batch extraction pipeline: decode, QR, OCR, amount, record.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{OcrError, QrError};
use crate::invoice::{annotate, AmountExtractor, InvoiceRecordBuilder};
use crate::models::config::{FapiaoConfig, Messages};
use crate::models::invoice::{InvoiceRecord, QrPayload};
use crate::ocr::{RecognizedText, TextRecognizer};
use crate::qr::QrCodeExtractor;
use crate::raster::{ImageLoader, InvoiceImage};

/// A user-supplied image byte source.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
    read_error: Option<String>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            read_error: None,
        }
    }

    /// Read a file from disk, named by its file name.
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(file_name(path), bytes))
    }

    /// Like [`InputFile::read`], but an unreadable path becomes an input
    /// that fails on its own when the batch reaches it.
    pub fn read_or_failed(path: &Path) -> Self {
        match Self::read(path) {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                Self {
                    name: file_name(path),
                    bytes: Vec::new(),
                    read_error: Some(e.to_string()),
                }
            }
        }
    }

    /// The I/O error hit while reading, if any.
    pub fn read_error(&self) -> Option<&str> {
        self.read_error.as_deref()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Progress after one file has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the file just finished.
    pub current: usize,
    pub total: usize,
    pub remaining: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processing item {} of {}, {} remaining",
            self.current, self.total, self.remaining
        )
    }
}

/// Completion text for a finished batch.
pub fn completion_message(total: usize) -> String {
    format!("done, {} processed.", total)
}

/// Receives incremental results of a batch run.
pub trait ProgressObserver {
    /// Called with each record as soon as its file is done.
    fn on_record(&mut self, _record: &InvoiceRecord) {}

    /// Called after each file.
    fn on_progress(&mut self, progress: Progress);

    /// Called once when the batch is done, even for an empty batch.
    fn on_complete(&mut self, _total: usize) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&mut self, _progress: Progress) {}
}

/// Lifecycle of a pipeline run. A batch never ends in a failed state;
/// per-file failures live in the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Running,
    Completed,
}

/// Records of one batch run, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<InvoiceRecord>,
    pub processing_time_ms: u64,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records carrying a status annotation.
    pub fn failed(&self) -> impl Iterator<Item = &InvoiceRecord> {
        self.records.iter().filter(|r| !r.is_complete())
    }
}

/// Sequential batch pipeline owning one OCR engine.
///
/// The recognizer is acquired at construction and held until
/// [`BatchPipeline::shutdown`] or drop. Files are processed one at a time
/// and the engine lock is held for a whole recognition call, so the engine
/// never sees two images concurrently, not even after a timeout. The
/// recognition timeout starts once the lock is held; waiting for a
/// timed-out call to drain does not count against the next file.
pub struct BatchPipeline<R: TextRecognizer + 'static> {
    recognizer: Arc<Mutex<R>>,
    qr: QrCodeExtractor,
    amounts: AmountExtractor,
    builder: InvoiceRecordBuilder,
    ocr_timeout: Duration,
    qr_timeout: Duration,
    status: PipelineStatus,
}

impl<R: TextRecognizer + 'static> BatchPipeline<R> {
    /// Create a pipeline around an initialized recognizer.
    pub fn new(recognizer: R, config: &FapiaoConfig) -> Self {
        info!("Creating batch pipeline with {} recognizer", recognizer.name());

        Self {
            recognizer: Arc::new(Mutex::new(recognizer)),
            qr: QrCodeExtractor::new(config.qr.delimiter),
            amounts: AmountExtractor::new(config.extraction.strategy),
            builder: InvoiceRecordBuilder::new(config.messages.clone()),
            ocr_timeout: config.ocr.timeout(),
            qr_timeout: config.qr.timeout(),
            status: PipelineStatus::Idle,
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.status
    }

    fn messages(&self) -> &Messages {
        self.builder.messages()
    }

    /// Run every file in order, producing one record per file.
    pub async fn run<O>(&mut self, files: Vec<InputFile>, observer: &mut O) -> BatchReport
    where
        O: ProgressObserver + ?Sized,
    {
        let start = Instant::now();
        let total = files.len();
        self.status = PipelineStatus::Running;

        info!("Starting batch of {} files", total);

        let mut records = Vec::with_capacity(total);

        for (index, file) in files.into_iter().enumerate() {
            let order = index + 1;
            debug!("Parsing {}", file.name);

            let record = self.process_file(file, order).await;
            observer.on_record(&record);
            records.push(record);

            let progress = Progress {
                current: order,
                total,
                remaining: total - order,
            };
            debug!("{}", progress);
            observer.on_progress(progress);
        }

        self.status = PipelineStatus::Completed;
        observer.on_complete(total);
        info!("{}", completion_message(total));

        BatchReport {
            records,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn process_file(&self, file: InputFile, order: usize) -> InvoiceRecord {
        let InputFile {
            name,
            bytes,
            read_error,
        } = file;

        if let Some(reason) = read_error {
            let msg = format!("{} ({})", self.messages().decode_failed, reason);
            return self.builder.failed(order, &name, msg);
        }

        let image = match ImageLoader::decode(&bytes, &name) {
            Ok(image) => Arc::new(image),
            Err(e) => {
                warn!("Failed to decode {}: {}", name, e);
                let msg = format!("{} ({})", self.messages().decode_failed, e);
                return self.builder.failed(order, &name, msg);
            }
        };
        drop(bytes);

        let (payload, qr_note) = match self.decode_qr(Arc::clone(&image)).await {
            Ok(payload) => (payload, None),
            Err(e) => {
                warn!("No usable QR code in {}: {}", name, e);
                let note = match e {
                    QrError::NotFound => self.messages().qr_not_found.clone(),
                    other => format!("{} ({})", self.messages().qr_not_found, other),
                };
                (QrPayload::empty(), Some(note))
            }
        };

        let (amount, ocr_note) = match self.recognize(image).await {
            Ok(text) => {
                let amount = self.amounts.extract_amount(&text);
                if amount.is_none() {
                    debug!("No price-tax total found in {}", name);
                }
                (amount, None)
            }
            Err(OcrError::Timeout(limit)) => {
                warn!("Recognition of {} timed out after {:?}", name, limit);
                (None, Some(self.messages().recognition_timeout.clone()))
            }
            Err(e) => {
                warn!("Recognition of {} failed: {}", name, e);
                (None, Some(format!("{} ({})", self.messages().recognition_failed, e)))
            }
        };

        let mut record = self.builder.build(&payload, amount, order, &name);
        let amount_note = std::mem::take(&mut record.msg);
        if let Some(note) = qr_note {
            annotate(&mut record, &note);
        }
        annotate(&mut record, ocr_note.as_deref().unwrap_or(amount_note.as_str()));

        record
    }

    async fn decode_qr(&self, image: Arc<InvoiceImage>) -> Result<QrPayload, QrError> {
        let qr = self.qr.clone();
        let task = tokio::task::spawn_blocking(move || qr.extract(&image));

        match tokio::time::timeout(self.qr_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(QrError::Decode(format!("decoder task failed: {}", e))),
            Err(_) => Err(QrError::Timeout(self.qr_timeout)),
        }
    }

    async fn recognize(&self, image: Arc<InvoiceImage>) -> Result<RecognizedText, OcrError> {
        let mut engine = Arc::clone(&self.recognizer).lock_owned().await;
        let task = tokio::task::spawn_blocking(move || engine.recognize(image.image()));

        match tokio::time::timeout(self.ocr_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(OcrError::Recognition(format!("recognizer task failed: {}", e))),
            Err(_) => Err(OcrError::Timeout(self.ocr_timeout)),
        }
    }

    /// Release the recognizer.
    pub fn shutdown(self) {
        match Arc::try_unwrap(self.recognizer) {
            Ok(mutex) => {
                let engine = mutex.into_inner();
                info!("Released {} recognizer", engine.name());
            }
            Err(_) => {
                warn!("Recognizer still busy with a timed-out call, releasing when it returns");
            }
        }
    }
}
