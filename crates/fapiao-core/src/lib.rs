//! Core library for Chinese VAT invoice field extraction.
//!
//! This crate provides:
//! - Image loading for scanned or photographed invoices
//! - QR code decoding of the tax-invoice payload (code, number, date)
//! - OCR backends (PaddleOCR models via `pure-onnx-ocr`, Tesseract via `leptess`)
//! - Price-tax total extraction from recognized text
//! - A sequential batch pipeline with per-file failure isolation
//! - XLSX and CSV export of the extracted records

pub mod error;
pub mod export;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pipeline;
pub mod qr;
pub mod raster;
pub mod session;

pub use error::{FapiaoError, Result};
pub use export::{ColumnHeaders, CsvExporter, Exporter, XlsxExporter};
pub use invoice::{AmountExtractor, InvoiceRecordBuilder};
pub use models::config::FapiaoConfig;
pub use models::invoice::{InvoiceRecord, QrPayload};
pub use ocr::{create_recognizer, RecognizedText, TextLine, TextRecognizer};
pub use pipeline::{BatchPipeline, BatchReport, InputFile, Progress, ProgressObserver};
pub use qr::QrCodeExtractor;
pub use raster::{ImageLoader, InvoiceImage};
pub use session::{Session, SessionState};

#[cfg(feature = "native")]
pub use ocr::PureOcrRecognizer;

#[cfg(feature = "tesseract")]
pub use ocr::TesseractRecognizer;
