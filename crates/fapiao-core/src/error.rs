//! Error types for the fapiao-core library.

use std::time::Duration;

use thiserror::Error;

/// Main error type for the fapiao library.
#[derive(Error, Debug)]
pub enum FapiaoError {
    /// Image decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// QR code extraction error.
    #[error("QR error: {0}")]
    Qr(#[from] QrError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Spreadsheet export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Session state error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// The image bytes could not be turned into a raster.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Format not recognized or data corrupt.
    #[error("unsupported or corrupt image {file}: {source}")]
    Image {
        file: String,
        #[source]
        source: image::ImageError,
    },

    /// Empty byte source.
    #[error("image {0} is empty")]
    Empty(String),
}

/// Errors related to QR code extraction.
#[derive(Error, Debug)]
pub enum QrError {
    /// No QR code grid located in the image.
    #[error("no QR code found")]
    NotFound,

    /// QR grids were located but none could be decoded.
    #[error("failed to decode QR code: {0}")]
    Decode(String),

    /// The decoder did not finish in time.
    #[error("QR decoding timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models or language data.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed inside the engine.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The engine did not finish in time.
    #[error("text recognition timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors related to spreadsheet export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// XLSX writer failure.
    #[error("failed to write xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// CSV writer failure.
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),

    /// Output file could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the review session state machine.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The requested action is not allowed in the current state.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: &'static str,
        action: &'static str,
    },

    /// Export requested with no parsed records.
    #[error("no records to export")]
    Empty,
}

/// Result type for the fapiao library.
pub type Result<T> = std::result::Result<T, FapiaoError>;
