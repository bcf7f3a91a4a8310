//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::FapiaoError;

/// Main configuration for the fapiao pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FapiaoConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// QR decoding configuration.
    pub qr: QrConfig,

    /// Amount extraction configuration.
    pub extraction: ExtractionConfig,

    /// Spreadsheet export configuration.
    pub export: ExportConfig,

    /// Status annotations written into records.
    pub messages: Messages,
}

/// Which OCR engine backs the text recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// PaddleOCR models through `pure-onnx-ocr`.
    Pure,
    /// Tesseract through `leptess`.
    Tesseract,
}

/// OCR engine configuration.
///
/// Applied once when the recognizer is built; every recognition call of a
/// pipeline reuses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine backend.
    pub backend: OcrBackend,

    /// Recognition language profile.
    pub language: String,

    /// Directory holding language data (tessdata or ONNX models).
    pub data_path: PathBuf,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,

    /// Upper bound for one recognition call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Pure,
            language: "chi_sim".to_string(),
            data_path: PathBuf::from("./tessdata"),
            keep_unk: false,
            timeout_ms: 120_000,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Path of a file inside the language data directory.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_path.join(name)
    }
}

/// QR decoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Field delimiter of the QR payload.
    pub delimiter: char,

    /// Upper bound for one decode call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            timeout_ms: 10_000,
        }
    }
}

impl QrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// How the settlement amount is located in recognized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountStrategy {
    /// One match over the whole text, first hit.
    WholeText,
    /// Line-anchored match on every line, last hit.
    #[default]
    PerLine,
}

/// Amount extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: AmountStrategy,
}

/// Column header language for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLanguage {
    #[default]
    En,
    Zh,
}

/// Spreadsheet export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Prefix of the timestamped export file name.
    pub file_prefix: String,

    /// Column header language.
    pub headers: HeaderLanguage,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: "invoice".to_string(),
            headers: HeaderLanguage::En,
        }
    }
}

/// Status annotations placed in `InvoiceRecord::msg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub decode_failed: String,
    pub qr_not_found: String,
    pub recognition_failed: String,
    pub recognition_timeout: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            decode_failed: "image decode failed".to_string(),
            qr_not_found: "QR code not found".to_string(),
            recognition_failed: "recognition failed".to_string(),
            recognition_timeout: "recognition timed out".to_string(),
        }
    }
}

impl FapiaoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Reject values no pipeline can run with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.ocr.timeout_ms == 0 || self.qr.timeout_ms == 0 {
            return Err(FapiaoError::Config("timeouts must be positive".to_string()));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(FapiaoError::Config("ocr.language is empty".to_string()));
        }
        if self.export.file_prefix.trim().is_empty() {
            return Err(FapiaoError::Config("export.file_prefix is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: FapiaoConfig =
            serde_json::from_str(r#"{"extraction": {"strategy": "whole_text"}}"#).unwrap();

        assert_eq!(config.extraction.strategy, AmountStrategy::WholeText);
        assert_eq!(config.ocr.language, "chi_sim");
        assert_eq!(config.qr.delimiter, ',');
        assert_eq!(config.messages.recognition_failed, "recognition failed");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = FapiaoConfig::default();
        config.ocr.backend = OcrBackend::Tesseract;
        config.export.headers = HeaderLanguage::Zh;
        config.save(&path).unwrap();

        let loaded = FapiaoConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.backend, OcrBackend::Tesseract);
        assert_eq!(loaded.export.headers, HeaderLanguage::Zh);
    }

    #[test]
    fn test_validate() {
        assert!(FapiaoConfig::default().validate().is_ok());

        let mut config = FapiaoConfig::default();
        config.ocr.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(FapiaoError::Config(_))));

        let mut config = FapiaoConfig::default();
        config.export.file_prefix = " ".to_string();
        assert!(config.validate().is_err());
    }
}
