//! Subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use fapiao_core::models::config::{FapiaoConfig, OcrConfig};
use fapiao_core::{create_recognizer, TextRecognizer};
use tracing::debug;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fapiao")
        .join("config.json")
}

/// Load the explicit config file, else the default one if present, else
/// built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FapiaoConfig> {
    let config = match config_path {
        Some(path) => FapiaoConfig::from_file(Path::new(path))?,
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                debug!("Using config from {}", default_path.display());
                FapiaoConfig::from_file(&default_path)?
            } else {
                FapiaoConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}

/// Build the OCR engine off the async runtime; model loading blocks.
pub async fn load_recognizer(config: &OcrConfig) -> anyhow::Result<Box<dyn TextRecognizer>> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || create_recognizer(&config))
        .await?
        .map_err(|e| anyhow::anyhow!("Failed to load OCR engine: {}", e))
}
