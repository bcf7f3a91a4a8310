//! Image loading for uploaded invoice files.

use std::path::Path;

use image::{DynamicImage, GenericImageView, GrayImage};
use tracing::debug;

use crate::error::DecodeError;

/// A decoded invoice raster.
#[derive(Debug, Clone)]
pub struct InvoiceImage {
    image: DynamicImage,
    width: u32,
    height: u32,
    file: String,
}

impl InvoiceImage {
    pub fn new(image: DynamicImage, file: impl Into<String>) -> Self {
        let (width, height) = image.dimensions();
        Self {
            image,
            width,
            height,
            file: file.into(),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// 8-bit luma view of the raster.
    pub fn to_luma(&self) -> GrayImage {
        self.image.to_luma8()
    }

    pub fn into_inner(self) -> DynamicImage {
        self.image
    }
}

/// Decodes uploaded byte sources into rasters.
pub struct ImageLoader;

impl ImageLoader {
    /// Decode an in-memory image, guessing its format from the bytes.
    pub fn decode(bytes: &[u8], file: &str) -> Result<InvoiceImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty(file.to_string()));
        }

        let image = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
            file: file.to_string(),
            source,
        })?;

        debug!(
            "Decoded {}: {}x{}",
            file,
            image.width(),
            image.height()
        );

        Ok(InvoiceImage::new(image, file))
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> Result<InvoiceImage, crate::FapiaoError> {
        let bytes = std::fs::read(path)?;
        let file = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Ok(Self::decode(&bytes, file)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = GrayImage::from_pixel(width, height, Luma([255u8]));
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let image = ImageLoader::decode(&png_bytes(40, 30), "a.png").unwrap();
        assert_eq!((image.width(), image.height()), (40, 30));
        assert_eq!(image.file(), "a.png");
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageLoader::decode(b"definitely not an image", "b.jpg").unwrap_err();
        assert!(matches!(err, DecodeError::Image { .. }));
        assert!(err.to_string().contains("b.jpg"));
    }

    #[test]
    fn test_open_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, png_bytes(8, 8)).unwrap();

        let image = ImageLoader::open(&path).unwrap();
        assert_eq!(image.file(), "scan.png");
        assert_eq!(image.into_inner().width(), 8);
    }

    #[test]
    fn test_decode_empty_fails() {
        let err = ImageLoader::decode(&[], "c.png").unwrap_err();
        assert!(matches!(err, DecodeError::Empty(_)));
    }
}
