//! QR code extraction from invoice rasters.

use tracing::{debug, warn};

use crate::error::QrError;
use crate::models::invoice::QrPayload;
use crate::raster::InvoiceImage;

/// Locates and decodes the invoice QR code.
#[derive(Debug, Clone)]
pub struct QrCodeExtractor {
    delimiter: char,
}

impl QrCodeExtractor {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// Decode the raw QR string of the first decodable grid.
    pub fn decode_raw(&self, image: &InvoiceImage) -> Result<String, QrError> {
        let luma = image.to_luma();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            luma.width() as usize,
            luma.height() as usize,
            |x, y| luma.get_pixel(x as u32, y as u32)[0],
        );

        let grids = prepared.detect_grids();
        if grids.is_empty() {
            debug!("No QR grid found in {}", image.file());
            return Err(QrError::NotFound);
        }

        debug!("Found {} QR grids in {}", grids.len(), image.file());

        let mut last_error = None;
        for grid in &grids {
            match grid.decode() {
                Ok((_meta, content)) => return Ok(content),
                Err(e) => {
                    warn!("QR grid in {} failed to decode: {}", image.file(), e);
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(QrError::Decode(last_error.unwrap_or_default()))
    }

    /// Decode the QR code and split it into payload fields.
    pub fn extract(&self, image: &InvoiceImage) -> Result<QrPayload, QrError> {
        let raw = self.decode_raw(image)?;
        let payload = QrPayload::parse(&raw, self.delimiter);
        debug!("QR payload of {} has {} fields", image.file(), payload.len());
        Ok(payload)
    }
}

impl Default for QrCodeExtractor {
    fn default() -> Self {
        Self::new(',')
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};
    use pretty_assertions::assert_eq;

    /// Render `data` as a QR code with a 4-module quiet zone.
    pub(crate) fn qr_image(data: &str) -> GrayImage {
        let code = qrcode::QrCode::new(data.as_bytes()).unwrap();
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let scale = 6u32;
        let quiet = 4u32;
        let size = (modules + quiet * 2) * scale;

        GrayImage::from_fn(size, size, |x, y| {
            let mx = (x / scale) as i64 - quiet as i64;
            let my = (y / scale) as i64 - quiet as i64;
            let inside = mx >= 0 && my >= 0 && (mx as u32) < modules && (my as u32) < modules;
            if inside && colors[(my as u32 * modules + mx as u32) as usize] == qrcode::Color::Dark {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        })
    }

    #[test]
    fn test_extract_invoice_payload() {
        let raw = "01,10,044031900111,12345678,1061.95,20230315,12345678901234567890,A1B2";
        let image = InvoiceImage::new(DynamicImage::ImageLuma8(qr_image(raw)), "qr.png");

        let payload = QrCodeExtractor::default().extract(&image).unwrap();

        assert_eq!(payload.code(), Some("044031900111"));
        assert_eq!(payload.number(), Some("12345678"));
        assert_eq!(payload.date(), Some("20230315"));
    }

    #[test]
    fn test_damaged_code_is_decode_error() {
        let raw = "01,10,044031900111,12345678,1061.95,20230315,12345678901234567890,A1B2";
        let code = qrcode::QrCode::new(raw.as_bytes()).unwrap();
        let modules = code.width() as u32;
        let (scale, quiet) = (6u32, 4u32);

        // Invert the quadrant away from the three finder patterns, timing
        // lines and format bits, leaving far more errors than ECC recovers.
        let mut image = qr_image(raw);
        for my in 9..modules {
            for mx in 9..modules {
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = (mx + quiet) * scale + dx;
                        let y = (my + quiet) * scale + dy;
                        let Luma([v]) = *image.get_pixel(x, y);
                        image.put_pixel(x, y, Luma([255 - v]));
                    }
                }
            }
        }
        let image = InvoiceImage::new(DynamicImage::ImageLuma8(image), "damaged.png");

        let err = QrCodeExtractor::default().extract(&image).unwrap_err();
        assert!(matches!(err, QrError::Decode(_)), "unexpected error: {:?}", err);
    }

    #[test]
    fn test_blank_image_has_no_code() {
        let blank = GrayImage::from_pixel(120, 120, Luma([255u8]));
        let image = InvoiceImage::new(DynamicImage::ImageLuma8(blank), "blank.png");

        let err = QrCodeExtractor::default().extract(&image).unwrap_err();
        assert!(matches!(err, QrError::NotFound));
    }
}
