//! QR code rendering for redemption links.

use image::{DynamicImage, ImageFormat, Luma};
use pollada_core::environment::{EncodedImage, ImageEncoder};
use pollada_core::{PolladaError, Result};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;

/// Pixels per QR module.
pub const MODULE_PIXELS: u32 = 10;

/// Renders payloads as PNG QR codes (error correction L, 4-module quiet zone).
#[derive(Debug, Clone, Copy, Default)]
pub struct QrImageEncoder;

impl ImageEncoder for QrImageEncoder {
    fn encode(&self, payload: &str) -> Result<EncodedImage> {
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)
            .map_err(|e| PolladaError::ImageEncoding(format!("Failed to build QR code: {e}")))?;

        let pixels = code
            .render::<Luma<u8>>()
            .module_dimensions(MODULE_PIXELS, MODULE_PIXELS)
            .quiet_zone(true)
            .build();

        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(pixels)
            .write_to(&mut bytes, ImageFormat::Png)
            .map_err(|e| PolladaError::ImageEncoding(format!("Failed to write PNG: {e}")))?;

        Ok(EncodedImage {
            media_type: "image/png".to_string(),
            bytes: bytes.into_inner(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn encodes_redemption_url_as_png() {
        let image = QrImageEncoder
            .encode("http://localhost:8080/api/redeem?code=A1B2C3D4")
            .map(|i| (i.media_type, i.bytes.starts_with(PNG_SIGNATURE)));
        assert_eq!(image, Ok(("image/png".to_string(), true)));
    }

    #[test]
    fn oversized_payload_is_an_encoding_error() {
        let payload = "X".repeat(8_000);
        assert!(matches!(
            QrImageEncoder.encode(&payload),
            Err(PolladaError::ImageEncoding(_))
        ));
    }
}
