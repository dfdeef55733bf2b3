//! QR code rasterisation.
//!
//! Codes are rendered straight into a grayscale buffer; nothing touches the
//! filesystem and the raster is dropped with its owner.

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

use crate::error::{Error, Result};

/// Pixels per module.
const MODULE_SCALE: u32 = 8;

/// Render `data` as a black-on-white QR code.
pub fn qr_raster(data: &str) -> Result<GrayImage> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|e| Error::QrEncode(e.to_string()))?;

    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(true)
        .module_dimensions(MODULE_SCALE, MODULE_SCALE)
        .build())
}
