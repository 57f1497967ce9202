//! Image encoding: rendered surface → PNG bytes.
//!
//! PNG is chosen over JPEG because it is lossless — text crispness on a
//! résumé preview matters far more than file size, and JPEG artefacts on
//! rendered text are immediately visible at preview scale.

use crate::engine::EngineError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Media type of the encoded output.
pub const IMAGE_MEDIA_TYPE: &str = "image/png";

/// File extension of the encoded output.
pub const IMAGE_EXTENSION: &str = "png";

/// Encode a rendered page surface as PNG.
///
/// The `quality` knob from [`crate::ConvertConfig`] does not apply here:
/// PNG is lossless, so there is nothing to trade away. Zero-length output
/// is treated as an encoder failure by the caller.
pub fn encode_page(img: &DynamicImage) -> Result<Vec<u8>, EngineError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| EngineError::new(e.to_string()))?;

    debug!("Encoded {}x{} surface → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}
