//! PNG bridge: the NaN-sentinel double image as 16-bit gray plus alpha.
//!
//! Saving as PNG is lossy. Finite pixel values are clamped to 0..=65535 and
//! rounded half up; the alpha channel carries validity (opaque for data,
//! transparent for the NaN sentinel). Fixed-point semantics can be emulated
//! through the value scaling, but that interpretation is not stored in the
//! file.

use std::path::Path;

use image::{ImageBuffer, LumaA};

use crate::core::Grid;

use super::EncodeError;

/// 16-bit grayscale with a 16-bit alpha channel.
pub type GrayAlphaImage16 = ImageBuffer<LumaA<u16>, Vec<u16>>;

/// Convert the double image to 16-bit gray + validity alpha.
///
/// Dimensions above `i32::MAX` cannot be encoded in PNG and fail early,
/// for width and height alike.
pub fn to_gray_alpha(image: &Grid<f64>) -> Result<GrayAlphaImage16, EncodeError> {
    if image.width() > i32::MAX as usize || image.height() > i32::MAX as usize {
        return Err(EncodeError::DimensionsTooLarge);
    }

    let mut png = GrayAlphaImage16::new(image.width() as u32, image.height() as u32);
    for (pixel, &value) in png.pixels_mut().zip(image.pixels()) {
        *pixel = if value.is_nan() {
            LumaA([0, 0])
        } else {
            LumaA([value.clamp(0.0, 65535.0).round() as u16, u16::MAX])
        };
    }
    Ok(png)
}

/// Write the image as a 16-bit gray+alpha PNG file.
pub fn write_png(image: &Grid<f64>, path: &Path) -> Result<(), EncodeError> {
    let png = to_gray_alpha(image)?;
    png.save(path)?;
    Ok(())
}
