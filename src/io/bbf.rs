//! BBF raw image writer.
//!
//! BBF is a minimal raw format: a 24-byte header followed by the pixel
//! payload. For the images produced here the payload is row-major IEEE-754
//! doubles in the byte order of the executing machine; empty pixels are
//! quiet NaN.
//!
//! Header layout:
//! ```text
//! Offset  Size  Field
//!      0     4  magic "BBF\0"
//!      4     1  version (1)
//!      5     1  flags (bit 0: floating-point payload)
//!      6     1  channels per pixel (1)
//!      7     1  bits per channel (64)
//!      8     8  width,  u64 host byte order
//!     16     8  height, u64 host byte order
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{NativeEndian, WriteBytesExt};

use crate::core::Grid;

use super::EncodeError;

const MAGIC: &[u8; 4] = b"BBF\0";
const VERSION: u8 = 1;
const FLAG_FLOATING_POINT: u8 = 0b0000_0001;

/// Write the image as a BBF file.
pub fn write_bbf(image: &Grid<f64>, path: &Path) -> Result<(), EncodeError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_bbf_to(image, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the image as BBF into any writer.
pub fn write_bbf_to(image: &Grid<f64>, writer: &mut impl Write) -> Result<(), EncodeError> {
    writer.write_all(MAGIC)?;
    writer.write_u8(VERSION)?;
    writer.write_u8(FLAG_FLOATING_POINT)?;
    writer.write_u8(1)?;
    writer.write_u8(64)?;
    writer.write_u64::<NativeEndian>(image.width() as u64)?;
    writer.write_u64::<NativeEndian>(image.height() as u64)?;

    for &value in image.pixels() {
        writer.write_f64::<NativeEndian>(value)?;
    }
    Ok(())
}
