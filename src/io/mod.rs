//! File formats.
//!
//! This module handles all format parsing and export:
//! - PLY input (header-driven, typed columns, three encodings)
//! - BBF output (raw doubles with a 24-byte header)
//! - PNG output (16-bit gray + validity alpha)

pub mod bbf;
pub mod ply;
pub mod png;
pub mod text;

use thiserror::Error;

// Re-export public types and functions
pub use bbf::write_bbf;
pub use ply::{PlyError, PlyFile, PlyFormat, ScalarType};
pub use png::write_png;

/// Errors that can occur when encoding the output image.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dimensions are too large for PNG file format")]
    DimensionsTooLarge,

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}
