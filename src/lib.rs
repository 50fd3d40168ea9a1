//! # ply2image: 3D point clouds to 2D raster images
//!
//! This crate converts point clouds stored in the PLY (Polygon File Format)
//! into 2D image data. Three chosen scalar properties act as x, y and pixel
//! value — with the defaults (`x`, `y`, `z` of the `vertex` element) this is
//! exactly the conversion of a point cloud into a depth map. When the file
//! also carries the acquisition device's integer raster coordinates, they
//! are used to interpolate densely between pixels that were adjacent at
//! measurement time.
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - `core`: Fundamental data structures (points, grid, scaling, progress)
//! - `io`: File formats (PLY input, BBF and PNG output)
//! - `render`: The two rasterizers and the accumulator resolve
//!
//! The command line driver in `main.rs` wires them together:
//! PLY file → typed columns → point records → accumulator → `f64` image →
//! BBF or PNG.

// Core data structures
pub mod core;

// File formats (PLY, BBF, PNG)
pub mod io;

// Point-to-raster conversion
pub mod render;

// Re-export commonly used types at crate root for convenience
pub use crate::core::{Point, RasterPoint};
pub use crate::io::{PlyError, PlyFile};
pub use crate::render::RasterFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
