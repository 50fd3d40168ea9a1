//! Core data structures.
//!
//! This module contains the fundamental types used throughout the system:
//! - `Point` / `RasterPoint`: image-space samples extracted from PLY columns
//! - `Grid`: the row-major 2D container for accumulators and images
//! - `Scaling` / `Channel`: column selection and affine value scaling
//! - progress observers for the long rasterization passes
//!
//! All types here are "pure data" - no file formats, no rasterization logic.

mod grid;
mod point;
mod progress;

// Re-export public types
pub use grid::Grid;
pub use point::{
    extract_points, extract_raster_points, Channel, ExtractError, Point, RasterChannel,
    RasterPoint, Scaling,
};
pub use progress::{ConsoleProgress, ProgressObserver, SilentProgress};
