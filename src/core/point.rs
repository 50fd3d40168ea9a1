//! Point records and their extraction from PLY columns.
//!
//! The loader keeps data column-wise; this module projects three (or five)
//! chosen columns through the affine scaling `(v + pre) * factor + post`
//! into flat point records for the rasterizers.

use nalgebra::Vector2;
use thiserror::Error;

use crate::io::ply::{PlyError, PlyFile, PropertyValues};

/// A post-scale image-space sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub v: f64,
}

/// A sample that also carries its acquisition-raster cell. The raster
/// indices are exact integers taken from the source device's native grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterPoint {
    pub x: f64,
    pub y: f64,
    pub v: f64,
    pub rx: i64,
    pub ry: i64,
}

impl RasterPoint {
    /// Image-space position of the sample.
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

/// Affine value scaling: `(v + pre_offset) * factor + post_offset`.
///
/// The pre offset moves values in the unit of the source property, the post
/// offset in output units; both are offered as a convenience since they are
/// equivalent up to the factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    pub pre_offset: f64,
    pub factor: f64,
    pub post_offset: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            pre_offset: 0.0,
            factor: 1.0,
            post_offset: 0.0,
        }
    }
}

impl Scaling {
    pub fn apply(&self, value: f64) -> f64 {
        (value + self.pre_offset) * self.factor + self.post_offset
    }
}

/// Selects one scalar column as a point axis, with its scaling.
#[derive(Debug, Clone)]
pub struct Channel {
    pub element: String,
    pub property: String,
    pub scaling: Scaling,
}

/// Selects one scalar column as a raster index axis. Raster indices are
/// never scaled.
#[derive(Debug, Clone)]
pub struct RasterChannel {
    pub element: String,
    pub property: String,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Ply(#[from] PlyError),

    #[error("{axis} has different value count than {reference}")]
    CountMismatch {
        axis: &'static str,
        reference: &'static str,
    },

    #[error("value count is 0")]
    Empty,

    #[error("list type properties are not supported")]
    ListProperty,

    #[error("raster property contains at least one non-integer value")]
    NonIntegerRaster,

    #[error("raster property value is out of range")]
    RasterOutOfRange,
}

/// Extract unrastered points from the chosen x/y/value columns.
pub fn extract_points(
    ply: &PlyFile,
    x: &Channel,
    y: &Channel,
    v: &Channel,
) -> Result<Vec<Point>, ExtractError> {
    let count = checked_count(ply, x, y, v, None)?;
    let xs = scaled_column(ply, x)?;
    let ys = scaled_column(ply, y)?;
    let vs = scaled_column(ply, v)?;
    Ok((0..count)
        .map(|i| Point {
            x: xs[i],
            y: ys[i],
            v: vs[i],
        })
        .collect())
}

/// Extract points together with their integer raster indices.
pub fn extract_raster_points(
    ply: &PlyFile,
    x: &Channel,
    y: &Channel,
    v: &Channel,
    rx: &RasterChannel,
    ry: &RasterChannel,
) -> Result<Vec<RasterPoint>, ExtractError> {
    let count = checked_count(ply, x, y, v, Some((rx, ry)))?;
    let xs = scaled_column(ply, x)?;
    let ys = scaled_column(ply, y)?;
    let vs = scaled_column(ply, v)?;
    let rxs = raster_column(ply, rx)?;
    let rys = raster_column(ply, ry)?;
    Ok((0..count)
        .map(|i| RasterPoint {
            x: xs[i],
            y: ys[i],
            v: vs[i],
            rx: rxs[i],
            ry: rys[i],
        })
        .collect())
}

/// All chosen elements must have the same value count, and it must not be
/// zero. The returned count is the common one.
fn checked_count(
    ply: &PlyFile,
    x: &Channel,
    y: &Channel,
    v: &Channel,
    raster: Option<(&RasterChannel, &RasterChannel)>,
) -> Result<usize, ExtractError> {
    let mismatch = |axis| ExtractError::CountMismatch {
        axis,
        reference: "--x-element",
    };

    let count = ply.element(&x.element)?.count();
    if ply.element(&y.element)?.count() != count {
        return Err(mismatch("--y-element"));
    }
    if ply.element(&v.element)?.count() != count {
        return Err(mismatch("--value-element"));
    }
    if let Some((rx, ry)) = raster {
        if ply.element(&rx.element)?.count() != count {
            return Err(mismatch("--x-raster-element"));
        }
        if ply.element(&ry.element)?.count() != count {
            return Err(mismatch("--y-raster-element"));
        }
    }
    if count == 0 {
        return Err(ExtractError::Empty);
    }
    Ok(count)
}

// Widening a column goes through one arm per scalar type; the macro mirrors
// the sixteen-way dispatch of the loader without repeating the map call.
macro_rules! widen_column {
    ($values:expr, $convert:expr) => {
        match $values {
            PropertyValues::Char(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::UChar(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::Short(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::UShort(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::Int(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::UInt(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::Float(v) => v.iter().map(|&raw| $convert(raw as f64)).collect(),
            PropertyValues::Double(v) => v.iter().map(|&raw| $convert(raw)).collect(),
            _ => return Err(ExtractError::ListProperty),
        }
    };
}

/// Open a scalar column, widen to `f64` and apply the channel scaling.
fn scaled_column(ply: &PlyFile, channel: &Channel) -> Result<Vec<f64>, ExtractError> {
    let element = ply.element(&channel.element)?;
    let property = element.property(&channel.property)?;
    let scaling = channel.scaling;
    let column: Vec<f64> = widen_column!(property.values(), |raw| scaling.apply(raw));
    Ok(column)
}

/// Open a scalar column as raster indices. Integer sources convert exactly;
/// floating sources must hold exact integers within `i64` range.
fn raster_column(ply: &PlyFile, channel: &RasterChannel) -> Result<Vec<i64>, ExtractError> {
    let element = ply.element(&channel.element)?;
    let property = element.property(&channel.property)?;
    match property.values() {
        PropertyValues::Char(v) => Ok(v.iter().map(|&raw| raw as i64).collect()),
        PropertyValues::UChar(v) => Ok(v.iter().map(|&raw| raw as i64).collect()),
        PropertyValues::Short(v) => Ok(v.iter().map(|&raw| raw as i64).collect()),
        PropertyValues::UShort(v) => Ok(v.iter().map(|&raw| raw as i64).collect()),
        PropertyValues::Int(v) => Ok(v.iter().map(|&raw| raw as i64).collect()),
        PropertyValues::UInt(v) => Ok(v.iter().map(|&raw| raw as i64).collect()),
        PropertyValues::Float(v) => v.iter().map(|&raw| raster_index(raw as f64)).collect(),
        PropertyValues::Double(v) => v.iter().map(|&raw| raster_index(raw)).collect(),
        _ => Err(ExtractError::ListProperty),
    }
}

fn raster_index(value: f64) -> Result<i64, ExtractError> {
    if value != value.floor() {
        return Err(ExtractError::NonIntegerRaster);
    }
    if value < i64::MIN as f64 || value > i64::MAX as f64 {
        return Err(ExtractError::RasterOutOfRange);
    }
    Ok(value as i64)
}
