//! Point-to-raster conversion.
//!
//! Both rasterizers fill a `Grid<Vec<_>>` accumulator with weighted
//! contributions per target pixel:
//!
//! - `dense`: bilinear distribution of each point over its four surrounding
//!   pixels (no neighborhood information)
//! - `raster`: triangulation of the acquisition raster with barycentric
//!   painting and an optional raster-neighbor filter
//!
//! `resolve` then collapses each pixel's contributions into the weighted
//! mean, with the quiet-NaN sentinel for empty pixels.

mod dense;
mod raster;

// Re-export public entry points
pub use dense::scatter_points;
pub use raster::{scatter_raster_points, RasterFilter};

use thiserror::Error;

use crate::core::Grid;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("raster interpolation requires at least 2 columns and 2 rows")]
    RasterTooSmall,

    #[error("raster point {rx}x{ry} exists twice")]
    DuplicateRasterPoint { rx: i64, ry: i64 },

    // A negative weight cannot be produced by either rasterizer; hitting
    // this is a bug, not bad input.
    #[error("negative weight")]
    NegativeWeight,
}

/// One weighted contribution to a target pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    pub weight: f64,
    pub value: f64,
}

/// A contribution that remembers the raster cell of its dominant vertex,
/// for the reference filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterSplat {
    pub weight: f64,
    pub value: f64,
    pub rx: i64,
    pub ry: i64,
}

/// Common view of the two contribution kinds, so `resolve` works on both
/// accumulators.
pub trait Contribution {
    fn weight(&self) -> f64;
    fn value(&self) -> f64;
}

impl Contribution for Splat {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn value(&self) -> f64 {
        self.value
    }
}

impl Contribution for RasterSplat {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn value(&self) -> f64 {
        self.value
    }
}

/// Collapse an accumulator into the final image.
///
/// Empty pixels become quiet NaN. A single contribution passes its value
/// through unweighted. Multiple contributions average as
/// `Σ(wᵢ·vᵢ) / Σwᵢ`; a zero weight sum also yields NaN.
pub fn resolve<C: Contribution>(accumulator: &Grid<Vec<C>>) -> Result<Grid<f64>, RenderError> {
    let mut image = Grid::filled(accumulator.width(), accumulator.height(), f64::NAN);

    for (target, splats) in image.pixels_mut().zip(accumulator.pixels()) {
        if splats.is_empty() {
            continue;
        }
        if splats.len() == 1 {
            *target = splats[0].value();
            continue;
        }

        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        for splat in splats {
            let weight = splat.weight();
            if weight < 0.0 {
                return Err(RenderError::NegativeWeight);
            }
            weight_sum += weight;
            value_sum += splat.value() * weight;
        }
        if weight_sum != 0.0 {
            *target = value_sum / weight_sum;
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_pixel_is_nan() {
        let accumulator: Grid<Vec<Splat>> = Grid::new(2, 1);
        let image = resolve(&accumulator).unwrap();
        assert!(image.pixels().all(|v| v.is_nan()));
    }

    #[test]
    fn test_single_contribution_passes_value_through() {
        let mut accumulator: Grid<Vec<Splat>> = Grid::new(1, 1);
        // A single contribution is taken as-is, even with weight 0.
        accumulator[(0, 0)].push(Splat {
            weight: 0.0,
            value: 7.5,
        });
        let image = resolve(&accumulator).unwrap();
        assert_relative_eq!(image[(0, 0)], 7.5);
    }

    #[test]
    fn test_weighted_mean() {
        let mut accumulator: Grid<Vec<Splat>> = Grid::new(1, 1);
        accumulator[(0, 0)].push(Splat {
            weight: 1.0,
            value: 1.0,
        });
        accumulator[(0, 0)].push(Splat {
            weight: 0.25,
            value: 10.0,
        });
        let image = resolve(&accumulator).unwrap();
        assert_relative_eq!(image[(0, 0)], (1.0 + 2.5) / 1.25);
    }

    #[test]
    fn test_zero_weight_sum_is_nan() {
        let mut accumulator: Grid<Vec<Splat>> = Grid::new(1, 1);
        accumulator[(0, 0)].push(Splat {
            weight: 0.0,
            value: 1.0,
        });
        accumulator[(0, 0)].push(Splat {
            weight: 0.0,
            value: 2.0,
        });
        let image = resolve(&accumulator).unwrap();
        assert!(image[(0, 0)].is_nan());
    }

    #[test]
    fn test_negative_weight_is_an_error() {
        let mut accumulator: Grid<Vec<Splat>> = Grid::new(1, 1);
        accumulator[(0, 0)].push(Splat {
            weight: 0.5,
            value: 1.0,
        });
        accumulator[(0, 0)].push(Splat {
            weight: -0.5,
            value: 2.0,
        });
        assert!(matches!(
            resolve(&accumulator),
            Err(RenderError::NegativeWeight)
        ));
    }
}
