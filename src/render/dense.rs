//! Bilinear scatter of unrastered points.
//!
//! Without neighborhood information every sample stands alone: its value is
//! distributed over the four target pixels surrounding its floating-point
//! position, with separable `(1 − f)` / `f` weights. Samples further than
//! one unit apart leave gaps; closing those requires the raster-aware path.

use crate::core::{Grid, Point};

use super::Splat;

/// Distribute each point's value bilinearly over its four surrounding
/// pixels. Corners outside `[0, width) × [0, height)` are skipped.
pub fn scatter_points(width: usize, height: usize, points: &[Point]) -> Grid<Vec<Splat>> {
    let mut accumulator: Grid<Vec<Splat>> = Grid::new(width, height);

    for point in points {
        let ix = point.x.floor() as i64;
        let iy = point.y.floor() as i64;
        let fx = point.x - point.x.floor();
        let fy = point.y - point.y.floor();

        let corners = [
            (ix, iy, (1.0 - fx) * (1.0 - fy)),
            (ix + 1, iy, fx * (1.0 - fy)),
            (ix, iy + 1, (1.0 - fx) * fy),
            (ix + 1, iy + 1, fx * fy),
        ];
        for (cx, cy, weight) in corners {
            // A lone zero-weight contribution would pass its value through
            // resolve; such corners must never enter the accumulator.
            if weight > 0.0 && cx >= 0 && (cx as usize) < width && cy >= 0 && (cy as usize) < height
            {
                accumulator[(cx as usize, cy as usize)].push(Splat {
                    weight,
                    value: point.v,
                });
            }
        }
    }

    accumulator
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(x: f64, y: f64, v: f64) -> Point {
        Point { x, y, v }
    }

    #[test]
    fn test_integer_position_hits_single_pixel() {
        let accumulator = scatter_points(3, 3, &[point(1.0, 2.0, 5.0)]);
        for (x, y, splats) in accumulator.enumerate_pixels() {
            if (x, y) == (1, 2) {
                assert_eq!(splats.len(), 1);
                assert_relative_eq!(splats[0].weight, 1.0);
                assert_relative_eq!(splats[0].value, 5.0);
            } else {
                assert!(splats.is_empty());
            }
        }
    }

    #[test]
    fn test_weights_partition_unity() {
        let accumulator = scatter_points(4, 4, &[point(1.25, 2.75, 1.0)]);
        let total: f64 = accumulator
            .pixels()
            .flat_map(|splats| splats.iter())
            .map(|splat| splat.weight)
            .sum();
        assert_relative_eq!(total, 1.0, max_relative = 1e-15);
    }

    #[test]
    fn test_fractional_position_weights() {
        let accumulator = scatter_points(2, 2, &[point(0.25, 0.5, 8.0)]);
        assert_relative_eq!(accumulator[(0, 0)][0].weight, 0.75 * 0.5);
        assert_relative_eq!(accumulator[(1, 0)][0].weight, 0.25 * 0.5);
        assert_relative_eq!(accumulator[(0, 1)][0].weight, 0.75 * 0.5);
        assert_relative_eq!(accumulator[(1, 1)][0].weight, 0.25 * 0.5);
    }

    #[test]
    fn test_out_of_bounds_corners_skipped() {
        // Point in the last pixel cell: the +1 corners fall outside.
        let accumulator = scatter_points(2, 2, &[point(1.5, 1.5, 1.0)]);
        assert_eq!(accumulator[(1, 1)].len(), 1);
        assert_relative_eq!(accumulator[(1, 1)][0].weight, 0.25);
        assert!(accumulator[(0, 0)].is_empty());
        assert!(accumulator[(1, 0)].is_empty());
        assert!(accumulator[(0, 1)].is_empty());

        // Entirely negative positions contribute nothing.
        let empty = scatter_points(2, 2, &[point(-3.5, -0.5, 1.0)]);
        assert!(empty.pixels().all(|splats| splats.is_empty()));
    }
}
