//! Raster-aware gap-filling interpolation.
//!
//! Most 3D acquisition devices sample on a native 2D grid. When the PLY file
//! keeps those integer grid coordinates per point, the source neighborhood
//! can be reconstructed even after arbitrary transformations of the 3D
//! coordinates: each 2×2 block of the acquisition raster is triangulated in
//! the target image plane and every covered pixel is painted by barycentric
//! interpolation. Gaps then only remain where the original measurement had
//! them.

use std::str::FromStr;

use nalgebra::Vector2;

use crate::core::{Grid, ProgressObserver, RasterPoint};

use super::{RasterSplat, RenderError};

/// Post-filter choosing the per-pixel reference contribution.
///
/// `Min` keeps only contributions raster-adjacent to the smallest value in
/// the pixel (a foreground selection for depth values), `Max` mirrors it for
/// the largest, `None` keeps everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RasterFilter {
    #[default]
    Min,
    Max,
    None,
}

impl RasterFilter {
    pub fn name(self) -> &'static str {
        match self {
            RasterFilter::Min => "min",
            RasterFilter::Max => "max",
            RasterFilter::None => "none",
        }
    }
}

impl FromStr for RasterFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "min" => Ok(RasterFilter::Min),
            "max" => Ok(RasterFilter::Max),
            "none" => Ok(RasterFilter::None),
            _ => Err(format!(
                "invalid raster filter \"{value}\" (valid values: \"min\", \"max\", \"none\")"
            )),
        }
    }
}

/// Inclusive bounding box of the raster indices of a point set.
struct RasterExtent {
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
}

impl RasterExtent {
    fn of(points: &[RasterPoint]) -> Self {
        let mut extent = RasterExtent {
            min_x: i64::MAX,
            max_x: i64::MIN,
            min_y: i64::MAX,
            max_y: i64::MIN,
        };
        for point in points {
            extent.min_x = extent.min_x.min(point.rx);
            extent.max_x = extent.max_x.max(point.rx);
            extent.min_y = extent.min_y.min(point.ry);
            extent.max_y = extent.max_y.max(point.ry);
        }
        extent
    }

    fn width(&self) -> usize {
        (self.max_x + 1 - self.min_x) as usize
    }

    fn height(&self) -> usize {
        (self.max_y + 1 - self.min_y) as usize
    }

    fn x(&self, rx: i64) -> usize {
        (rx - self.min_x) as usize
    }

    fn y(&self, ry: i64) -> usize {
        (ry - self.min_y) as usize
    }
}

/// Rasterize points using their acquisition-raster neighborhood.
///
/// The raster must span at least 2×2 cells and no cell may be claimed by two
/// points. Progress is reported per pass: raster grid build, interpolation
/// and (unless the filter is `None`) the reference filter.
pub fn scatter_raster_points(
    width: usize,
    height: usize,
    points: &[RasterPoint],
    filter: RasterFilter,
    progress: &mut dyn ProgressObserver,
) -> Result<Grid<Vec<RasterSplat>>, RenderError> {
    if points.is_empty() {
        return Err(RenderError::RasterTooSmall);
    }
    let extent = RasterExtent::of(points);
    if extent.width() < 2 || extent.height() < 2 {
        return Err(RenderError::RasterTooSmall);
    }

    println!(
        "raster with origin {}x{} and size {}x{}",
        extent.min_x,
        extent.min_y,
        extent.width(),
        extent.height()
    );

    let mut raster: Grid<Option<RasterPoint>> = Grid::new(extent.width(), extent.height());
    progress.begin("create raster image", points.len() as u64);
    for point in points {
        let cell = &mut raster[(extent.x(point.rx), extent.y(point.ry))];
        if cell.is_some() {
            return Err(RenderError::DuplicateRasterPoint {
                rx: point.rx,
                ry: point.ry,
            });
        }
        *cell = Some(*point);
        progress.tick();
    }
    progress.end();

    let quad_count = (raster.width() - 1) * (raster.height() - 1);
    progress.begin("raster interpolation", quad_count as u64);
    let mut accumulator: Grid<Vec<RasterSplat>> = Grid::new(width, height);
    for iy in 0..raster.height() - 1 {
        for ix in 0..raster.width() - 1 {
            let mut corners: Vec<RasterPoint> = Vec::with_capacity(4);
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                if let Some(point) = raster[(ix + dx, iy + dy)] {
                    corners.push(point);
                }
            }

            // Fewer than three corners cannot form a surface. Three form one
            // triangle. Four deliberately form all four overlapping
            // rotations; the double coverage biases blending toward shared
            // edges and must not be reduced to two disjoint triangles.
            if corners.len() >= 3 {
                let triangles: Vec<[RasterPoint; 3]> = if corners.len() == 3 {
                    vec![[corners[0], corners[1], corners[2]]]
                } else {
                    vec![
                        [corners[0], corners[1], corners[2]],
                        [corners[1], corners[2], corners[3]],
                        [corners[2], corners[3], corners[0]],
                        [corners[3], corners[0], corners[1]],
                    ]
                };
                for triangle in &triangles {
                    paint_triangle(&mut accumulator, triangle);
                }
            }
            progress.tick();
        }
    }
    progress.end();

    if filter != RasterFilter::None && !accumulator.is_empty() {
        progress.begin("reference filter", accumulator.len() as u64);
        for splats in accumulator.pixels_mut() {
            if !splats.is_empty() {
                apply_reference_filter(splats, filter);
            }
            progress.tick();
        }
        progress.end();
    }

    Ok(accumulator)
}

/// Paint all pixels of the triangle's clamped bounding box that pass the
/// inside test, appending one barycentric contribution each.
fn paint_triangle(accumulator: &mut Grid<Vec<RasterSplat>>, triangle: &[RasterPoint; 3]) {
    let width = accumulator.width();
    let height = accumulator.height();
    if width == 0 || height == 0 {
        return;
    }

    let from_x = clamp_pixel(
        min3(triangle[0].x, triangle[1].x, triangle[2].x).floor(),
        width,
    );
    let to_x = clamp_pixel(
        max3(triangle[0].x, triangle[1].x, triangle[2].x).ceil(),
        width,
    );
    if to_x == from_x {
        return;
    }

    let from_y = clamp_pixel(
        min3(triangle[0].y, triangle[1].y, triangle[2].y).floor(),
        height,
    );
    let to_y = clamp_pixel(
        max3(triangle[0].y, triangle[1].y, triangle[2].y).ceil(),
        height,
    );
    if to_y == from_y {
        return;
    }

    for y in from_y..=to_y {
        for x in from_x..=to_x {
            let sample = Vector2::new(x as f64, y as f64);
            if !triangle_contains(triangle, &sample) {
                continue;
            }

            // Barycentric weights as normalized areas of the sub-triangles
            // opposite each vertex.
            let areas = [
                area(&sample, &triangle[1].position(), &triangle[2].position()),
                area(&sample, &triangle[2].position(), &triangle[0].position()),
                area(&sample, &triangle[0].position(), &triangle[1].position()),
            ];
            let area_sum = areas[0] + areas[1] + areas[2];
            let weights = [
                areas[0] / area_sum,
                areas[1] / area_sum,
                areas[2] / area_sum,
            ];

            let value = triangle[0].v * weights[0]
                + triangle[1].v * weights[1]
                + triangle[2].v * weights[2];

            let dominant = dominant_index(&weights);
            accumulator[(x, y)].push(RasterSplat {
                weight: weights[dominant],
                value,
                rx: triangle[dominant].rx,
                ry: triangle[dominant].ry,
            });
        }
    }
}

/// Keep only contributions raster-adjacent (eight neighbors, self included)
/// to the pixel's reference contribution.
fn apply_reference_filter(splats: &mut Vec<RasterSplat>, filter: RasterFilter) {
    let reference = match filter {
        RasterFilter::Min => splats
            .iter()
            .copied()
            .reduce(|best, splat| if splat.value < best.value { splat } else { best }),
        RasterFilter::Max => splats
            .iter()
            .copied()
            .reduce(|best, splat| if splat.value > best.value { splat } else { best }),
        RasterFilter::None => None,
    };
    if let Some(reference) = reference {
        splats.retain(|splat| {
            (reference.rx - splat.rx).abs() <= 1 && (reference.ry - splat.ry).abs() <= 1
        });
    }
}

fn min3(a: f64, b: f64, c: f64) -> f64 {
    a.min(b).min(c)
}

fn max3(a: f64, b: f64, c: f64) -> f64 {
    a.max(b).max(c)
}

/// Clamp a floating pixel coordinate into `[0, size)`.
fn clamp_pixel(value: f64, size: usize) -> usize {
    (value as i64).clamp(0, size as i64 - 1) as usize
}

/// Absolute triangle area via the signed-area formula. Numerically robust
/// for the thin triangles a transformed raster can produce.
fn area(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> f64 {
    (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y)).abs() / 2.0
}

fn edge_sign(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> f64 {
    (a.x - c.x) * (b.y - c.y) - (b.x - c.x) * (a.y - c.y)
}

/// Half-plane inside test: the sample is inside when the three edge signs
/// are not mixed. Points on an edge count as inside.
fn triangle_contains(triangle: &[RasterPoint; 3], sample: &Vector2<f64>) -> bool {
    let d1 = edge_sign(sample, &triangle[0].position(), &triangle[1].position());
    let d2 = edge_sign(sample, &triangle[1].position(), &triangle[2].position());
    let d3 = edge_sign(sample, &triangle[2].position(), &triangle[0].position());

    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

/// Index of the largest weight; ties resolve to the later vertex.
fn dominant_index(weights: &[f64; 3]) -> usize {
    let mut best = 0;
    for i in 1..3 {
        if weights[i] >= weights[best] {
            best = i;
        }
    }
    best
}
