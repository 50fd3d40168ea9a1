//! End-to-end tests of the raster-aware pipeline: acquisition-raster
//! reconstruction, triangulated painting and the reference filter.

use std::io::Cursor;

use approx::assert_relative_eq;

use ply2image::core::{
    extract_raster_points, Channel, Grid, RasterChannel, RasterPoint, Scaling, SilentProgress,
};
use ply2image::io::ply::PlyFile;
use ply2image::render::{resolve, scatter_raster_points, RasterFilter, RenderError};

fn channel(property: &str) -> Channel {
    Channel {
        element: "vertex".to_owned(),
        property: property.to_owned(),
        scaling: Scaling::default(),
    }
}

fn raster_channel(property: &str) -> RasterChannel {
    RasterChannel {
        element: "vertex".to_owned(),
        property: property.to_owned(),
    }
}

fn load_raster_points(ply_text: &str) -> Vec<RasterPoint> {
    let ply = PlyFile::read(Cursor::new(ply_text.as_bytes().to_vec())).unwrap();
    extract_raster_points(
        &ply,
        &channel("x"),
        &channel("y"),
        &channel("z"),
        &raster_channel("raster_x"),
        &raster_channel("raster_y"),
    )
    .unwrap()
}

fn render_raster(
    width: usize,
    height: usize,
    points: &[RasterPoint],
    filter: RasterFilter,
) -> Result<Grid<f64>, RenderError> {
    let mut progress = SilentProgress;
    let accumulator = scatter_raster_points(width, height, points, filter, &mut progress)?;
    resolve(&accumulator)
}

/// A 2×2 raster square stretched over the image: every pixel inside the
/// projected hull is painted, and planar values are reproduced exactly.
#[test]
fn test_quad_interpolation_from_ply() {
    let points = load_raster_points(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n\
         0 0 0 0 0\n\
         6 0 6 1 0\n\
         0 6 12 0 1\n\
         6 6 18 1 1\n",
    );
    let image = render_raster(7, 7, &points, RasterFilter::None).unwrap();

    // Values form the plane z = x + 2y; barycentric mixes reproduce it.
    for (x, y, value) in image.enumerate_pixels() {
        assert!(!value.is_nan(), "pixel {x},{y} must be covered");
        assert_relative_eq!(*value, x as f64 + 2.0 * y as f64, epsilon = 1e-9);
    }
}

/// Gaps in the acquisition raster stay gaps in the image: a missing corner
/// leaves its far region unpainted.
#[test]
fn test_missing_corner_leaves_gap() {
    let points = load_raster_points(
        "ply\nformat ascii 1.0\n\
         element vertex 3\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n\
         0 0 5 0 0\n\
         6 0 5 1 0\n\
         0 6 5 0 1\n",
    );
    let image = render_raster(7, 7, &points, RasterFilter::Min).unwrap();

    assert!(!image[(0, 0)].is_nan());
    assert!(!image[(3, 3)].is_nan());
    assert!(image[(6, 6)].is_nan());
    assert_relative_eq!(image[(2, 2)], 5.0, epsilon = 1e-9);
}

/// Two points claiming the same raster cell are an error with the exact
/// cell in the message.
#[test]
fn test_duplicate_raster_cell_fails() {
    let ply = PlyFile::read(Cursor::new(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n\
         0 0 0 3 7\n\
         1 0 0 4 7\n\
         0 1 0 3 8\n\
         1 1 0 3 7\n"
            .as_bytes()
            .to_vec(),
    ))
    .unwrap();
    let points = extract_raster_points(
        &ply,
        &channel("x"),
        &channel("y"),
        &channel("z"),
        &raster_channel("raster_x"),
        &raster_channel("raster_y"),
    )
    .unwrap();

    let error = render_raster(4, 4, &points, RasterFilter::Min).unwrap_err();
    assert_eq!(error.to_string(), "raster point 3x7 exists twice");
}

/// A raster spanning a single row or column cannot be triangulated.
#[test]
fn test_degenerate_raster_extent_fails() {
    let points = load_raster_points(
        "ply\nformat ascii 1.0\n\
         element vertex 3\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n\
         0 0 0 0 4\n\
         1 1 0 1 4\n\
         2 2 0 2 4\n",
    );
    let error = render_raster(4, 4, &points, RasterFilter::Min).unwrap_err();
    assert_eq!(
        error.to_string(),
        "raster interpolation requires at least 2 columns and 2 rows"
    );
}

/// Raster indices offset far from zero work; the grid is indexed relative
/// to the minimum.
#[test]
fn test_offset_raster_origin() {
    let points = load_raster_points(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n\
         0 0 1 -100 2000\n\
         3 0 1 -99 2000\n\
         0 3 1 -100 2001\n\
         3 3 1 -99 2001\n",
    );
    let image = render_raster(4, 4, &points, RasterFilter::None).unwrap();
    assert_relative_eq!(image[(1, 1)], 1.0, epsilon = 1e-9);
}

/// Overlapping geometry: a far raster row projected onto the same image
/// region. The min filter must keep only contributions raster-adjacent to
/// the per-pixel minimum and thereby drop the overlapping outlier.
#[test]
fn test_min_filter_drops_raster_distant_overlap() {
    // Two raster columns (rx 0, 1 at image x 0, 4), six raster rows. Rows
    // ry=0..=4 lie at image y 0,1,2,10,11 with value 1; row ry=5 overlaps
    // the top rows at y 0.5 with value 100.
    let mut body = String::new();
    let y_of = [0.0, 1.0, 2.0, 10.0, 11.0, 0.5];
    for ry in 0..6 {
        for rx in 0..2 {
            let value = if ry == 5 { 100.0 } else { 1.0 };
            body.push_str(&format!(
                "{} {} {} {} {}\n",
                rx * 4,
                y_of[ry as usize],
                value,
                rx,
                ry
            ));
        }
    }
    let ply_text = format!(
        "ply\nformat ascii 1.0\n\
         element vertex 12\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n{body}"
    );
    let points = load_raster_points(&ply_text);

    // Without filtering the overlap poisons the top rows.
    let unfiltered = render_raster(8, 16, &points, RasterFilter::None).unwrap();
    assert!(unfiltered[(0, 1)] > 1.0 + 1e-6);

    // The min filter selects the value-1 contribution (ry ≤ 2) as reference;
    // the overlapping ry=5 contributions are farther than one raster step
    // and disappear.
    let filtered = render_raster(8, 16, &points, RasterFilter::Min).unwrap();
    assert_relative_eq!(filtered[(0, 1)], 1.0, epsilon = 1e-9);
    assert_relative_eq!(filtered[(4, 1)], 1.0, epsilon = 1e-9);

    // With the max filter the outlier row is the reference instead.
    let max_filtered = render_raster(8, 16, &points, RasterFilter::Max).unwrap();
    assert!(max_filtered[(0, 1)] > 1.0 + 1e-6);
}

/// Surviving contributions after filtering differ from the reference by at
/// most one raster step per axis.
#[test]
fn test_filter_locality() {
    let mut body = String::new();
    let y_of = [0.0, 1.0, 2.0, 10.0, 11.0, 0.5];
    for ry in 0..6 {
        for rx in 0..2 {
            let value = if ry == 5 { 100.0 } else { (ry + 1) as f64 };
            body.push_str(&format!(
                "{} {} {} {} {}\n",
                rx * 4,
                y_of[ry as usize],
                value,
                rx,
                ry
            ));
        }
    }
    let ply_text = format!(
        "ply\nformat ascii 1.0\n\
         element vertex 12\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property int raster_x\n\
         property int raster_y\n\
         end_header\n{body}"
    );
    let points = load_raster_points(&ply_text);

    let mut progress = SilentProgress;
    let accumulator =
        scatter_raster_points(8, 16, &points, RasterFilter::Min, &mut progress).unwrap();

    for splats in accumulator.pixels() {
        if splats.is_empty() {
            continue;
        }
        let reference = splats
            .iter()
            .copied()
            .reduce(|best, s| if s.value < best.value { s } else { best })
            .unwrap();
        for splat in splats {
            assert!((splat.rx - reference.rx).abs() <= 1);
            assert!((splat.ry - reference.ry).abs() <= 1);
        }
    }
}

/// Floating raster properties holding exact integers are accepted.
#[test]
fn test_float_raster_indices() {
    let points = load_raster_points(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\n\
         property float y\n\
         property float z\n\
         property float raster_x\n\
         property float raster_y\n\
         end_header\n\
         0 0 1 0 0\n\
         3 0 1 1 0\n\
         0 3 1 0 1\n\
         3 3 1 1 1\n",
    );
    assert_eq!(points[3].rx, 1);
    assert_eq!(points[3].ry, 1);
    let image = render_raster(4, 4, &points, RasterFilter::Min).unwrap();
    assert_relative_eq!(image[(1, 1)], 1.0, epsilon = 1e-9);
}
