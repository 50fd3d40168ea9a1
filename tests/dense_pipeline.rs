//! End-to-end tests of the dense (unrastered) pipeline:
//! PLY text → columns → points → bilinear accumulator → resolved image.

use std::io::Cursor;

use approx::assert_relative_eq;

use ply2image::core::{extract_points, Channel, Grid, Point, Scaling};
use ply2image::io::ply::PlyFile;
use ply2image::render::{resolve, scatter_points};

fn channel(property: &str) -> Channel {
    Channel {
        element: "vertex".to_owned(),
        property: property.to_owned(),
        scaling: Scaling::default(),
    }
}

fn load_points(ply_text: &str) -> Vec<Point> {
    let ply = PlyFile::read(Cursor::new(ply_text.as_bytes().to_vec())).unwrap();
    extract_points(&ply, &channel("x"), &channel("y"), &channel("z")).unwrap()
}

fn render_dense(width: usize, height: usize, points: &[Point]) -> Grid<f64> {
    resolve(&scatter_points(width, height, points)).unwrap()
}

/// Four points on the integer grid land exactly on their four pixels.
#[test]
fn test_integer_grid_points() {
    let points = load_points(
        "ply\nformat ascii 1.0\n\
         element vertex 4\n\
         property float x\n\
         property float y\n\
         property float z\n\
         end_header\n\
         0 0 1\n\
         1 0 2\n\
         0 1 3\n\
         1 1 4\n",
    );
    let image = render_dense(2, 2, &points);

    let values: Vec<f64> = image.pixels().copied().collect();
    assert_eq!(values, [1.0, 2.0, 3.0, 4.0]);
}

/// An additional point at (0.5, 0.5) spreads its value with weight 0.25
/// into all four pixels and shifts every mean accordingly.
#[test]
fn test_fractional_point_blends_into_neighbors() {
    let points = load_points(
        "ply\nformat ascii 1.0\n\
         element vertex 5\n\
         property float x\n\
         property float y\n\
         property float z\n\
         end_header\n\
         0 0 1\n\
         1 0 2\n\
         0 1 3\n\
         1 1 4\n\
         0.5 0.5 10\n",
    );
    let image = render_dense(2, 2, &points);

    assert_relative_eq!(image[(0, 0)], (1.0 + 10.0 * 0.25) / 1.25);
    assert_relative_eq!(image[(0, 0)], 2.8);
    assert_relative_eq!(image[(1, 0)], (2.0 + 2.5) / 1.25);
    assert_relative_eq!(image[(0, 1)], (3.0 + 2.5) / 1.25);
    assert_relative_eq!(image[(1, 1)], (4.0 + 2.5) / 1.25);
}

/// Pixels without any contribution carry the NaN sentinel, and only those.
#[test]
fn test_sentinel_discipline() {
    let points = load_points(
        "ply\nformat ascii 1.0\n\
         element vertex 1\n\
         property float x\n\
         property float y\n\
         property float z\n\
         end_header\n\
         0.5 0.5 6\n",
    );
    let image = render_dense(4, 4, &points);

    for (x, y, value) in image.enumerate_pixels() {
        if x <= 1 && y <= 1 {
            assert_relative_eq!(*value, 6.0);
        } else {
            assert!(value.is_nan(), "pixel {x},{y} should be empty");
        }
    }
}

/// The channel scaling `(v + pre) * factor + post` is applied per axis
/// before rasterization.
#[test]
fn test_scaling_moves_points() {
    let ply = PlyFile::read(Cursor::new(
        "ply\nformat ascii 1.0\n\
         element vertex 1\n\
         property float x\n\
         property float y\n\
         property float z\n\
         end_header\n\
         10 20 3\n"
            .as_bytes()
            .to_vec(),
    ))
    .unwrap();

    let x = Channel {
        element: "vertex".to_owned(),
        property: "x".to_owned(),
        scaling: Scaling {
            pre_offset: -10.0,
            factor: 1.0,
            post_offset: 1.0,
        },
    };
    let y = Channel {
        element: "vertex".to_owned(),
        property: "y".to_owned(),
        scaling: Scaling {
            pre_offset: 0.0,
            factor: 0.1,
            post_offset: 0.0,
        },
    };
    let v = Channel {
        element: "vertex".to_owned(),
        property: "z".to_owned(),
        scaling: Scaling {
            pre_offset: 1.0,
            factor: 100.0,
            post_offset: -4.0,
        },
    };
    let points = extract_points(&ply, &x, &y, &v).unwrap();
    let image = render_dense(4, 4, &points);

    // x: (10 - 10) * 1 + 1 = 1, y: 20 * 0.1 = 2, v: (3 + 1) * 100 - 4 = 396
    assert_relative_eq!(image[(1, 2)], 396.0);
    assert!(image[(0, 0)].is_nan());
}

/// Shuffling the input order changes neither the NaN set nor (up to
/// floating-point associativity) the values.
#[test]
fn test_order_invariance() {
    let mut points = Vec::new();
    for i in 0..25 {
        points.push(Point {
            x: (i % 5) as f64 * 0.7 + 0.1,
            y: (i / 5) as f64 * 0.6 + 0.2,
            v: i as f64,
        });
    }

    let image = render_dense(4, 4, &points);

    // Deterministic shuffle: odd indices first, then reversed evens.
    let mut shuffled: Vec<Point> = points.iter().copied().skip(1).step_by(2).collect();
    shuffled.extend(points.iter().copied().step_by(2).rev());
    assert_eq!(shuffled.len(), points.len());
    let shuffled_image = render_dense(4, 4, &shuffled);

    for (a, b) in image.pixels().zip(shuffled_image.pixels()) {
        assert_eq!(a.is_nan(), b.is_nan());
        if !a.is_nan() {
            assert_relative_eq!(*a, *b, max_relative = 1e-12);
        }
    }
}
