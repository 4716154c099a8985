use approx::assert_relative_eq;
use carve_core::nalgebra::Point2;
use carve_core::KeyPoint;
use carve_silhouette::{
    BinaryMask, Chamfer, DistanceMap, DistanceTransform, Error, ExactEuclidean, Metric,
    SilhouetteField,
};
use image::{GrayImage, Luma};
use quickcheck_macros::quickcheck;

fn disc(size: u32, radius: f32) -> BinaryMask {
    let center = (size as f32 - 1.0) / 2.0;
    BinaryMask::from_fn(size, size, |x, y| {
        (x as f32 - center).hypot(y as f32 - center) <= radius
    })
}

fn brute_force(edges: &GrayImage, x: u32, y: u32) -> f32 {
    edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] != 0)
        .map(|(ex, ey, _)| (ex as f32 - x as f32).hypot(ey as f32 - y as f32))
        .fold(DistanceMap::cap(edges.width(), edges.height()), f32::min)
}

#[test]
fn sign_follows_mask() {
    let mask = disc(21, 6.0);
    let field = SilhouetteField::build(mask.clone(), &ExactEuclidean);
    for (x, y, p) in mask.enumerate_pixels() {
        let value = field.query(x, y).unwrap();
        if p[0] == 0 {
            assert!(value < 0.0, "background pixel ({}, {}) has {}", x, y, value);
        } else {
            assert!(value >= 0.0, "foreground pixel ({}, {}) has {}", x, y, value);
        }
    }
    let center = field.query(10, 10).unwrap();
    assert!(center > 5.0 && center <= 6.0);
}

#[test]
fn out_of_bounds_queries() {
    let field = SilhouetteField::build(disc(8, 2.0), &Chamfer::l2());
    assert_eq!(field.query(8, 0), None);
    assert_eq!(field.query(0, 8), None);
    assert_eq!(field.query_point(&KeyPoint(Point2::new(-0.5, 3.0))), None);
    assert_eq!(
        field.query_point(&KeyPoint(Point2::new(3.7, 3.2))),
        field.query(3, 3)
    );
}

#[test]
fn empty_view_is_negative_everywhere() {
    let field = SilhouetteField::build(BinaryMask::filled(6, 8, false), &ExactEuclidean);
    for y in 0..8 {
        for x in 0..6 {
            assert_relative_eq!(field.query(x, y).unwrap(), -10.0);
        }
    }
}

#[test]
fn full_view_is_positive_everywhere() {
    let field = SilhouetteField::build(BinaryMask::filled(6, 8, true), &Metric::ChamferL2);
    assert!(field.distances().pixels().all(|p| p[0] == 10.0));
    assert_eq!(field.query(5, 7), Some(10.0));
}

#[test]
fn from_parts_checks_dimensions() {
    let result = SilhouetteField::from_parts(
        BinaryMask::filled(4, 4, true),
        DistanceMap::constant(4, 3, 2.0),
    );
    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            mask: (4, 4),
            distances: (4, 3)
        })
    ));
    let field = SilhouetteField::from_parts(
        BinaryMask::filled(4, 4, true),
        DistanceMap::constant(4, 4, 2.0),
    )
    .unwrap();
    assert_eq!(field.query(1, 2), Some(2.0));
}

#[test]
fn transforms_are_deterministic() {
    let edges = disc(17, 5.0).edges();
    for metric in [Metric::Euclidean, Metric::ChamferL2, Metric::CityBlock] {
        let a = metric.distance_transform(&edges);
        let b = metric.distance_transform(&edges);
        assert_eq!(a, b);
    }
}

#[test]
fn chamfer_is_close_to_euclidean() {
    let edges = disc(31, 9.0).edges();
    let exact = ExactEuclidean.distance_transform(&edges);
    let chamfer = Chamfer::l2().distance_transform(&edges);
    for (e, c) in exact.pixels().zip(chamfer.pixels()) {
        // The 3x3 chamfer mask is within about 8% of the true distance.
        assert!((e[0] - c[0]).abs() <= 0.1 * e[0] + 0.05, "{} vs {}", e[0], c[0]);
    }
}

#[quickcheck]
fn exact_matches_brute_force(points: Vec<(u8, u8)>) -> bool {
    let (width, height) = (13, 9);
    let mut edges = GrayImage::new(width, height);
    for (x, y) in points {
        edges.put_pixel(x as u32 % width, y as u32 % height, Luma([255]));
    }
    let map = ExactEuclidean.distance_transform(&edges);
    edges.enumerate_pixels().all(|(x, y, _)| {
        (map.get(x, y) - brute_force(&edges, x, y)).abs() < 1e-4
    })
}
