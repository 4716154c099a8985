use carve_core::nalgebra::{Point2, Point3, Vector3};
use carve_core::{CameraModel, ImageBounds, KeyPoint, WorldPoint};
use carve_sfs::{
    CarveReport, CarvingEngine, GridGeometry, Observation, OutOfFrame, VoxelGrid, SENTINEL,
};
use carve_silhouette::{BinaryMask, DistanceMap, DistanceTransform, ExactEuclidean, SilhouetteField};
use image::GrayImage;
use quickcheck_macros::quickcheck;

/// Looks down one world axis, mapping the other two onto the image with an offset of one pixel.
#[derive(Debug, Clone, Copy)]
struct Orthographic {
    u: usize,
    v: usize,
    bounds: ImageBounds,
}

impl Orthographic {
    fn new(u: usize, v: usize, size: u32) -> Self {
        Self {
            u,
            v,
            bounds: ImageBounds::new(size, size),
        }
    }
}

impl CameraModel for Orthographic {
    fn project(&self, point: WorldPoint) -> Option<KeyPoint> {
        Some(KeyPoint(Point2::new(point[self.u] + 1.0, point[self.v] + 1.0)))
    }

    fn bounds(&self) -> ImageBounds {
        self.bounds
    }
}

/// Reports the same distance everywhere.
struct Constant(f32);

impl DistanceTransform for Constant {
    fn distance_transform(&self, edges: &GrayImage) -> DistanceMap {
        DistanceMap::constant(edges.width(), edges.height(), self.0)
    }
}

fn unit_grid(dimension: usize, extent: f64) -> VoxelGrid {
    VoxelGrid::from_geometry(GridGeometry::new(
        dimension,
        Point3::origin(),
        Vector3::repeat(extent),
    ))
}

fn full_views(size: u32) -> Vec<(Orthographic, SilhouetteField)> {
    [Orthographic::new(0, 1, size), Orthographic::new(2, 1, size)]
        .into_iter()
        .map(|camera| {
            let mask = BinaryMask::filled(size, size, true);
            (camera, SilhouetteField::build(mask, &Constant(2.0)))
        })
        .collect()
}

fn mask_from_bits(size: u32, bits: &[bool]) -> BinaryMask {
    BinaryMask::from_fn(size, size, |x, y| {
        bits.get((y * size + x) as usize).copied().unwrap_or(false)
    })
}

#[test]
fn zero_views_leave_sentinel() {
    let _ = pretty_env_logger::try_init_timed();
    let mut grid = unit_grid(3, 1.0);
    let views: Vec<(Orthographic, SilhouetteField)> = vec![];
    let report = CarvingEngine::default().carve_all(&mut grid, &views);
    assert!(report.is_empty());
    assert_eq!(report.unobserved, 27);
    assert!(grid.is_uncarved());
    let report = CarvingEngine::default().carve_all_buffered(&mut grid, &views);
    assert!(report.is_empty());
    assert!(grid.values().iter().all(|&v| v == SENTINEL));
}

#[test]
fn two_views_agree_on_the_corners() {
    let mut grid = unit_grid(2, 1.0);
    let report = CarvingEngine::default().carve_all(&mut grid, &full_views(4));
    assert_eq!(
        report,
        CarveReport {
            views: 2,
            inside: 8,
            unobserved: 0
        }
    );
    assert!(grid.values().iter().all(|&v| v == 2.0));
}

#[test]
fn outside_both_images_stays_sentinel() {
    // Voxel coordinates 0, 2 and 4 land on pixels 1, 3 and 5, and pixel 5 is outside.
    let mut grid = unit_grid(3, 2.0);
    CarvingEngine::new(OutOfFrame::Ignore).carve_all(&mut grid, &full_views(4));
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                let expected = if j == 2 || (i == 2 && k == 2) {
                    SENTINEL
                } else {
                    2.0
                };
                assert_eq!(grid.get(i, j, k), expected, "voxel ({}, {}, {})", i, j, k);
            }
        }
    }

    // By default, views carve away everything they cannot see.
    let mut grid = unit_grid(3, 2.0);
    let report = CarvingEngine::default().carve_all(&mut grid, &full_views(4));
    assert_eq!(report.inside, 8);
    assert_eq!(grid.get(2, 0, 0), -1.0);
    assert_eq!(grid.get(0, 2, 0), -1.0);
    assert_eq!(grid.get(1, 1, 1), 2.0);
}

#[test]
fn empty_view_carves_everything() {
    let size = 6;
    let mut grid = unit_grid(4, 1.0);
    let mut views = full_views(size);
    CarvingEngine::default().carve_all(&mut grid, &views);
    assert!(grid.values().iter().all(|&v| v > 0.0));

    let empty = SilhouetteField::build(BinaryMask::filled(size, size, false), &ExactEuclidean);
    views.push((Orthographic::new(0, 2, size), empty));
    let report = CarvingEngine::default().carve_all(&mut grid, &views[2..]);
    assert_eq!(report.inside, 0);
    assert!(grid.values().iter().all(|&v| v < 0.0));
}

#[test]
fn carving_never_raises_values() {
    let size = 8;
    let bits: Vec<bool> = (0..64).map(|n| n % 3 != 0).collect();
    let views = vec![
        (
            Orthographic::new(0, 1, size),
            SilhouetteField::build(mask_from_bits(size, &bits), &ExactEuclidean),
        ),
        (
            Orthographic::new(1, 2, size),
            SilhouetteField::build(mask_from_bits(size, &bits[7..]), &ExactEuclidean),
        ),
    ];
    let engine = CarvingEngine::default();
    let mut grid = unit_grid(7, 1.0);
    for view in &views {
        let before = grid.clone();
        engine.carve(&mut grid, view.camera(), view.field());
        assert!(grid
            .values()
            .iter()
            .zip(before.values())
            .all(|(after, before)| after <= before));
    }
}

#[test]
fn voxels_inside_every_silhouette_survive() {
    let size = 16;
    let square = |lo: u32, hi: u32| {
        BinaryMask::from_fn(size, size, move |x, y| {
            (lo..hi).contains(&x) && (lo..hi).contains(&y)
        })
    };
    let views = vec![
        (
            Orthographic::new(0, 1, size),
            SilhouetteField::build(square(2, 13), &ExactEuclidean),
        ),
        (
            Orthographic::new(2, 1, size),
            SilhouetteField::build(square(3, 12), &ExactEuclidean),
        ),
    ];
    let engine = CarvingEngine::default();
    let mut grid = unit_grid(14, 1.0);
    engine.carve_all(&mut grid, &views);

    let margin = 2.0;
    let geometry = grid.geometry();
    let mut survivors = 0;
    for (index, &value) in grid.values().iter().enumerate() {
        let (i, j, k) = geometry.coordinates(index);
        let samples: Vec<f32> = views
            .iter()
            .filter_map(|view| engine.sample(view.camera(), view.field(), geometry.center(i, j, k)))
            .collect();
        assert_eq!(value, samples.iter().copied().fold(SENTINEL, f32::min));
        if samples.iter().all(|&s| s >= margin) {
            assert!(value >= margin);
            survivors += 1;
        }
    }
    assert!(survivors > 0);
}

#[test]
fn buffered_matches_sequential() {
    let size = 10;
    let bits: Vec<bool> = (0..100).map(|n| (n * 7) % 5 < 3).collect();
    let views: Vec<_> = [(0, 1), (1, 2), (2, 0), (0, 2)]
        .into_iter()
        .enumerate()
        .map(|(n, (u, v))| {
            (
                Orthographic::new(u, v, size),
                SilhouetteField::build(mask_from_bits(size, &bits[n..]), &ExactEuclidean),
            )
        })
        .collect();
    let engine = CarvingEngine::default();
    let mut sequential = unit_grid(9, 1.0);
    let mut buffered = sequential.clone();
    let a = engine.carve_all(&mut sequential, &views);
    let b = engine.carve_all_buffered(&mut buffered, &views);
    assert_eq!(a, b);
    assert_eq!(sequential, buffered);
}

#[quickcheck]
fn carving_order_does_not_matter(a: Vec<bool>, b: Vec<bool>, ignore: bool) -> bool {
    let size = 6;
    let engine = CarvingEngine::new(if ignore {
        OutOfFrame::Ignore
    } else {
        OutOfFrame::default()
    });
    let first = (
        Orthographic::new(0, 1, size),
        SilhouetteField::build(mask_from_bits(size, &a), &ExactEuclidean),
    );
    let second = (
        Orthographic::new(1, 2, size),
        SilhouetteField::build(mask_from_bits(size, &b), &ExactEuclidean),
    );
    let mut forward = unit_grid(6, 1.0);
    let mut backward = unit_grid(6, 1.0);
    engine.carve_all(&mut forward, &[&first, &second]);
    engine.carve_all(&mut backward, &[&second, &first]);
    forward == backward
}
