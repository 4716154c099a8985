use carve_core::nalgebra::{Point2, Quaternion, Vector3};
use carve_core::ImageBounds;
use carve_pinhole::{CameraIntrinsics, PinholeCamera};
use carve_sfs::{
    BoundingBox, CarvingEngine, CarvingParameters, IsoSurfaceExtractor, MarchingTetrahedra,
    OriginRule, VoxelGrid,
};
use carve_silhouette::{BinaryMask, Chamfer, DistanceTransform, ExactEuclidean, SilhouetteField};
use criterion::{criterion_group, criterion_main, Criterion};

const SIZE: u32 = 256;

fn disc() -> BinaryMask {
    BinaryMask::from_fn(SIZE, SIZE, |x, y| {
        (x as f64 - 128.0).hypot(y as f64 - 128.0) < 40.0
    })
}

fn views() -> Vec<(PinholeCamera, SilhouetteField)> {
    let half = std::f64::consts::FRAC_1_SQRT_2;
    [
        Quaternion::new(1.0, 0.0, 0.0, 0.0),
        Quaternion::new(half, 0.0, half, 0.0),
        Quaternion::new(half, half, 0.0, 0.0),
    ]
    .into_iter()
    .map(|rotation| {
        let camera = PinholeCamera::new(
            CameraIntrinsics::simple(256.0, Point2::new(128.0, 128.0)),
            rotation,
            Vector3::new(0.0, 0.0, 4.0),
            ImageBounds::new(SIZE, SIZE),
        );
        (camera, SilhouetteField::build(disc(), &ExactEuclidean))
    })
    .collect()
}

fn parameters() -> CarvingParameters {
    CarvingParameters {
        bounds: BoundingBox::cube(1.0),
        dimension: 64,
        origin_rule: OriginRule::Margin,
        ..Default::default()
    }
}

fn carve(c: &mut Criterion) {
    let views = views();
    let engine = CarvingEngine::default();
    c.bench_function("carve_all", |b| {
        b.iter(|| engine.carve_all(&mut VoxelGrid::new(&parameters()), &views))
    });
    c.bench_function("carve_all_buffered", |b| {
        b.iter(|| engine.carve_all_buffered(&mut VoxelGrid::new(&parameters()), &views))
    });
    let mut grid = VoxelGrid::new(&parameters());
    engine.carve_all(&mut grid, &views);
    c.bench_function("marching_tetrahedra", |b| {
        b.iter(|| MarchingTetrahedra::new(0.0).extract(&grid))
    });
}

criterion_group!(
    name = carving;
    config = Criterion::default().sample_size(10);
    targets = carve
);

fn bench_distance_transforms(c: &mut Criterion) {
    let edges = disc().edges();
    c.bench_function("exact_euclidean", |b| {
        b.iter(|| ExactEuclidean.distance_transform(&edges))
    });
    c.bench_function("chamfer_l2", |b| {
        b.iter(|| Chamfer::l2().distance_transform(&edges))
    });
}

criterion_group!(
    name = silhouette;
    config = Criterion::default().sample_size(10);
    targets = bench_distance_transforms
);

criterion_main!(carving, silhouette);
