use crate::{GridGeometry, VoxelGrid, SENTINEL};
use carve_core::{CameraModel, WorldPoint};
use carve_silhouette::SilhouetteField;
use log::*;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// What a view contributes for voxels that do not project into its image.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
pub enum OutOfFrame {
    /// The voxel is carved with this distance. A negative value removes voxels that any view
    /// cannot see.
    Constant(f32),
    /// The view leaves the voxel unchanged.
    Ignore,
}

impl OutOfFrame {
    pub fn value(self) -> Option<f32> {
        match self {
            OutOfFrame::Constant(value) => Some(value),
            OutOfFrame::Ignore => None,
        }
    }
}

impl Default for OutOfFrame {
    fn default() -> Self {
        OutOfFrame::Constant(-1.0)
    }
}

/// A calibrated camera together with the silhouette it observed.
pub trait Observation {
    type Camera: CameraModel;

    fn camera(&self) -> &Self::Camera;

    fn field(&self) -> &SilhouetteField;
}

impl<C: CameraModel> Observation for (C, SilhouetteField) {
    type Camera = C;

    fn camera(&self) -> &C {
        &self.0
    }

    fn field(&self) -> &SilhouetteField {
        &self.1
    }
}

impl<O: Observation> Observation for &O {
    type Camera = O::Camera;

    fn camera(&self) -> &Self::Camera {
        (**self).camera()
    }

    fn field(&self) -> &SilhouetteField {
        (**self).field()
    }
}

/// A summary of the grid after carving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarveReport {
    /// The number of views that were fused into the grid.
    pub views: usize,
    /// The number of voxels that are strictly inside of every silhouette.
    pub inside: usize,
    /// The number of voxels that still hold [`SENTINEL`].
    pub unobserved: usize,
}

impl CarveReport {
    pub fn from_grid(grid: &VoxelGrid, views: usize) -> Self {
        let (inside, unobserved) = grid.values().iter().fold((0, 0), |(inside, unobserved), &v| {
            (
                inside + (v > 0.0 && v != SENTINEL) as usize,
                unobserved + (v == SENTINEL) as usize,
            )
        });
        Self {
            views,
            inside,
            unobserved,
        }
    }

    /// Checks if there was nothing to carve with.
    pub fn is_empty(&self) -> bool {
        self.views == 0
    }
}

/// Fuses silhouettes into a voxel grid.
///
/// Every voxel keeps the lowest signed distance that any view reports for it. A voxel whose value
/// stays positive is inside of every silhouette, so it belongs to the visual hull.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CarvingEngine {
    pub out_of_frame: OutOfFrame,
}

impl CarvingEngine {
    pub fn new(out_of_frame: OutOfFrame) -> Self {
        Self { out_of_frame }
    }

    /// The signed distance that one view reports for a world point, if any.
    ///
    /// Points that project outside of the image, behind the projection plane, or onto
    /// non-finite coordinates fall back to [`OutOfFrame`].
    pub fn sample<C>(&self, camera: &C, field: &SilhouetteField, point: WorldPoint) -> Option<f32>
    where
        C: CameraModel + ?Sized,
    {
        camera
            .project(point)
            .and_then(|keypoint| camera.bounds().pixel(&keypoint))
            .and_then(|(x, y)| field.query(x, y))
            .or_else(|| self.out_of_frame.value())
    }

    /// Carves the grid with a single view.
    pub fn carve<C>(&self, grid: &mut VoxelGrid, camera: &C, field: &SilhouetteField)
    where
        C: CameraModel + Sync + ?Sized,
    {
        let geometry = grid.geometry();
        let carve_slab = |(i, slab): (usize, &mut [f32])| {
            self.carve_slab(&geometry, i, slab, camera, field);
        };
        #[cfg(not(feature = "rayon"))]
        grid.values_mut()
            .chunks_mut(geometry.slab_len())
            .enumerate()
            .for_each(carve_slab);
        #[cfg(feature = "rayon")]
        grid.values_mut()
            .par_chunks_mut(geometry.slab_len())
            .enumerate()
            .for_each(carve_slab);
    }

    fn carve_slab<C>(
        &self,
        geometry: &GridGeometry,
        i: usize,
        slab: &mut [f32],
        camera: &C,
        field: &SilhouetteField,
    ) where
        C: CameraModel + ?Sized,
    {
        let d = geometry.dimension();
        for j in 0..d {
            for k in 0..d {
                if let Some(distance) = self.sample(camera, field, geometry.center(i, j, k)) {
                    let value = &mut slab[j * d + k];
                    if distance < *value {
                        *value = distance;
                    }
                }
            }
        }
    }

    /// Carves the grid with every view, one after another.
    pub fn carve_all<O>(&self, grid: &mut VoxelGrid, views: &[O]) -> CarveReport
    where
        O: Observation,
        O::Camera: Sync,
    {
        if views.is_empty() {
            warn!("no views to carve with, the grid is left untouched");
            return CarveReport::from_grid(grid, 0);
        }
        for (ix, view) in views.iter().enumerate() {
            info!("carving view {} of {}", ix + 1, views.len());
            self.carve(grid, view.camera(), view.field());
        }
        let report = CarveReport::from_grid(grid, views.len());
        info!(
            "carved {} views, {} voxels inside the hull",
            report.views, report.inside
        );
        report
    }

    /// Carves the grid with every view, carving views into private buffers at the same time
    /// and merging the buffers into the grid afterwards.
    ///
    /// The result is identical to [`CarvingEngine::carve_all`], but each worker thread holds
    /// one extra copy of the grid.
    pub fn carve_all_buffered<O>(&self, grid: &mut VoxelGrid, views: &[O]) -> CarveReport
    where
        O: Observation + Sync,
        O::Camera: Sync,
    {
        if views.is_empty() {
            warn!("no views to carve with, the grid is left untouched");
            return CarveReport::from_grid(grid, 0);
        }
        let geometry = grid.geometry();
        let carve_into = |mut buffer: VoxelGrid, view: &O| {
            debug!("carving a view into a private buffer");
            self.carve(&mut buffer, view.camera(), view.field());
            buffer
        };
        #[cfg(not(feature = "rayon"))]
        let buffer = views
            .iter()
            .fold(VoxelGrid::from_geometry(geometry), carve_into);
        #[cfg(feature = "rayon")]
        let buffer = views
            .par_iter()
            .fold(|| VoxelGrid::from_geometry(geometry), carve_into)
            .reduce(
                || VoxelGrid::from_geometry(geometry),
                |mut a, b| {
                    a.merge_min(&b);
                    a
                },
            );
        grid.merge_min(&buffer);
        let report = CarveReport::from_grid(grid, views.len());
        info!(
            "carved {} views in buffers, {} voxels inside the hull",
            report.views, report.inside
        );
        report
    }
}
