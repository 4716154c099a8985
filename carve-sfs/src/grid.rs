use carve_core::nalgebra::{Point3, Vector3};
use crate::{Error, Result};
use carve_core::WorldPoint;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The value of a voxel that no view has carved yet. It is far outside of any silhouette
/// boundary distance, so the first view to see the voxel always replaces it.
pub const SENTINEL: f32 = 1000.0;

/// The axis aligned box in world space that is expected to contain the subject.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// A cube centered on the world origin.
    pub fn cube(half_size: f64) -> Self {
        Self::new(
            Point3::new(-half_size, -half_size, -half_size),
            Point3::new(half_size, half_size, half_size),
        )
    }

    /// The absolute length of each side.
    pub fn size(&self) -> Vector3<f64> {
        (self.max - self.min).abs()
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::cube(2.0)
    }
}

/// How the corner of the grid is placed relative to the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
pub enum OriginRule {
    /// The margin is applied below the box on X and Y, but Z starts at the ground plane `z = 0`.
    #[default]
    GroundPlane,
    /// The margin is applied below the box on every axis.
    Margin,
}

/// Describes where the voxel grid sits in the world and how finely it samples it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarvingParameters {
    pub bounds: BoundingBox,
    /// The number of voxels along each axis.
    pub dimension: usize,
    /// The fraction of the box size that is added to each axis.
    pub margins: Vector3<f64>,
    pub origin_rule: OriginRule,
}

impl CarvingParameters {
    /// The world space size of one voxel along each axis.
    ///
    /// ```
    /// use carve_sfs::CarvingParameters;
    /// let parameters = CarvingParameters::default();
    /// let extents = parameters.extents();
    /// assert!((extents.x - 4.0 * 1.15 / 256.0).abs() < 1e-12);
    /// assert!((extents.z - 4.0 * 1.05 / 256.0).abs() < 1e-12);
    /// ```
    pub fn extents(&self) -> Vector3<f64> {
        self.bounds
            .size()
            .component_mul(&self.margins.add_scalar(1.0))
            / self.dimension.max(1) as f64
    }

    /// The world position of voxel `(0, 0, 0)`.
    pub fn origin(&self) -> Point3<f64> {
        let shifted = self.bounds.min - self.bounds.size().component_mul(&self.margins);
        match self.origin_rule {
            OriginRule::GroundPlane => Point3::new(shifted.x, shifted.y, 0.0),
            OriginRule::Margin => shifted,
        }
    }

    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::new(self.dimension, self.origin(), self.extents())
    }
}

impl Default for CarvingParameters {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::default(),
            dimension: 256,
            margins: Vector3::new(0.15, 0.15, 0.05),
            origin_rule: OriginRule::default(),
        }
    }
}

/// Maps voxel indices to the world and to positions in the flat value buffer.
///
/// Voxels are stored with `k` varying fastest, so `(i, j, k)` lives at `i·D² + j·D + k`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(from = "RawGeometry"))]
pub struct GridGeometry {
    dimension: usize,
    origin: Point3<f64>,
    extents: Vector3<f64>,
}

#[cfg(feature = "serde-serialize")]
#[derive(Deserialize)]
struct RawGeometry {
    dimension: usize,
    origin: Point3<f64>,
    extents: Vector3<f64>,
}

#[cfg(feature = "serde-serialize")]
impl From<RawGeometry> for GridGeometry {
    fn from(raw: RawGeometry) -> Self {
        Self::new(raw.dimension, raw.origin, raw.extents)
    }
}

impl GridGeometry {
    /// The dimension is clamped to at least one voxel.
    pub fn new(dimension: usize, origin: Point3<f64>, extents: Vector3<f64>) -> Self {
        Self {
            dimension: dimension.max(1),
            origin,
            extents,
        }
    }

    /// The number of voxels along each axis.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn extents(&self) -> Vector3<f64> {
        self.extents
    }

    /// The total number of voxels.
    pub fn len(&self) -> usize {
        self.dimension.pow(3)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of voxels that share the same `i`.
    pub fn slab_len(&self) -> usize {
        self.dimension * self.dimension
    }

    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        let d = self.dimension;
        i * d * d + j * d + k
    }

    pub fn coordinates(&self, index: usize) -> (usize, usize, usize) {
        let d = self.dimension;
        (index / (d * d), index / d % d, index % d)
    }

    /// The world position that voxel `(i, j, k)` samples.
    pub fn center(&self, i: usize, j: usize, k: usize) -> WorldPoint {
        WorldPoint(
            self.origin
                + Vector3::new(i as f64, j as f64, k as f64).component_mul(&self.extents),
        )
    }
}

/// A dense cube of scalar values that sample space at regular intervals.
///
/// Every value starts at [`SENTINEL`] and can only decrease through [`VoxelGrid::fuse`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(try_from = "RawGrid"))]
pub struct VoxelGrid {
    geometry: GridGeometry,
    values: Vec<f32>,
}

#[cfg(feature = "serde-serialize")]
#[derive(Deserialize)]
struct RawGrid {
    geometry: GridGeometry,
    values: Vec<f32>,
}

#[cfg(feature = "serde-serialize")]
impl TryFrom<RawGrid> for VoxelGrid {
    type Error = Error;

    fn try_from(raw: RawGrid) -> Result<Self> {
        Self::from_values(raw.geometry, raw.values)
    }
}

impl VoxelGrid {
    pub fn new(parameters: &CarvingParameters) -> Self {
        Self::from_geometry(parameters.geometry())
    }

    pub fn from_geometry(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            values: vec![SENTINEL; geometry.len()],
        }
    }

    /// Wraps existing values, which must hold one value per voxel of `geometry`.
    pub fn from_values(geometry: GridGeometry, values: Vec<f32>) -> Result<Self> {
        if values.len() != geometry.len() {
            return Err(Error::GridSize {
                expected: geometry.len(),
                found: values.len(),
            });
        }
        Ok(Self { geometry, values })
    }

    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    pub fn dimension(&self) -> usize {
        self.geometry.dimension
    }

    pub fn origin(&self) -> Point3<f64> {
        self.geometry.origin
    }

    pub fn extents(&self) -> Vector3<f64> {
        self.geometry.extents
    }

    /// All values, indexed by [`GridGeometry::index`].
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> f32 {
        self.values[self.geometry.index(i, j, k)]
    }

    /// Lowers a voxel to `value` if it is currently higher.
    pub fn fuse(&mut self, i: usize, j: usize, k: usize, value: f32) {
        let index = self.geometry.index(i, j, k);
        let current = &mut self.values[index];
        if value < *current {
            *current = value;
        }
    }

    /// Lowers every voxel to the value of the same voxel in `other` where that is lower.
    ///
    /// Both grids must have the same geometry.
    pub fn merge_min(&mut self, other: &VoxelGrid) {
        debug_assert_eq!(self.geometry, other.geometry);
        let merge = |(value, &other): (&mut f32, &f32)| {
            if other < *value {
                *value = other;
            }
        };
        #[cfg(not(feature = "rayon"))]
        self.values.iter_mut().zip(&other.values).for_each(merge);
        #[cfg(feature = "rayon")]
        self.values
            .par_iter_mut()
            .zip(&other.values)
            .for_each(merge);
    }

    /// Checks if no voxel was carved yet.
    pub fn is_uncarved(&self) -> bool {
        self.values.iter().all(|&v| v == SENTINEL)
    }

    /// Counts the voxels above `threshold`.
    pub fn count_above(&self, threshold: f32) -> usize {
        self.values.iter().filter(|&&v| v > threshold).count()
    }
}
