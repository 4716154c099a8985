use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point3, Vector4};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A point in "world" coordinates.
///
/// The unit of distance is whatever unit the camera translations were expressed in.
/// For scenes coming out of a sparse reconstruction this scale is arbitrary, which is
/// why the carving bounding box is configurable.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct WorldPoint(pub Point3<f64>);

impl WorldPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Point3::new(x, y, z))
    }

    /// Retrieve the homogeneous vector `[x, y, z, 1]`.
    pub fn homogeneous(self) -> Vector4<f64> {
        self.0.to_homogeneous()
    }
}
