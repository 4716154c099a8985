//! This crate plugs into `carve-core` and provides the pinhole projection camera used for carving.
//! A camera is built from its intrinsic parameters, a rotation quaternion and a translation, which
//! is the pose format written by sparse reconstruction tools such as COLMAP. Projection then maps
//! world points into pixel coordinates through the composed `3x4` projection matrix.

mod camera;
mod rotation;

pub use camera::*;
pub use rotation::*;

use carve_core::nalgebra::{Matrix3, Point2, Vector2};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// This contains intrinsic camera parameters as per
/// [this Wikipedia page](https://en.wikipedia.org/wiki/Camera_resectioning#Intrinsic_parameters).
///
/// Lens distortion is not modeled, so silhouettes should come from undistorted images.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    pub focals: Vector2<f64>,
    pub principal_point: Point2<f64>,
    pub skew: f64,
}

impl CameraIntrinsics {
    /// Creates camera intrinsics that would create an identity intrinsic matrix.
    /// This would imply that the pixel positions have an origin at `0,0`,
    /// the pixel distance unit is the focal length, pixels are square,
    /// and there is no skew.
    pub fn identity() -> Self {
        Self {
            focals: Vector2::new(1.0, 1.0),
            skew: 0.0,
            principal_point: Point2::new(0.0, 0.0),
        }
    }

    /// Creates intrinsics with square pixels of focal length `focal` and no skew.
    ///
    /// This is the `SIMPLE_PINHOLE` model.
    pub fn simple(focal: f64, principal_point: Point2<f64>) -> Self {
        Self::identity().focal(focal).principal_point(principal_point)
    }

    pub fn focals(self, focals: Vector2<f64>) -> Self {
        Self { focals, ..self }
    }

    pub fn focal(self, focal: f64) -> Self {
        Self {
            focals: Vector2::new(focal, focal),
            ..self
        }
    }

    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    pub fn skew(self, skew: f64) -> Self {
        Self { skew, ..self }
    }

    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focals.x,  self.skew,      self.principal_point.x,
            0.0,            self.focals.y,  self.principal_point.y,
            0.0,            0.0,            1.0,
        )
    }
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self::identity()
    }
}
