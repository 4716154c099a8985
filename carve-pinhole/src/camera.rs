use crate::{quaternion_rotation, CameraIntrinsics};
use carve_core::nalgebra::{Matrix3, Matrix3x4, Point2, Point3, Quaternion, Vector3};
use carve_core::{CameraModel, ImageBounds, KeyPoint, WorldPoint};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A calibrated pinhole camera with a known pose.
///
/// The pose transforms world points into the camera frame, where the X axis points right,
/// the Y axis points down, and the Z axis points forwards out of the optical center. The
/// projection matrix `P = K·[R|t]` is composed by every constructor and never changed on its own,
/// so the camera stays consistent. To change any parameter, build a new camera with the
/// `with_*` methods.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PinholeCamera {
    intrinsics: CameraIntrinsics,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    projection: Matrix3x4<f64>,
    bounds: ImageBounds,
}

impl PinholeCamera {
    /// Builds a camera from its intrinsics, a rotation quaternion `(w, i, j, k)` and a translation.
    ///
    /// The quaternion is not normalized. See [`quaternion_rotation`].
    ///
    /// ```
    /// use carve_core::{CameraModel, ImageBounds, WorldPoint};
    /// use carve_core::nalgebra::{Point2, Quaternion, Vector3};
    /// use carve_pinhole::{CameraIntrinsics, PinholeCamera};
    /// let camera = PinholeCamera::new(
    ///     CameraIntrinsics::simple(800.0, Point2::new(320.0, 240.0)),
    ///     Quaternion::new(1.0, 0.0, 0.0, 0.0),
    ///     Vector3::new(0.0, 0.0, 2.0),
    ///     ImageBounds::new(640, 480),
    /// );
    /// let pixel = camera.project(WorldPoint::new(0.5, 0.0, 0.0)).unwrap();
    /// assert!((pixel.x - 520.0).abs() < 1e-9);
    /// assert!((pixel.y - 240.0).abs() < 1e-9);
    /// ```
    pub fn new(
        intrinsics: CameraIntrinsics,
        rotation: Quaternion<f64>,
        translation: Vector3<f64>,
        bounds: ImageBounds,
    ) -> Self {
        Self::from_rotation_matrix(
            intrinsics,
            quaternion_rotation(rotation),
            translation,
            bounds,
        )
    }

    /// Builds a camera from a rotation matrix instead of a quaternion.
    ///
    /// The matrix is used as-is, so it should be orthonormal.
    pub fn from_rotation_matrix(
        intrinsics: CameraIntrinsics,
        rotation: Matrix3<f64>,
        translation: Vector3<f64>,
        bounds: ImageBounds,
    ) -> Self {
        let extrinsics = Matrix3x4::from_columns(&[
            rotation.column(0).into_owned(),
            rotation.column(1).into_owned(),
            rotation.column(2).into_owned(),
            translation,
        ]);
        Self {
            intrinsics,
            rotation,
            translation,
            projection: intrinsics.matrix() * extrinsics,
            bounds,
        }
    }

    #[must_use]
    pub fn with_intrinsics(self, intrinsics: CameraIntrinsics) -> Self {
        Self::from_rotation_matrix(intrinsics, self.rotation, self.translation, self.bounds)
    }

    #[must_use]
    pub fn with_pose(self, rotation: Quaternion<f64>, translation: Vector3<f64>) -> Self {
        Self::new(self.intrinsics, rotation, translation, self.bounds)
    }

    #[must_use]
    pub fn with_bounds(self, bounds: ImageBounds) -> Self {
        Self { bounds, ..self }
    }

    pub fn intrinsics(&self) -> CameraIntrinsics {
        self.intrinsics
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        self.rotation
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    /// The composed `3x4` projection matrix `K·[R|t]`.
    pub fn projection(&self) -> Matrix3x4<f64> {
        self.projection
    }

    /// The optical center in world coordinates, `-Rᵀt`.
    pub fn optical_center(&self) -> Point3<f64> {
        Point3::from(-(self.rotation.transpose() * self.translation))
    }

    /// The direction the camera looks at in world coordinates.
    pub fn forward(&self) -> Vector3<f64> {
        self.rotation.transpose() * Vector3::z()
    }
}

impl CameraModel for PinholeCamera {
    /// Projects a world point into pixel coordinates with `P·[x, y, z, 1]ᵀ`.
    ///
    /// Returns `None` if the projected depth is zero or the result is not finite.
    /// Points behind the camera still produce a pixel, as the projection does
    /// not look at the sign of the depth.
    fn project(&self, point: WorldPoint) -> Option<KeyPoint> {
        let image = self.projection * point.homogeneous();
        Point2::from_homogeneous(image)
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(KeyPoint)
    }

    fn bounds(&self) -> ImageBounds {
        self.bounds
    }
}
