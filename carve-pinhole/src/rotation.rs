use carve_core::nalgebra::{Matrix3, Quaternion};

/// Converts a quaternion `(w, i, j, k)` into a rotation matrix.
///
/// The quaternion is not normalized first. Poses coming from a reconstruction are
/// already unit quaternions, and anything else silently produces a matrix that is
/// not orthonormal, which is the caller's responsibility.
///
/// ```
/// use carve_pinhole::quaternion_rotation;
/// use carve_core::nalgebra::{Matrix3, Quaternion};
/// let rotation = quaternion_rotation(Quaternion::new(1.0, 0.0, 0.0, 0.0));
/// assert_eq!(rotation, Matrix3::identity());
/// ```
#[rustfmt::skip]
pub fn quaternion_rotation(q: Quaternion<f64>) -> Matrix3<f64> {
    let (qw, qx, qy, qz) = (q.w, q.i, q.j, q.k);
    Matrix3::new(
        1.0 - 2.0 * qy * qy - 2.0 * qz * qz, 2.0 * qx * qy - 2.0 * qz * qw,       2.0 * qx * qz + 2.0 * qy * qw,
        2.0 * qx * qy + 2.0 * qz * qw,       1.0 - 2.0 * qx * qx - 2.0 * qz * qz, 2.0 * qy * qz - 2.0 * qx * qw,
        2.0 * qx * qz - 2.0 * qy * qw,       2.0 * qy * qz + 2.0 * qx * qw,       1.0 - 2.0 * qx * qx - 2.0 * qy * qy,
    )
}

/// Checks that `RᵀR = I` within `epsilon` for every entry.
pub fn is_orthonormal(rotation: &Matrix3<f64>, epsilon: f64) -> bool {
    (rotation.transpose() * rotation - Matrix3::identity())
        .iter()
        .all(|e| e.abs() <= epsilon)
}
