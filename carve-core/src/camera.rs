use crate::{ImageBounds, KeyPoint, WorldPoint};

/// Maps points in the world onto the pixels of one image.
pub trait CameraModel {
    /// Projects a world point into pixel coordinates.
    ///
    /// The returned pixel may lie outside of the image, so callers must check it
    /// against [`CameraModel::bounds`] themselves. This is not an error condition.
    ///
    /// Since projection might not be possible (if the point lies on the plane through
    /// the optical center parallel to the image plane for a pinhole camera),
    /// this operation is fallible.
    fn project(&self, point: WorldPoint) -> Option<KeyPoint>;

    /// The size of the image this camera produces.
    fn bounds(&self) -> ImageBounds;
}

impl<C: CameraModel + ?Sized> CameraModel for &C {
    fn project(&self, point: WorldPoint) -> Option<KeyPoint> {
        (**self).project(point)
    }

    fn bounds(&self) -> ImageBounds {
        (**self).bounds()
    }
}
