use crate::ImagePoint;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The size of an image in pixels.
///
/// Every camera carries its own bounds so that views of different resolutions
/// can be carved together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Checks if the point lies inside `[0, width) × [0, height)`.
    pub fn contains<P: ImagePoint>(&self, point: &P) -> bool {
        let p = point.image_point();
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width as f64 && p.y < self.height as f64
    }

    /// Retrieves the column and row of the pixel that contains the point.
    ///
    /// Returns `None` if the point is outside of the image or not finite.
    ///
    /// ```
    /// use carve_core::{ImageBounds, KeyPoint};
    /// use carve_core::nalgebra::Point2;
    /// let bounds = ImageBounds::new(4, 3);
    /// assert_eq!(bounds.pixel(&KeyPoint(Point2::new(0.0, 2.9))), Some((0, 2)));
    /// assert_eq!(bounds.pixel(&KeyPoint(Point2::new(4.0, 0.0))), None);
    /// assert_eq!(bounds.pixel(&KeyPoint(Point2::new(-0.1, 1.0))), None);
    /// ```
    pub fn pixel<P: ImagePoint>(&self, point: &P) -> Option<(u32, u32)> {
        if self.contains(point) {
            let p = point.image_point();
            // Both coordinates are non-negative here, so truncation is a floor.
            Some((p.x as u32, p.y as u32))
        } else {
            None
        }
    }

    /// The number of pixels in the image.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The length of the image diagonal in pixels.
    pub fn diagonal(&self) -> f64 {
        (self.width as f64).hypot(self.height as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPoint;
    use nalgebra::Point2;

    #[test]
    fn rejects_nan() {
        let bounds = ImageBounds::new(8, 8);
        assert!(!bounds.contains(&KeyPoint(Point2::new(f64::NAN, 1.0))));
        assert_eq!(bounds.pixel(&KeyPoint(Point2::new(1.0, f64::INFINITY))), None);
    }

    #[test]
    fn diagonal() {
        assert_eq!(ImageBounds::new(3, 4).diagonal(), 5.0);
        assert_eq!(ImageBounds::new(3, 4).area(), 12);
    }
}
