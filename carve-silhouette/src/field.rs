use crate::{BinaryMask, DistanceMap, DistanceTransform, Error, Result};
use carve_core::{ImageBounds, ImagePoint};
use log::*;

/// The signed distance to the silhouette boundary of one view.
///
/// Positive values are inside the silhouette, negative values outside, and the magnitude is
/// the distance in pixels to the nearest boundary pixel. The distances are computed once when
/// the field is built and never change afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SilhouetteField {
    mask: BinaryMask,
    distances: DistanceMap,
}

impl SilhouetteField {
    /// Derives the field of a mask by transforming the boundary of its silhouette.
    pub fn build<T>(mask: BinaryMask, transform: &T) -> Self
    where
        T: DistanceTransform + ?Sized,
    {
        let edges = mask.edges();
        trace!("Computed silhouette boundary.");
        let distances = transform.distance_transform(&edges);
        debug!(
            "Built silhouette field of {} x {} pixels with {} foreground pixels",
            mask.width(),
            mask.height(),
            mask.foreground_area()
        );
        Self { mask, distances }
    }

    /// Pairs a mask with a distance map computed elsewhere.
    ///
    /// Fails if the two images do not have the same dimensions.
    pub fn from_parts(mask: BinaryMask, distances: DistanceMap) -> Result<Self> {
        if mask.dimensions() != distances.dimensions() {
            return Err(Error::DimensionMismatch {
                mask: mask.dimensions(),
                distances: distances.dimensions(),
            });
        }
        Ok(Self { mask, distances })
    }

    pub fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    pub fn distances(&self) -> &DistanceMap {
        &self.distances
    }

    pub fn bounds(&self) -> ImageBounds {
        self.mask.bounds()
    }

    /// Retrieves the signed distance at a pixel.
    ///
    /// Returns `None` if the pixel is outside of the mask.
    pub fn query(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.mask.width() || y >= self.mask.height() {
            return None;
        }
        let distance = self.distances.get(x, y);
        Some(if self.mask.is_foreground(x, y) {
            distance
        } else {
            -distance
        })
    }

    /// Retrieves the signed distance at the pixel containing an image point.
    pub fn query_point<P: ImagePoint>(&self, point: &P) -> Option<f32> {
        let (x, y) = self.bounds().pixel(point)?;
        self.query(x, y)
    }
}
