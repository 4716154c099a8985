//! Silhouettes and the per-view signed distance fields derived from them.
//!
//! A [`BinaryMask`] marks the subject in one image with `255` and the background with `0`.
//! From the mask, [`SilhouetteField::build`] derives the boundary of the silhouette and runs a
//! [`DistanceTransform`] over it, so that every pixel knows how far it is from the boundary.
//! The sign of a query then tells inside from outside:
//!
//! ```
//! use carve_silhouette::{BinaryMask, ExactEuclidean, SilhouetteField};
//! // A 9x9 image with a filled 5x5 square in the middle.
//! let mask = BinaryMask::from_fn(9, 9, |x, y| (2..7).contains(&x) && (2..7).contains(&y));
//! let field = SilhouetteField::build(mask, &ExactEuclidean);
//! assert_eq!(field.query(4, 4), Some(2.0));
//! assert_eq!(field.query(2, 4), Some(0.0));
//! assert_eq!(field.query(0, 4), Some(-2.0));
//! assert_eq!(field.query(9, 4), None);
//! ```

mod distance;
mod field;
mod mask;

pub use distance::*;
pub use field::*;
pub use mask::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("mask is {mask:?} pixels but distance map is {distances:?} pixels")]
    DimensionMismatch {
        mask: (u32, u32),
        distances: (u32, u32),
    },
}

pub type Result<T> = std::result::Result<T, Error>;
