use carve_core::ImageBounds;
use derive_more::{Deref, DerefMut};
use image::{DynamicImage, GrayImage, Luma};
use log::*;

/// The value of foreground pixels in a mask.
pub const FOREGROUND: u8 = 255;
/// The value of background pixels in a mask.
pub const BACKGROUND: u8 = 0;

/// The default red channel threshold used by [`BinaryMask::from_dynamic`].
pub const DEFAULT_THRESHOLD: u8 = 20;

/// A binarized silhouette where the subject is [`FOREGROUND`] and everything else is [`BACKGROUND`].
///
/// Every pixel is exactly one of the two values. Constructors enforce this, but the
/// inner buffer is public through `DerefMut`, in which case any non-zero value is
/// treated as foreground.
#[derive(Debug, Clone, PartialEq, Eq, Deref, DerefMut)]
pub struct BinaryMask(pub GrayImage);

impl BinaryMask {
    /// Binarizes an image by its red channel.
    ///
    /// Pixels whose red channel is at least `threshold` become foreground. Silhouettes
    /// produced by segmentation tools are usually painted red (or white) on black, and
    /// a small threshold keeps compression noise in the background.
    ///
    /// # Arguments
    /// * `input_image` - the silhouette image, in any color type.
    /// * `threshold` - the smallest red value considered foreground.
    pub fn from_dynamic(input_image: &DynamicImage, threshold: u8) -> Self {
        let rgb = input_image.to_rgb8();
        info!(
            "Loaded a {} x {} silhouette image",
            rgb.width(),
            rgb.height()
        );
        let red = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
            Luma([rgb.get_pixel(x, y)[0]])
        });
        if threshold == 0 {
            return Self(GrayImage::from_pixel(
                red.width(),
                red.height(),
                Luma([FOREGROUND]),
            ));
        }
        // `threshold` keeps values strictly above its argument.
        Self(imageproc::contrast::threshold(&red, threshold - 1))
    }

    /// Creates a mask where `foreground(x, y)` decides each pixel.
    pub fn from_fn(width: u32, height: u32, foreground: impl Fn(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([if foreground(x, y) {
                FOREGROUND
            } else {
                BACKGROUND
            }])
        }))
    }

    /// Creates a mask of a single value.
    pub fn filled(width: u32, height: u32, foreground: bool) -> Self {
        Self::from_fn(width, height, |_, _| foreground)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn bounds(&self) -> ImageBounds {
        ImageBounds::new(self.width(), self.height())
    }

    /// Panics if the pixel is out of bounds.
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.get_pixel(x, y)[0] != BACKGROUND
    }

    /// Counts the foreground pixels.
    pub fn foreground_area(&self) -> usize {
        self.pixels().filter(|p| p[0] != BACKGROUND).count()
    }

    /// Computes the boundary of the silhouette.
    ///
    /// A pixel is on the boundary if it is foreground and at least one of its four
    /// neighbours is background. Pixels past the image border are not neighbours, so a
    /// silhouette that touches the border is open there. The result is `255` on the
    /// boundary and `0` elsewhere.
    pub fn edges(&self) -> GrayImage {
        let (width, height) = self.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let on_edge = self.is_foreground(x, y)
                && [(-1, 0), (1, 0), (0, -1), (0, 1)].iter().any(|&(dx, dy)| {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    nx >= 0
                        && ny >= 0
                        && nx < width as i64
                        && ny < height as i64
                        && !self.is_foreground(nx as u32, ny as u32)
                });
            Luma([if on_edge { FOREGROUND } else { BACKGROUND }])
        })
    }
}
