use derive_more::{Deref, DerefMut};
use image::{GrayImage, ImageBuffer, Luma};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

type GrayFloatBuffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Per-pixel distance to the nearest edge pixel.
///
/// Values are never negative. The sign is applied by [`SilhouetteField`](crate::SilhouetteField).
#[derive(Debug, Clone, PartialEq, Deref, DerefMut)]
pub struct DistanceMap(pub GrayFloatBuffer);

impl DistanceMap {
    pub fn from_fn(width: u32, height: u32, distance: impl Fn(u32, u32) -> f32) -> Self {
        Self(ImageBuffer::from_fn(width, height, |x, y| {
            Luma([distance(x, y)])
        }))
    }

    /// Creates a distance map with the same distance everywhere.
    pub fn constant(width: u32, height: u32, distance: f32) -> Self {
        Self(ImageBuffer::from_pixel(width, height, Luma([distance])))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Panics if the pixel is out of bounds.
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.get_pixel(x, y)[0]
    }

    /// The distance used when an image has no edge at all: the length of the image diagonal,
    /// which no real distance inside the image exceeds.
    pub fn cap(width: u32, height: u32) -> f32 {
        (width as f32).hypot(height as f32)
    }
}

/// Computes, for every pixel, the distance to the nearest non-zero pixel of `edges`.
///
/// Implementations must be deterministic. When `edges` has no non-zero pixel, every
/// distance is [`DistanceMap::cap`].
pub trait DistanceTransform {
    fn distance_transform(&self, edges: &GrayImage) -> DistanceMap;
}

impl<T: DistanceTransform + ?Sized> DistanceTransform for &T {
    fn distance_transform(&self, edges: &GrayImage) -> DistanceMap {
        (**self).distance_transform(edges)
    }
}

/// Exact Euclidean distance transform.
///
/// This uses the separable lower envelope of parabolas from Felzenszwalb and Huttenlocher,
/// "Distance Transforms of Sampled Functions" (2012), which runs in linear time by first
/// transforming every column and then every row of the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactEuclidean;

/// A squared distance that is larger than anything inside an image, but still finite so
/// that the parabola intersections stay well defined.
const FAR: f64 = 1e20;

impl DistanceTransform for ExactEuclidean {
    fn distance_transform(&self, edges: &GrayImage) -> DistanceMap {
        let (width, height) = edges.dimensions();
        let (w, h) = (width as usize, height as usize);
        let mut squared: Vec<f64> = edges
            .pixels()
            .map(|p| if p[0] != 0 { 0.0 } else { FAR })
            .collect();

        let longest = w.max(h);
        let mut input = vec![0.0; longest];
        let mut output = vec![0.0; longest];
        let mut envelope = LowerEnvelope::new(longest);

        for x in 0..w {
            for y in 0..h {
                input[y] = squared[y * w + x];
            }
            envelope.transform(&input[..h], &mut output[..h]);
            for y in 0..h {
                squared[y * w + x] = output[y];
            }
        }
        for row in squared.chunks_exact_mut(w.max(1)) {
            input[..w].copy_from_slice(row);
            envelope.transform(&input[..w], row);
        }

        let cap = DistanceMap::cap(width, height);
        DistanceMap::from_fn(width, height, |x, y| {
            (squared[y as usize * w + x as usize].sqrt() as f32).min(cap)
        })
    }
}

/// Scratch space for the one dimensional squared distance transform.
struct LowerEnvelope {
    /// Locations of the parabolas in the envelope.
    vertices: Vec<usize>,
    /// Boundaries between consecutive parabolas.
    boundaries: Vec<f64>,
}

impl LowerEnvelope {
    fn new(len: usize) -> Self {
        Self {
            vertices: vec![0; len],
            boundaries: vec![0.0; len + 1],
        }
    }

    /// Computes `output[q] = min_p (q - p)² + input[p]`.
    fn transform(&mut self, input: &[f64], output: &mut [f64]) {
        let n = input.len();
        if n == 0 {
            return;
        }
        let intersection = |q: usize, p: usize| {
            let (qf, pf) = (q as f64, p as f64);
            ((input[q] + qf * qf) - (input[p] + pf * pf)) / (2.0 * (qf - pf))
        };

        let v = &mut self.vertices;
        let z = &mut self.boundaries;
        let mut k = 0;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;
        for q in 1..n {
            let mut s = intersection(q, v[k]);
            while s <= z[k] {
                k -= 1;
                s = intersection(q, v[k]);
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for (q, out) in output.iter_mut().enumerate() {
            while z[k + 1] < q as f64 {
                k += 1;
            }
            let d = q as f64 - v[k] as f64;
            *out = d * d + input[v[k]];
        }
    }
}

/// Two pass 3x3 chamfer distance transform.
///
/// Distances are propagated from each pixel to its eight neighbours, costing `axial` for
/// horizontal and vertical steps and `diagonal` for diagonal steps. This approximates the
/// Euclidean distance and is what most image libraries use for a 3x3 mask.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Chamfer {
    pub axial: f32,
    pub diagonal: f32,
}

impl Chamfer {
    /// The weights OpenCV uses for `DIST_L2` with a 3x3 mask.
    pub fn l2() -> Self {
        Self {
            axial: 0.955,
            diagonal: 1.3693,
        }
    }

    /// Taxicab distance, where diagonal steps cost two axial steps.
    pub fn city_block() -> Self {
        Self {
            axial: 1.0,
            diagonal: 2.0,
        }
    }

    /// Chessboard distance, where diagonal steps cost the same as axial steps.
    pub fn chessboard() -> Self {
        Self {
            axial: 1.0,
            diagonal: 1.0,
        }
    }
}

impl Default for Chamfer {
    fn default() -> Self {
        Self::l2()
    }
}

impl DistanceTransform for Chamfer {
    fn distance_transform(&self, edges: &GrayImage) -> DistanceMap {
        let (width, height) = edges.dimensions();
        let (w, h) = (width as i64, height as i64);
        let cap = DistanceMap::cap(width, height);
        let mut d: Vec<f32> = edges
            .pixels()
            .map(|p| if p[0] != 0 { 0.0 } else { cap })
            .collect();
        let index = |x: i64, y: i64| (y * w + x) as usize;

        let forward = [
            (-1, 0, self.axial),
            (-1, -1, self.diagonal),
            (0, -1, self.axial),
            (1, -1, self.diagonal),
        ];
        for y in 0..h {
            for x in 0..w {
                let mut best = d[index(x, y)];
                for &(dx, dy, cost) in &forward {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && ny >= 0 && nx < w {
                        best = best.min(d[index(nx, ny)] + cost);
                    }
                }
                d[index(x, y)] = best;
            }
        }

        let backward = forward.map(|(dx, dy, cost)| (-dx, -dy, cost));
        for y in (0..h).rev() {
            for x in (0..w).rev() {
                let mut best = d[index(x, y)];
                for &(dx, dy, cost) in &backward {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx >= 0 && nx < w && ny < h {
                        best = best.min(d[index(nx, ny)] + cost);
                    }
                }
                d[index(x, y)] = best;
            }
        }

        DistanceMap::from_fn(width, height, |x, y| d[index(x as i64, y as i64)])
    }
}

/// Selects one of the distance transforms of this crate, for use in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
pub enum Metric {
    #[default]
    Euclidean,
    ChamferL2,
    CityBlock,
    Chessboard,
}

impl DistanceTransform for Metric {
    fn distance_transform(&self, edges: &GrayImage) -> DistanceMap {
        match self {
            Metric::Euclidean => ExactEuclidean.distance_transform(edges),
            Metric::ChamferL2 => Chamfer::l2().distance_transform(edges),
            Metric::CityBlock => Chamfer::city_block().distance_transform(edges),
            Metric::Chessboard => Chamfer::chessboard().distance_transform(edges),
        }
    }
}
