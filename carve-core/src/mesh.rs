use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Faces index into `vertices` and are wound counter-clockwise when seen from the
/// side their normal points to.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct TriangleMesh {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<[u32; 3]>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn push_vertex(&mut self, vertex: Point3<f32>) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(vertex);
        index
    }

    /// The unnormalized normal of a face, with a length of twice its area.
    pub fn face_normal(&self, face: usize) -> Vector3<f32> {
        let [a, b, c] = self.faces[face].map(|v| self.vertices[v as usize]);
        (b - a).cross(&(c - a))
    }

    /// The total surface area of the mesh.
    pub fn area(&self) -> f32 {
        (0..self.faces.len())
            .map(|face| self.face_normal(face).norm() * 0.5)
            .sum()
    }

    /// The minimum and maximum corners of the axis aligned box around all vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(min, max), v| {
            (min.inf(v), max.sup(v))
        }))
    }
}
