use crate::{Error, GridGeometry, Result, VoxelGrid};
use carve_core::nalgebra::{Point3, Vector3};
use carve_core::TriangleMesh;
use log::*;
use ply_rs::{
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::collections::HashMap;
use std::io::Write;

/// Extracts the surface where a scalar field crosses a level.
pub trait IsoSurfaceExtractor {
    fn extract(&self, grid: &VoxelGrid) -> TriangleMesh;
}

/// Writes meshes into a byte stream.
pub trait MeshWriter {
    fn write_mesh<W: Write>(&self, mesh: &TriangleMesh, out: W) -> Result<()>;
}

/// The corner offsets of a grid cell. Bit 0 steps along `i`, bit 1 along `j`, and bit 2 along `k`.
const CORNERS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (0, 1, 0),
    (1, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (0, 1, 1),
    (1, 1, 1),
];

/// The six tetrahedra around the main diagonal from corner `0` to corner `7`.
///
/// Every cell is split the same way, so the faces of neighboring cells line up.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 3, 2, 7],
    [0, 2, 6, 7],
    [0, 6, 4, 7],
    [0, 4, 5, 7],
    [0, 5, 1, 7],
];

/// Marching tetrahedra.
///
/// Values above `iso` are inside of the surface. The triangles are wound so that their normals
/// point out of the surface, towards the lower values. Vertices that land on the same grid edge
/// are shared between all the triangles that use them, and so are vertices that land exactly on a
/// grid sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarchingTetrahedra {
    pub iso: f32,
}

impl MarchingTetrahedra {
    pub fn new(iso: f32) -> Self {
        Self { iso }
    }
}

impl Default for MarchingTetrahedra {
    fn default() -> Self {
        Self::new(0.5)
    }
}

/// A grid sample that is a corner of a tetrahedron.
#[derive(Copy, Clone)]
struct Sample {
    index: usize,
    value: f32,
    position: Point3<f64>,
}

/// Identifies a mesh vertex by where it lies on the grid.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
enum VertexKey {
    /// The crossing is exactly on a sample.
    Sample(usize),
    /// The crossing is strictly between two samples, stored with the smaller index first.
    Edge(usize, usize),
}

struct MeshBuilder {
    geometry: GridGeometry,
    iso: f32,
    mesh: TriangleMesh,
    vertices: HashMap<VertexKey, u32>,
    degenerate: usize,
}

impl MeshBuilder {
    fn new(geometry: GridGeometry, iso: f32) -> Self {
        Self {
            geometry,
            iso,
            mesh: TriangleMesh::new(),
            vertices: HashMap::new(),
            degenerate: 0,
        }
    }

    fn sample(&self, grid: &VoxelGrid, (i, j, k): (usize, usize, usize)) -> Sample {
        Sample {
            index: self.geometry.index(i, j, k),
            value: grid.get(i, j, k),
            position: self.geometry.center(i, j, k).0,
        }
    }

    /// The vertex where the surface crosses the edge from `below` to `above`.
    fn crossing(&mut self, below: Sample, above: Sample) -> (u32, Point3<f64>) {
        let (key, position) = if below.value == self.iso {
            (VertexKey::Sample(below.index), below.position)
        } else if above.value == self.iso {
            (VertexKey::Sample(above.index), above.position)
        } else {
            let t = f64::from((self.iso - below.value) / (above.value - below.value));
            let key = VertexKey::Edge(below.index.min(above.index), below.index.max(above.index));
            (key, below.position + (above.position - below.position) * t)
        };
        let mesh = &mut self.mesh;
        let index = *self
            .vertices
            .entry(key)
            .or_insert_with(|| mesh.push_vertex(position.cast()));
        (index, position)
    }

    /// Adds a triangle wound so that its normal points away from `towards_above`.
    fn triangle(&mut self, corners: [(u32, Point3<f64>); 3], towards_above: Vector3<f64>) {
        let [(a, pa), (b, pb), (c, pc)] = corners;
        let normal = (pb - pa).cross(&(pc - pa));
        let facing = normal.dot(&towards_above);
        if facing == 0.0 || !facing.is_finite() {
            self.degenerate += 1;
            return;
        }
        if facing < 0.0 {
            self.mesh.faces.push([a, b, c]);
        } else {
            self.mesh.faces.push([a, c, b]);
        }
    }

    fn tetrahedron(&mut self, samples: [Sample; 4]) {
        let mut above = [samples[0]; 4];
        let mut below = [samples[0]; 4];
        let (mut above_len, mut below_len) = (0, 0);
        for sample in samples {
            if sample.value > self.iso {
                above[above_len] = sample;
                above_len += 1;
            } else {
                below[below_len] = sample;
                below_len += 1;
            }
        }
        let (above, below) = (&above[..above_len], &below[..below_len]);
        let centroid = |samples: &[Sample]| {
            samples.iter().map(|s| s.position.coords).sum::<Vector3<f64>>() / samples.len() as f64
        };
        match (above.len(), below.len()) {
            (1, 3) | (3, 1) => {
                let towards_above = centroid(above) - centroid(below);
                let corners = if above.len() == 1 {
                    [0, 1, 2].map(|n| self.crossing(below[n], above[0]))
                } else {
                    [0, 1, 2].map(|n| self.crossing(below[0], above[n]))
                };
                self.triangle(corners, towards_above);
            }
            (2, 2) => {
                let towards_above = centroid(above) - centroid(below);
                // The crossings form a quad in the cycle a0-b0, a0-b1, a1-b1, a1-b0.
                let quad = [
                    self.crossing(below[0], above[0]),
                    self.crossing(below[1], above[0]),
                    self.crossing(below[1], above[1]),
                    self.crossing(below[0], above[1]),
                ];
                self.triangle([quad[0], quad[1], quad[2]], towards_above);
                self.triangle([quad[0], quad[2], quad[3]], towards_above);
            }
            _ => {}
        }
    }
}

impl IsoSurfaceExtractor for MarchingTetrahedra {
    fn extract(&self, grid: &VoxelGrid) -> TriangleMesh {
        let geometry = grid.geometry();
        let cells = geometry.dimension().saturating_sub(1);
        let mut builder = MeshBuilder::new(geometry, self.iso);
        for i in 0..cells {
            for j in 0..cells {
                for k in 0..cells {
                    let corners = CORNERS.map(|(di, dj, dk)| {
                        builder.sample(grid, (i + di, j + dj, k + dk))
                    });
                    for tetrahedron in TETRAHEDRA {
                        builder.tetrahedron(tetrahedron.map(|c| corners[c]));
                    }
                }
            }
        }
        if builder.degenerate != 0 {
            debug!("skipped {} degenerate triangles", builder.degenerate);
        }
        info!(
            "extracted surface with {} vertices and {} triangles",
            builder.mesh.vertices.len(),
            builder.mesh.faces.len()
        );
        builder.mesh
    }
}

/// Writes meshes as PLY files with `vertex` and `face` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlyWriter {
    pub encoding: Encoding,
}

impl PlyWriter {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }
}

impl Default for PlyWriter {
    fn default() -> Self {
        Self::new(Encoding::Ascii)
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<W: Write>(&self, mesh: &TriangleMesh, mut out: W) -> Result<()> {
        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = self.encoding;
        ply.header
            .comments
            .push("Carved from silhouettes by carve-sfs".to_string());

        let mut vertex_element = ElementDef::new("vertex".to_string());
        for axis in ["x", "y", "z"] {
            let p = PropertyDef::new(axis.to_string(), PropertyType::Scalar(ScalarType::Float));
            vertex_element.properties.add(p);
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        let vertex_list = PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        );
        face_element.properties.add(vertex_list);
        ply.header.elements.add(face_element);

        let vertices = mesh
            .vertices
            .iter()
            .map(|v| {
                let mut vertex = DefaultElement::new();
                vertex.insert("x".to_string(), Property::Float(v.x));
                vertex.insert("y".to_string(), Property::Float(v.y));
                vertex.insert("z".to_string(), Property::Float(v.z));
                vertex
            })
            .collect();
        let faces = mesh
            .faces
            .iter()
            .map(|f| {
                let mut face = DefaultElement::new();
                face.insert(
                    "vertex_indices".to_string(),
                    Property::ListInt(f.iter().map(|&v| v as i32).collect()),
                );
                face
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);
        ply.payload.insert("face".to_string(), faces);

        Writer::new().write_ply(&mut out, &mut ply)?;
        out.flush()?;
        Ok(())
    }
}

/// Extracts the surface of a carved grid and writes it out.
///
/// Fails with [`Error::EmptySurface`] if the surface has no triangles, which happens for example
/// when nothing was carved.
pub fn export_surface<E, M, W>(
    grid: &VoxelGrid,
    extractor: &E,
    writer: &M,
    out: W,
) -> Result<TriangleMesh>
where
    E: IsoSurfaceExtractor + ?Sized,
    M: MeshWriter + ?Sized,
    W: Write,
{
    let mesh = extractor.extract(grid);
    if mesh.is_empty() {
        warn!("the carved grid has no surface to export");
        return Err(Error::EmptySurface);
    }
    writer.write_mesh(&mesh, out)?;
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SENTINEL;

    fn single_cell(values: [f32; 8]) -> VoxelGrid {
        let mut grid = VoxelGrid::from_geometry(GridGeometry::new(
            2,
            Point3::origin(),
            Vector3::repeat(1.0),
        ));
        for (c, &(i, j, k)) in CORNERS.iter().enumerate() {
            grid.fuse(i, j, k, values[c]);
        }
        grid
    }

    #[test]
    fn uniform_field_has_no_surface() {
        let mesh = MarchingTetrahedra::default().extract(&single_cell([SENTINEL; 8]));
        assert!(mesh.is_empty());
        let mesh = MarchingTetrahedra::default().extract(&single_cell([-1.0; 8]));
        assert!(mesh.is_empty());
    }

    #[test]
    fn single_corner() {
        let mut values = [-1.0; 8];
        values[0] = 2.0;
        let mesh = MarchingTetrahedra::default().extract(&single_cell(values));
        // Corner 0 belongs to every tetrahedron, so each one cuts a triangle off of it,
        // sharing the seven edges that leave corner 0.
        assert_eq!(mesh.faces.len(), 6);
        assert_eq!(mesh.vertices.len(), 7);
        for face in 0..mesh.faces.len() {
            // Normals point away from the inside corner at the origin.
            let [a, _, _] = mesh.faces[face];
            let normal = mesh.face_normal(face);
            assert!(normal.dot(&mesh.vertices[a as usize].coords) > 0.0);
        }
    }

    #[test]
    fn shared_edges_are_merged() {
        let mut values = [-1.0; 8];
        values[0] = 2.0;
        values[1] = 2.0;
        let mesh = MarchingTetrahedra::default().extract(&single_cell(values));
        let mut unique = mesh.vertices.clone();
        unique.sort_by(|a, b| a.coords.as_slice().partial_cmp(b.coords.as_slice()).unwrap());
        unique.dedup();
        assert_eq!(unique.len(), mesh.vertices.len());
    }

    #[test]
    fn samples_on_the_level_are_shared() {
        let mut grid = VoxelGrid::from_geometry(GridGeometry::new(
            4,
            Point3::origin(),
            Vector3::repeat(1.0),
        ));
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    grid.fuse(i, j, k, 1.0 - i as f32);
                }
            }
        }
        let mesh = MarchingTetrahedra::new(0.0).extract(&grid);
        assert!(!mesh.is_empty());
        // The surface is the plane of samples at i = 1, and every one of them is a vertex once.
        assert_eq!(mesh.vertices.len(), 16);
        assert!(mesh.vertices.iter().all(|v| v.x == 1.0));
        for face in &mesh.faces {
            assert!(face[0] != face[1] && face[1] != face[2] && face[0] != face[2]);
        }
    }
}
