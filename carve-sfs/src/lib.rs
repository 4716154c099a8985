//! Shape from silhouette by space carving.
//!
//! The pipeline has three stages:
//!
//! 1. [`SceneLoader`] reads calibrated cameras and their silhouettes, and builds a
//!    [`SilhouetteField`](carve_silhouette::SilhouetteField) for every view.
//! 2. [`CarvingEngine`] projects every voxel of a [`VoxelGrid`] into every view and keeps the
//!    lowest signed distance to a silhouette boundary that any view reports. Voxels with a
//!    positive value are inside of every silhouette.
//! 3. [`export_surface`] extracts the surface of the carved grid with an
//!    [`IsoSurfaceExtractor`] and writes it with a [`MeshWriter`].
//!
//! [`CarvingSettings`] collects the tunable parts of all three stages.

mod carve;
mod error;
mod export;
mod grid;
mod scene;
mod settings;

pub use carve::*;
pub use error::*;
pub use export::*;
pub use grid::*;
pub use scene::*;
pub use settings::*;
