use crate::{
    BoundingBox, CarvingEngine, CarvingParameters, MarchingTetrahedra, OriginRule, OutOfFrame,
    PlyWriter,
};
use carve_core::nalgebra::Vector3;
use carve_silhouette::{Metric, DEFAULT_THRESHOLD};
use ply_rs::ply::Encoding;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings for the carving process.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CarvingSettings {
    /// The number of voxels along each axis of the grid
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_dimension"))]
    pub dimension: usize,
    /// The lowest corner of the box that contains the subject
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_bounds_min"))]
    pub bounds_min: [f64; 3],
    /// The highest corner of the box that contains the subject
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_bounds_max"))]
    pub bounds_max: [f64; 3],
    /// The fraction of the box size added to the grid along each axis
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_margins"))]
    pub margins: [f64; 3],
    /// Where the first voxel of the grid is placed
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub origin_rule: OriginRule,
    /// The distance a view reports for voxels outside of its image, or none to leave them alone
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_out_of_frame"))]
    pub out_of_frame: Option<f32>,
    /// The metric of the distance transform applied to silhouette boundaries
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub metric: Metric,
    /// The lowest red channel value considered part of the silhouette
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_silhouette_threshold")
    )]
    pub silhouette_threshold: u8,
    /// The level of the carved field at which the surface is extracted
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_iso_value"))]
    pub iso_value: f32,
    /// Carve views into private buffers at the same time instead of one after another
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub buffered: bool,
    /// Write the mesh as binary little endian PLY instead of ASCII
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub binary_ply: bool,
}

impl Default for CarvingSettings {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            bounds_min: default_bounds_min(),
            bounds_max: default_bounds_max(),
            margins: default_margins(),
            origin_rule: OriginRule::default(),
            out_of_frame: default_out_of_frame(),
            metric: Metric::default(),
            silhouette_threshold: default_silhouette_threshold(),
            iso_value: default_iso_value(),
            buffered: false,
            binary_ply: false,
        }
    }
}

impl CarvingSettings {
    pub fn parameters(&self) -> CarvingParameters {
        CarvingParameters {
            bounds: BoundingBox::new(self.bounds_min.into(), self.bounds_max.into()),
            dimension: self.dimension,
            margins: Vector3::from(self.margins),
            origin_rule: self.origin_rule,
        }
    }

    pub fn engine(&self) -> CarvingEngine {
        CarvingEngine::new(
            self.out_of_frame
                .map_or(OutOfFrame::Ignore, OutOfFrame::Constant),
        )
    }

    pub fn extractor(&self) -> MarchingTetrahedra {
        MarchingTetrahedra::new(self.iso_value)
    }

    pub fn writer(&self) -> PlyWriter {
        PlyWriter::new(if self.binary_ply {
            Encoding::BinaryLittleEndian
        } else {
            Encoding::Ascii
        })
    }
}

fn default_dimension() -> usize {
    256
}

fn default_bounds_min() -> [f64; 3] {
    [-2.0; 3]
}

fn default_bounds_max() -> [f64; 3] {
    [2.0; 3]
}

fn default_margins() -> [f64; 3] {
    [0.15, 0.15, 0.05]
}

fn default_out_of_frame() -> Option<f32> {
    OutOfFrame::default().value()
}

fn default_silhouette_threshold() -> u8 {
    DEFAULT_THRESHOLD
}

fn default_iso_value() -> f32 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parameters() {
        let settings = CarvingSettings::default();
        assert_eq!(settings.parameters(), CarvingParameters::default());
        assert_eq!(settings.engine(), CarvingEngine::default());
        assert_eq!(settings.extractor(), MarchingTetrahedra::default());
    }

    #[test]
    fn ignore_out_of_frame() {
        let settings = CarvingSettings {
            out_of_frame: None,
            ..Default::default()
        };
        assert_eq!(settings.engine().out_of_frame, OutOfFrame::Ignore);
    }
}
