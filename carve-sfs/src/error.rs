use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read image: {0}")]
    Image(#[from] image::ImageError),
    #[error("{}:{line}: {reason}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error(transparent)]
    DimensionMismatch(#[from] carve_silhouette::Error),
    #[error("a grid of {expected} voxels cannot hold {found} values")]
    GridSize { expected: usize, found: usize },
    #[error("the carved field has no surface at the iso value")]
    EmptySurface,
}

pub type Result<T> = std::result::Result<T, Error>;
