//! Loading of calibrated scenes in the COLMAP text format.
//!
//! A scene folder contains:
//!
//! - `cameras.txt` with one `CAMERA_ID MODEL WIDTH HEIGHT PARAMS[]` record per line,
//! - `images.txt` with one `IMAGE_ID QW QX QY QZ TX TY TZ CAMERA_ID NAME` record per image,
//!   each followed by a line of 2D points that is ignored here,
//! - `sil/NAME`, the silhouette of every image.

use crate::{Error, Observation, Result};
use carve_core::nalgebra::{Point2, Quaternion, Vector2, Vector3};
use carve_core::ImageBounds;
use carve_pinhole::{CameraIntrinsics, PinholeCamera};
use carve_silhouette::{
    BinaryMask, DistanceMap, DistanceTransform, Metric, SilhouetteField, DEFAULT_THRESHOLD,
};
use log::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// The intrinsics and image size of one camera in `cameras.txt`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRecord {
    pub id: u32,
    pub bounds: ImageBounds,
    pub intrinsics: CameraIntrinsics,
}

/// The pose of one image in `images.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    pub id: u32,
    /// The world to camera rotation as `(w, i, j, k)`.
    pub rotation: Quaternion<f64>,
    /// The world to camera translation.
    pub translation: Vector3<f64>,
    pub camera_id: u32,
    pub name: String,
}

/// One fully loaded view of a scene.
#[derive(Debug, Clone)]
pub struct SceneView {
    pub name: String,
    pub camera: PinholeCamera,
    pub field: SilhouetteField,
}

impl SceneView {
    /// Creates a view from a distance map that was computed elsewhere.
    pub fn from_parts(
        name: impl Into<String>,
        camera: PinholeCamera,
        mask: BinaryMask,
        distances: DistanceMap,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            camera,
            field: SilhouetteField::from_parts(mask, distances)?,
        })
    }
}

impl Observation for SceneView {
    type Camera = PinholeCamera;

    fn camera(&self) -> &PinholeCamera {
        &self.camera
    }

    fn field(&self) -> &SilhouetteField {
        &self.field
    }
}

fn numbers(tokens: &[&str]) -> std::result::Result<Vec<f64>, String> {
    tokens
        .iter()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| format!("expected a number, found {:?}", token))
        })
        .collect()
}

fn id(token: &str) -> std::result::Result<u32, String> {
    token
        .parse()
        .map_err(|_| format!("expected an id, found {:?}", token))
}

/// Parses one line of `cameras.txt`.
///
/// Returns `Ok(None)` for comments and blank lines.
pub fn parse_camera(line: &str) -> std::result::Result<Option<CameraRecord>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() || tokens[0].starts_with('#') {
        return Ok(None);
    }
    if tokens.len() < 2 {
        return Err("missing image size".to_string());
    }
    let (model, rest) = if tokens[1].parse::<f64>().is_ok() {
        // The model is omitted, which implies a single focal length.
        ("SIMPLE_PINHOLE", &tokens[1..])
    } else {
        (tokens[1], &tokens[2..])
    };
    let values = numbers(rest)?;
    let (width, height, params) = match values.as_slice() {
        [width, height, params @ ..] => (*width, *height, params),
        _ => return Err("missing image size".to_string()),
    };
    if width < 1.0 || height < 1.0 || width.fract() != 0.0 || height.fract() != 0.0 {
        return Err(format!("invalid image size {} x {}", width, height));
    }
    let intrinsics = match (model, params) {
        ("SIMPLE_PINHOLE" | "SIMPLE_RADIAL" | "RADIAL", [f, cx, cy, ..]) => {
            CameraIntrinsics::simple(*f, Point2::new(*cx, *cy))
        }
        ("PINHOLE", [fx, fy, cx, cy, ..]) => CameraIntrinsics::identity()
            .focals(Vector2::new(*fx, *fy))
            .principal_point(Point2::new(*cx, *cy)),
        ("SIMPLE_PINHOLE" | "SIMPLE_RADIAL" | "RADIAL" | "PINHOLE", _) => {
            return Err(format!("too few parameters for model {}", model))
        }
        _ => return Err(format!("unsupported camera model {}", model)),
    };
    if model.ends_with("RADIAL") {
        debug!("ignoring the radial distortion of camera {}", tokens[0]);
    }
    Ok(Some(CameraRecord {
        id: id(tokens[0])?,
        bounds: ImageBounds::new(width as u32, height as u32),
        intrinsics,
    }))
}

/// Parses one line of `images.txt`.
///
/// Returns `Ok(None)` for comments, blank lines, and the lines of 2D points that follow
/// every image record.
pub fn parse_image(line: &str) -> std::result::Result<Option<ImageRecord>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() || tokens[0].starts_with('#') {
        return Ok(None);
    }
    let values = numbers(&tokens[..tokens.len().min(9)])?;
    match tokens.get(9) {
        // Point lines only have numbers.
        None => return Ok(None),
        Some(name) if name.parse::<f64>().is_ok() => return Ok(None),
        Some(_) => {}
    }
    let name = tokens[9..].join(" ");
    Ok(Some(ImageRecord {
        id: id(tokens[0])?,
        rotation: Quaternion::new(values[1], values[2], values[3], values[4]),
        translation: Vector3::new(values[5], values[6], values[7]),
        camera_id: id(tokens[8])?,
        name,
    }))
}

/// Parses every line of a reader, skipping the lines that do not parse with a warning.
///
/// Bytes that are not UTF-8 are replaced rather than failing the whole file.
fn read_records<T, R: BufRead>(
    reader: R,
    path: &Path,
    parse: impl Fn(&str) -> std::result::Result<Option<T>, String>,
) -> Result<Vec<T>> {
    let mut records = vec![];
    for (ix, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = String::from_utf8_lossy(&line);
        match parse(line.strip_suffix('\r').unwrap_or(&line)) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(reason) => {
                let error = Error::Parse {
                    path: path.to_path_buf(),
                    line: ix + 1,
                    reason,
                };
                warn!("skipping record: {}", error);
            }
        }
    }
    Ok(records)
}

/// Reads `cameras.txt` into a map from camera id to camera.
pub fn read_cameras<R: BufRead>(reader: R, path: &Path) -> Result<HashMap<u32, CameraRecord>> {
    let mut cameras = HashMap::new();
    for camera in read_records(reader, path, parse_camera)? {
        if cameras.insert(camera.id, camera).is_some() {
            warn!("camera {} is defined more than once, using the last one", camera.id);
        }
    }
    Ok(cameras)
}

/// Reads `images.txt` in file order.
pub fn read_images<R: BufRead>(reader: R, path: &Path) -> Result<Vec<ImageRecord>> {
    read_records(reader, path, parse_image)
}

/// Loads a silhouette image and binarizes it by its red channel.
pub fn load_silhouette(path: &Path, threshold: u8) -> Result<BinaryMask> {
    let image = image::open(path)?;
    Ok(BinaryMask::from_dynamic(&image, threshold))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Loads the views of a scene folder.
#[derive(Debug, Clone)]
pub struct SceneLoader<T = Metric> {
    folder: PathBuf,
    threshold: u8,
    max_views: Option<usize>,
    transform: T,
}

impl SceneLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            threshold: DEFAULT_THRESHOLD,
            max_views: None,
            transform: Metric::default(),
        }
    }
}

impl<T> SceneLoader<T>
where
    T: DistanceTransform + Sync,
{
    /// Sets the lowest red channel value considered part of a silhouette.
    pub fn threshold(self, threshold: u8) -> Self {
        Self { threshold, ..self }
    }

    /// Only considers the first `max_views` image records, if set.
    pub fn max_views(self, max_views: Option<usize>) -> Self {
        Self { max_views, ..self }
    }

    /// Uses a different distance transform for the silhouette fields.
    pub fn transform<U>(self, transform: U) -> SceneLoader<U> {
        SceneLoader {
            folder: self.folder,
            threshold: self.threshold,
            max_views: self.max_views,
            transform,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Reads the camera and image records and the silhouettes, and builds a view for each image.
    ///
    /// Images with an unknown camera, a missing or unreadable silhouette, or a silhouette that
    /// does not match the size of its camera are skipped with a warning. Failing to read either
    /// record file is an error.
    pub fn load(&self) -> Result<Vec<SceneView>> {
        let cameras_path = self.folder.join("cameras.txt");
        let images_path = self.folder.join("images.txt");
        let cameras = read_cameras(open(&cameras_path)?, &cameras_path)?;
        let mut images = read_images(open(&images_path)?, &images_path)?;
        info!(
            "read {} cameras and {} images from {}",
            cameras.len(),
            images.len(),
            self.folder.display()
        );
        if let Some(max_views) = self.max_views {
            images.truncate(max_views);
        }

        let mut pending = vec![];
        for image in images {
            let record = match cameras.get(&image.camera_id) {
                Some(record) => record,
                None => {
                    warn!(
                        "skipping image {}: unknown camera {}",
                        image.name, image.camera_id
                    );
                    continue;
                }
            };
            let silhouette_path = self.folder.join("sil").join(&image.name);
            if !silhouette_path.is_file() {
                warn!(
                    "skipping image {}: no silhouette at {}",
                    image.name,
                    silhouette_path.display()
                );
                continue;
            }
            let mask = match load_silhouette(&silhouette_path, self.threshold) {
                Ok(mask) => mask,
                Err(e) => {
                    warn!("skipping image {}: {}", image.name, e);
                    continue;
                }
            };
            if mask.bounds() != record.bounds {
                warn!(
                    "skipping image {}: silhouette is {} x {} but camera {} is {} x {}",
                    image.name,
                    mask.width(),
                    mask.height(),
                    record.id,
                    record.bounds.width,
                    record.bounds.height
                );
                continue;
            }
            let camera = PinholeCamera::new(
                record.intrinsics,
                image.rotation,
                image.translation,
                record.bounds,
            );
            pending.push((image.name, camera, mask));
        }

        let build = |(name, camera, mask): (String, PinholeCamera, BinaryMask)| {
            info!("building the silhouette field of {}", name);
            let field = SilhouetteField::build(mask, &self.transform);
            SceneView {
                name,
                camera,
                field,
            }
        };
        #[cfg(not(feature = "rayon"))]
        let views: Vec<SceneView> = pending.into_iter().map(build).collect();
        #[cfg(feature = "rayon")]
        let views: Vec<SceneView> = pending.into_par_iter().map(build).collect();
        info!("loaded {} views", views.len());
        Ok(views)
    }
}
