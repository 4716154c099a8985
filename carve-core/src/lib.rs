//! # Carve Core
//!
//! This library provides the common abstractions and types shared by the crates of the
//! silhouette carving workspace. This includes the camera model trait, image points and
//! bounds, world points, and the triangle mesh produced by surface extraction. The crate
//! is designed to be very small so that it adds negligable build time, and it only pulls in
//! `nalgebra`, which is re-exported so that every crate uses the same version.
//!
//! ## Space carving
//!
//! A silhouette is the set of pixels in an image that the subject covers. Every silhouette
//! pixel, together with the optical center `O` of its camera, defines a ray, and all of these
//! rays together form a generalized cone that must contain the subject. Intersecting the cones
//! of all cameras gives the *visual hull*, which is the largest shape consistent with every
//! silhouette.
//!
//! - `O` the optical center of a camera
//! - `@` the image plane
//! - `#` the silhouette on the image plane
//! - `x` the subject
//!
//! ```text
//!                 @
//!                 #
//!        xxx      #
//!       xxxxx-----#----O
//!        xxx      #
//!         \       @
//!          \      @
//!   @@@@@####@@@@
//!            \
//!             O
//! ```
//!
//! The carving crates approximate the visual hull by sampling space with a voxel grid and
//! projecting each voxel into each image with a [`CameraModel`]. The voxel stays inside the
//! hull only if every view sees it inside the silhouette.

mod bounds;
mod camera;
mod keypoint;
mod mesh;
mod point;

pub use bounds::*;
pub use camera::*;
pub use keypoint::*;
pub use mesh::*;
pub use nalgebra;
pub use point::*;
