//! # keyframes
//!
//! Loads Keyframes vector animations, resolves them frame by frame and
//! produces renderer-agnostic draw lists.
//!
//! ```no_run
//! use keyframes::{KeyframesDrawable, DrawOp};
//!
//! let animation = keyframes::load_from_path("face.json")?;
//! let mut drawable = KeyframesDrawable::builder(animation).build();
//! drawable.set_bounds(256.0, 256.0)?;
//! drawable.set_frame_progress(12.5)?;
//! for op in drawable.draw_list() {
//!     if let DrawOp::Path(path) = op {
//!         println!("{} has {} elements", path.feature, path.geometry.elements().len());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod drawable;
pub mod error;

pub use config::{FeatureConfig, FeatureConfigs};
pub use drawable::{
    BitmapOp, CustomOp, DrawOp, Fill, KeyframesDrawable, KeyframesDrawableBuilder, Paint, PathOp,
    ScaleDirection, Stroke,
};
pub use error::LoadError;
pub use keyframes_core::*;

use std::path::Path;
use tracing::debug;

pub fn load_from_str(json: &str) -> Result<Animation, LoadError> {
    let doc = keyframes_data::from_str(json)?;
    Ok(Animation::from_document(&doc)?)
}

pub fn load_from_slice(bytes: &[u8]) -> Result<Animation, LoadError> {
    let doc = keyframes_data::from_slice(bytes)?;
    Ok(Animation::from_document(&doc)?)
}

/// Reads and builds an animation from a JSON file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Animation, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading animation");
    let bytes = std::fs::read(path)?;
    load_from_slice(&bytes)
}
