//! Keyframes animation engine.
//!
//! Builds an immutable [`Animation`] from a parsed document and resolves it
//! frame by frame into an [`AnimationState`]: canvas-space paths, colors,
//! opacity, stroke widths and matrices for every feature.

pub mod animatable;
pub mod color;
pub mod error;
pub mod gradient;
mod loader;
pub mod model;
pub mod path;
pub mod path_morph;
pub mod properties;
pub mod state;
pub mod timing;
pub mod transform;
pub mod trim;

pub use animatable::{Interpolatable, Keyframe, PropertyTrack, Sample};
pub use color::Color;
pub use error::{ModelError, PathError, Result};
pub use gradient::{GradientSample, GradientTrack};
pub use model::{Animation, AnimationGroup, Feature, FeatureTrack, LineCap};
pub use path::{CommandKind, CoordMode, KfPath, VectorCommand};
pub use path_morph::{PathShape, PathTrack};
pub use state::{AnimationState, FeatureState, GroupMatrices, MaskState};
pub use timing::TimingCurve;
pub use transform::MatrixTrack;
pub use trim::PathTrim;

pub use keyframes_data as data;
