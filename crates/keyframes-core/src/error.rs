//! Error types for animation construction and path sampling.

use crate::path::CommandKind;
use thiserror::Error;

/// Result alias used across the engine.
pub type Result<T, E = ModelError> = std::result::Result<T, E>;

/// Failures while parsing or interpolating vector path commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    /// The command string was empty.
    #[error("empty vector command")]
    Empty,

    /// The leading letter is not one of `M m L l Q q C c`.
    #[error("unhandled vector command: {0}")]
    UnknownCommand(String),

    #[error("{kind:?} requires {expected} arguments, but got {found}")]
    ArgumentCount {
        kind: CommandKind,
        expected: usize,
        found: usize,
    },

    #[error("invalid number {value:?} in vector command {command:?}")]
    InvalidNumber { command: String, value: String },

    /// A relative command was paired with an absolute one.
    #[error("cannot interpolate between relative and absolute commands")]
    MismatchedCoordinateMode,

    /// Move commands only pair with move commands.
    #[error("cannot interpolate {from:?} into {to:?}")]
    IncompatibleCommands { from: CommandKind, to: CommandKind },

    #[error("path keyframes have {from} and {to} commands")]
    CommandCountMismatch { from: usize, to: usize },
}

/// Failures while building an [`Animation`](crate::Animation) from its parts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(i32),

    #[error("frame count must be positive, got {0}")]
    InvalidFrameCount(i32),

    #[error("canvas size must be two positive numbers, got {0:?}")]
    InvalidCanvasSize(Vec<f32>),

    #[error("animation group ids must be positive, got {0}")]
    InvalidGroupId(i64),

    #[error("duplicate animation group id {0}")]
    DuplicateGroupId(i64),

    #[error("animation group {group} references unknown parent {parent}")]
    UnknownParentGroup { group: i64, parent: i64 },

    #[error("animation group {0} is part of a parent cycle")]
    GroupCycle(i64),

    #[error("feature references unknown animation group {0}")]
    UnknownFeatureGroup(i64),

    #[error("expected {expected} timing curves, got {found}")]
    TimingCurveCount { expected: usize, found: usize },

    #[error("timing curve must be [[x1, y1], [x2, y2]], got {0:?}")]
    InvalidTimingCurve(Vec<Vec<f32>>),

    #[error("keyframes must be strictly increasing, got {previous} then {next}")]
    NonIncreasingKeyframes { previous: i32, next: i32 },

    #[error("track has no keyframes")]
    EmptyTrack,

    #[error("{property} expects {expected} values per keyframe, got {found}")]
    KeyValueArity {
        property: String,
        expected: String,
        found: usize,
    },

    #[error("unknown animation property {0:?}")]
    UnknownProperty(String),

    #[error("property {0} is declared more than once")]
    DuplicateProperty(String),

    #[error("property {0} cannot animate a group")]
    NonMatrixGroupProperty(String),

    #[error("invalid color {0:?}")]
    InvalidColor(String),

    #[error("invalid stroke line cap {0:?}")]
    InvalidLineCap(String),

    #[error("bitmap {name:?} could not be decoded: {reason}")]
    InvalidBitmap { name: String, reason: String },

    #[error("path keyframe at frame {frame}: {source}")]
    Path {
        frame: i32,
        #[source]
        source: PathError,
    },

    #[error("feature {name:?}: {source}")]
    Feature {
        name: String,
        #[source]
        source: Box<ModelError>,
    },

    #[error("animation group {id}: {source}")]
    Group {
        id: i64,
        #[source]
        source: Box<ModelError>,
    },
}

impl ModelError {
    pub(crate) fn in_feature(self, name: &str) -> Self {
        ModelError::Feature {
            name: name.to_string(),
            source: Box::new(self),
        }
    }

    pub(crate) fn in_group(self, id: i64) -> Self {
        ModelError::Group {
            id,
            source: Box::new(self),
        }
    }
}
