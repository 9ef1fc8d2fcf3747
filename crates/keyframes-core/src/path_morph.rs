//! Keyframed vector shapes.
//!
//! A shape keyframe is a list of [`VectorCommand`]s. Between two keyframes
//! each command is interpolated against the command at the same index of
//! the next keyframe; lines and quadratics facing a higher-order command are
//! elevated first, so exporters may mix orders freely.

use crate::animatable::{Keyframe, PropertyTrack};
use crate::error::{ModelError, PathError, Result};
use crate::path::{KfPath, VectorCommand};
use crate::timing::TimingCurve;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathShape {
    commands: Vec<VectorCommand>,
}

impl PathShape {
    pub fn new(commands: Vec<VectorCommand>) -> Self {
        Self { commands }
    }

    pub fn parse<S: AsRef<str>>(commands: &[S]) -> std::result::Result<Self, PathError> {
        let commands = commands
            .iter()
            .map(|c| c.as_ref().parse())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { commands })
    }

    pub fn commands(&self) -> &[VectorCommand] {
        &self.commands
    }

    /// Emits every command onto `path` unchanged.
    pub fn replay(&self, path: &mut KfPath) {
        for command in &self.commands {
            command.apply(path);
        }
    }

    /// Checks that this shape can morph into `other`.
    pub fn check_morph(&self, other: &PathShape) -> std::result::Result<(), PathError> {
        if self.commands.len() != other.commands.len() {
            return Err(PathError::CommandCountMismatch {
                from: self.commands.len(),
                to: other.commands.len(),
            });
        }
        self.commands
            .iter()
            .zip(&other.commands)
            .try_for_each(|(a, b)| a.check_pair(b))
    }

    pub fn interpolate(
        &self,
        other: &PathShape,
        t: f32,
        path: &mut KfPath,
    ) -> std::result::Result<(), PathError> {
        if self.commands.len() != other.commands.len() {
            return Err(PathError::CommandCountMismatch {
                from: self.commands.len(),
                to: other.commands.len(),
            });
        }
        for (a, b) in self.commands.iter().zip(&other.commands) {
            a.interpolate(b, t, path)?;
        }
        Ok(())
    }
}

/// A shape track whose adjacent keyframes are known to be morphable.
#[derive(Debug, Clone)]
pub struct PathTrack {
    track: PropertyTrack<PathShape>,
}

impl PathTrack {
    pub fn new(keyframes: Vec<Keyframe<PathShape>>, curves: Vec<TimingCurve>) -> Result<Self> {
        let track = PropertyTrack::new(keyframes, curves)?;
        for pair in track.keyframes().windows(2) {
            pair[0]
                .value
                .check_morph(&pair[1].value)
                .map_err(|source| ModelError::Path {
                    frame: pair[1].frame,
                    source,
                })?;
        }
        Ok(Self { track })
    }

    pub fn track(&self) -> &PropertyTrack<PathShape> {
        &self.track
    }

    /// Resets `out` and draws the shape at `progress` into it.
    pub fn apply(&self, progress: f32, out: &mut KfPath) -> std::result::Result<(), PathError> {
        out.reset();
        let sample = self.track.sample(progress);
        match sample.b {
            Some(b) if sample.t != 0.0 => sample.a.interpolate(b, sample.t, out),
            _ => {
                sample.a.replay(out);
                Ok(())
            }
        }
    }
}
