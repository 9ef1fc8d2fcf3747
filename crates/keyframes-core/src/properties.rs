//! Per-frame value containers written by scalar tracks.

use crate::animatable::PropertyTrack;

/// Stroke width for one frame. Scaling by a mirrored matrix can make the
/// stored width negative, so reads return the magnitude.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrokeWidth(f32);

impl StrokeWidth {
    pub fn get(&self) -> f32 {
        self.0.abs()
    }

    pub fn set(&mut self, width: f32) {
        self.0 = width;
    }

    pub fn adjust_scale(&mut self, scale: f32) {
        self.0 *= scale;
    }

    /// Resets to `base`, then lets `track` override it.
    pub fn resolve(&mut self, base: f32, track: Option<&PropertyTrack<f32>>, progress: f32) {
        self.0 = match track {
            Some(track) => track.value_at(progress),
            None => base,
        };
    }
}

/// Opacity as a percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opacity(f32);

impl Default for Opacity {
    fn default() -> Self {
        Opacity(100.0)
    }
}

impl Opacity {
    pub fn percent(&self) -> f32 {
        self.0
    }

    pub fn set(&mut self, percent: f32) {
        self.0 = percent;
    }

    pub fn alpha(&self) -> f32 {
        self.0 / 100.0
    }

    pub fn alpha_u8(&self) -> u8 {
        (255.0 * self.alpha()).round().clamp(0.0, 255.0) as u8
    }

    pub fn resolve(&mut self, track: Option<&PropertyTrack<f32>>, progress: f32) {
        self.0 = track.map_or(100.0, |t| t.value_at(progress));
    }
}
