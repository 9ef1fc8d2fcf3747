//! Lazily built gradient lookup table.

use crate::animatable::PropertyTrack;
use crate::color::Color;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Samples stored per second of animation.
const SAMPLES_PER_SECOND: f32 = 30.0;

/// A vertical linear gradient from `(0, 0)` to `(0, height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientSample {
    pub start: Color,
    pub end: Color,
    pub height: f32,
}

/// Start and end color tracks of a feature's gradient effect.
///
/// Gradients are resolved by nearest lookup into a table sampled at roughly
/// 30 entries per second, built the first time it is needed and never
/// rebuilt.
#[derive(Debug)]
pub struct GradientTrack {
    start: PropertyTrack<Color>,
    end: PropertyTrack<Color>,
    height: f32,
    frame_rate: i32,
    frame_count: i32,
    cache: OnceLock<Box<[GradientSample]>>,
}

impl GradientTrack {
    pub fn new(
        start: PropertyTrack<Color>,
        end: PropertyTrack<Color>,
        height: f32,
        frame_rate: i32,
        frame_count: i32,
    ) -> Self {
        Self {
            start,
            end,
            height,
            frame_rate,
            frame_count,
            cache: OnceLock::new(),
        }
    }

    pub fn sample_count(&self) -> usize {
        let count = (SAMPLES_PER_SECOND * self.frame_count as f32 / self.frame_rate as f32).round();
        (count as usize).max(1)
    }

    pub fn is_initialized(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Resolves the gradient for `progress` directly from the tracks.
    pub fn evaluate(&self, progress: f32) -> GradientSample {
        GradientSample {
            start: self.start.value_at(progress),
            end: self.end.value_at(progress),
            height: self.height,
        }
    }

    /// Returns the cached sample nearest to `progress`, building the table
    /// on first use.
    pub fn nearest(&self, progress: f32) -> &GradientSample {
        let samples = self.cache.get_or_init(|| self.build());
        let last = samples.len() - 1;
        let position = progress / self.frame_count as f32 * last as f32;
        let index = if position.is_nan() || position <= 0.0 {
            0
        } else {
            (position as usize).min(last)
        };
        &samples[index]
    }

    fn build(&self) -> Box<[GradientSample]> {
        let count = self.sample_count();
        if self.height <= 0.0 {
            warn!(height = self.height, "gradient has no vertical extent");
        }
        debug!(samples = count, "building gradient cache");
        (0..count)
            .map(|i| self.evaluate(i as f32 / count as f32 * self.frame_count as f32))
            .collect()
    }
}
