//! Fits an animation into output bounds and turns resolved frames into a
//! renderer-agnostic draw list.

use crate::config::{FeatureConfig, FeatureConfigs};
use glam::{Mat3, Vec2};
use keyframes_core::transform::to_affine;
use keyframes_core::{Animation, AnimationState, Color, LineCap, PathError};
use kurbo::{BezPath, Point};
use std::sync::Arc;
use tracing::{debug, trace};

/// Which edge stays put when scaling "from the end".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleDirection {
    /// Pivot on the bottom edge, so content grows upward.
    #[default]
    Up,
    /// Pivot on the top edge.
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    /// Linear gradient between two points in output space.
    LinearGradient {
        start: Point,
        end: Point,
        start_color: Color,
        end_color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub paint: Paint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
    pub cap: LineCap,
}

/// A vector feature, already transformed into output space.
#[derive(Debug, Clone)]
pub struct PathOp {
    pub feature: String,
    pub geometry: BezPath,
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    pub alpha: f32,
    pub clip: Option<BezPath>,
}

/// A feature whose class is drawn by the host.
#[derive(Debug, Clone)]
pub struct CustomOp {
    pub feature: String,
    pub class_name: String,
    pub transform: Mat3,
    pub extra: Option<Mat3>,
}

/// A feature backed by one of the document's bitmaps.
#[derive(Debug, Clone)]
pub struct BitmapOp {
    pub feature: String,
    pub image: String,
    pub transform: Mat3,
    pub size: Option<Vec2>,
    pub alpha: f32,
}

#[derive(Debug, Clone)]
pub enum DrawOp {
    Path(PathOp),
    Custom(CustomOp),
    Bitmap(BitmapOp),
}

/// Configures a [`KeyframesDrawable`] before it is built.
#[derive(Debug)]
pub struct KeyframesDrawableBuilder {
    animation: Arc<Animation>,
    configs: FeatureConfigs,
    retain_all: bool,
}

impl KeyframesDrawableBuilder {
    pub fn new(animation: impl Into<Arc<Animation>>) -> Self {
        Self {
            animation: animation.into(),
            configs: FeatureConfigs::new(),
            retain_all: false,
        }
    }

    pub fn with_feature_configs(mut self, configs: FeatureConfigs) -> Self {
        self.configs = configs;
        self
    }

    pub fn with_feature_config(mut self, class_name: impl Into<String>, config: FeatureConfig) -> Self {
        self.configs.insert(class_name, config);
        self
    }

    /// Keep every feature's matrix readable after each frame.
    pub fn retain_all_matrices(mut self, retain: bool) -> Self {
        self.retain_all = retain;
        self
    }

    pub fn build(self) -> KeyframesDrawable {
        let configs = self.configs;
        let retain_all = self.retain_all;
        let state = AnimationState::with_retained_matrices(self.animation, |f| {
            retain_all || configs.contains(f.class_name())
        });
        KeyframesDrawable {
            state,
            configs,
            bounds: Vec2::ZERO,
            scale: 1.0,
            scale_from_center: 1.0,
            scale_from_end: 1.0,
            scale_matrix: Mat3::IDENTITY,
            initialized: false,
        }
    }
}

/// An animation fitted into output bounds.
#[derive(Debug, Clone)]
pub struct KeyframesDrawable {
    state: AnimationState,
    configs: FeatureConfigs,
    bounds: Vec2,
    scale: f32,
    scale_from_center: f32,
    scale_from_end: f32,
    scale_matrix: Mat3,
    initialized: bool,
}

impl KeyframesDrawable {
    pub fn builder(animation: impl Into<Arc<Animation>>) -> KeyframesDrawableBuilder {
        KeyframesDrawableBuilder::new(animation)
    }

    /// Sets the output size and fits the canvas into it, preserving aspect.
    ///
    /// Resets any directional scale. The first call also resolves frame 0
    /// so there is something to draw.
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), PathError> {
        let canvas = self.state.animation().canvas_size();
        self.bounds = Vec2::new(width, height);
        self.scale = (width / canvas.x).min(height / canvas.y);
        debug!(width, height, scale = self.scale, "fitting animation to bounds");
        self.set_directional_scale(1.0, 1.0, ScaleDirection::Up);
        if !self.initialized {
            self.set_frame_progress(0.0)?;
        }
        Ok(())
    }

    /// Scales the output about its center, then about the middle of one edge.
    pub fn set_directional_scale(&mut self, from_center: f32, from_end: f32, direction: ScaleDirection) {
        let mut m = Mat3::from_scale(Vec2::splat(self.scale));
        if from_center != 1.0 || from_end != 1.0 {
            let center = self.bounds / 2.0;
            let edge_y = match direction {
                ScaleDirection::Up => self.bounds.y,
                ScaleDirection::Down => 0.0,
            };
            m = scale_about(from_center, center) * m;
            m = scale_about(from_end, Vec2::new(center.x, edge_y)) * m;
        }
        self.scale_from_center = from_center;
        self.scale_from_end = from_end;
        self.scale_matrix = m;
    }

    pub fn set_frame_progress(&mut self, progress: f32) -> Result<(), PathError> {
        self.initialized = true;
        self.state.set_frame_progress(progress)
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn animation(&self) -> &Arc<Animation> {
        self.state.animation()
    }

    /// Canvas-to-output matrix.
    pub fn scale_matrix(&self) -> &Mat3 {
        &self.scale_matrix
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Draw operations for the last resolved frame, in feature order.
    /// Invisible features and features with nothing to draw are skipped.
    pub fn draw_list(&self) -> Vec<DrawOp> {
        let affine = to_affine(&self.scale_matrix);
        let stroke_scale = self.scale * self.scale_from_center * self.scale_from_end;
        let mut ops = Vec::new();

        for (feature, state) in self.state.iter() {
            if !state.is_visible() {
                continue;
            }

            if let (Some(config), Some(matrix)) = (
                self.configs.get(feature.class_name()),
                state.unique_matrix(),
            ) {
                ops.push(DrawOp::Custom(CustomOp {
                    feature: feature.name().to_string(),
                    class_name: feature.class_name().unwrap_or_default().to_string(),
                    transform: self.scale_matrix * *matrix,
                    extra: config.effective_matrix().copied(),
                }));
                continue;
            }

            if let (Some(image), Some(matrix)) = (feature.backed_image(), state.unique_matrix()) {
                ops.push(DrawOp::Bitmap(BitmapOp {
                    feature: feature.name().to_string(),
                    image: image.to_string(),
                    transform: self.scale_matrix * *matrix,
                    size: feature.size(),
                    alpha: state.alpha(),
                }));
                continue;
            }

            let Some(path) = state.path().filter(|p| !p.is_empty()) else {
                continue;
            };

            let fill = (!state.fill_color().is_transparent()).then(|| Fill {
                paint: match state.gradient() {
                    Some(g) => Paint::LinearGradient {
                        start: affine * Point::ZERO,
                        end: affine * Point::new(0.0, g.height as f64),
                        start_color: g.start,
                        end_color: g.end,
                    },
                    None => Paint::Solid(state.fill_color()),
                },
            });
            let stroke = (!state.stroke_color().is_transparent() && state.stroke_width() > 0.0)
                .then(|| Stroke {
                    color: state.stroke_color(),
                    width: state.stroke_width() * stroke_scale,
                    cap: state.line_cap(),
                });
            if fill.is_none() && stroke.is_none() {
                trace!(feature = feature.name(), "nothing to paint");
                continue;
            }

            let mut geometry = path.as_bez_path().clone();
            geometry.apply_affine(affine);
            let clip = state.mask().filter(|m| !m.path().is_empty()).map(|m| {
                let mut clip = m.path().as_bez_path().clone();
                clip.apply_affine(affine);
                clip
            });

            ops.push(DrawOp::Path(PathOp {
                feature: feature.name().to_string(),
                geometry,
                fill,
                stroke,
                alpha: state.alpha(),
                clip,
            }));
        }
        ops
    }
}

fn scale_about(s: f32, pivot: Vec2) -> Mat3 {
    Mat3::from_translation(pivot) * Mat3::from_scale(Vec2::splat(s)) * Mat3::from_translation(-pivot)
}
