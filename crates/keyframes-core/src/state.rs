//! Per-frame resolved state.
//!
//! [`AnimationState`] owns every buffer written while resolving a frame, so
//! a running animation allocates nothing after its first frame.

use crate::color::Color;
use crate::error::PathError;
use crate::gradient::GradientSample;
use crate::model::{Animation, Feature, LineCap};
use crate::path::KfPath;
use crate::properties::{Opacity, StrokeWidth};
use crate::transform::uniform_scale;
use glam::Mat3;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Resolved matrix of every animation group, indexed by group id.
#[derive(Debug, Clone)]
pub struct GroupMatrices {
    index: HashMap<i64, usize>,
    matrices: Vec<Mat3>,
}

impl GroupMatrices {
    pub fn new(animation: &Animation) -> Self {
        let index = animation
            .groups()
            .iter()
            .enumerate()
            .map(|(i, g)| (g.id(), i))
            .collect();
        Self {
            index,
            matrices: vec![Mat3::IDENTITY; animation.groups().len()],
        }
    }

    pub fn get(&self, id: i64) -> Option<&Mat3> {
        self.index.get(&id).map(|&i| &self.matrices[i])
    }

    /// Resolves groups in order: local tracks first, then the parent's
    /// matrix on top (`M = parent * local`).
    pub fn compute(&mut self, animation: &Animation, progress: f32) {
        for (i, group) in animation.groups().iter().enumerate() {
            let mut m = Mat3::IDENTITY;
            group.local_matrix(progress, &mut m);
            if let Some(parent) = group.parent().and_then(|p| self.get(p)) {
                m = *parent * m;
            }
            self.matrices[i] = m;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FeatureMatrix {
    /// Resolved into the state's scratch matrix and consumed immediately.
    Shared,
    Unique(Mat3),
}

#[derive(Debug, Clone, Default)]
pub struct MaskState {
    matrix: Mat3,
    path: KfPath,
}

impl MaskState {
    pub fn matrix(&self) -> &Mat3 {
        &self.matrix
    }

    pub fn path(&self) -> &KfPath {
        &self.path
    }
}

/// What one feature looks like at the current progress.
#[derive(Debug, Clone)]
pub struct FeatureState {
    matrix: FeatureMatrix,
    visible: bool,
    path: Option<KfPath>,
    stroke_width: StrokeWidth,
    opacity: Opacity,
    fill_color: Color,
    stroke_color: Color,
    line_cap: LineCap,
    gradient: Option<GradientSample>,
    mask: Option<MaskState>,
}

impl FeatureState {
    fn new(feature: &Feature, retain_matrix: bool) -> Self {
        let unique = retain_matrix || feature.backed_image().is_some() || feature.mask().is_some();
        let draws_path = feature.path().is_some() && feature.backed_image().is_none();
        Self {
            matrix: if unique {
                FeatureMatrix::Unique(Mat3::IDENTITY)
            } else {
                FeatureMatrix::Shared
            },
            visible: false,
            path: draws_path.then(KfPath::new),
            stroke_width: StrokeWidth::default(),
            opacity: Opacity::default(),
            fill_color: feature.fill_color(),
            stroke_color: feature.stroke_color(),
            line_cap: feature.line_cap(),
            gradient: None,
            mask: feature.mask().map(|_| MaskState::default()),
        }
    }

    fn resolve(
        &mut self,
        feature: &Feature,
        progress: f32,
        groups: &GroupMatrices,
        scratch: &mut Mat3,
    ) -> Result<(), PathError> {
        self.visible = feature.is_visible_at(progress);
        if !self.visible {
            return Ok(());
        }

        let slot = match &mut self.matrix {
            FeatureMatrix::Shared => scratch,
            FeatureMatrix::Unique(m) => m,
        };
        feature.local_matrix(progress, slot);
        if let Some(group) = feature.group().and_then(|g| groups.get(g)) {
            if *group != Mat3::IDENTITY {
                *slot = *group * *slot;
            }
        }
        let matrix = *slot;

        self.opacity.resolve(feature.opacity_track(), progress);
        self.fill_color = feature
            .fill_color_track()
            .map_or(feature.fill_color(), |t| t.value_at(progress));
        self.stroke_color = feature
            .stroke_color_track()
            .map_or(feature.stroke_color(), |t| t.value_at(progress));
        self.stroke_width
            .resolve(feature.stroke_width(), feature.stroke_width_track(), progress);
        self.stroke_width.adjust_scale(uniform_scale(&matrix));
        self.gradient = feature.gradient().map(|g| *g.nearest(progress));

        if let (Some(track), Some(path)) = (feature.path(), self.path.as_mut()) {
            track.apply(progress, path)?;
            if let Some(trim) = feature.path_trim() {
                trim.apply(progress, path);
            }
            path.transform(&matrix);
        }

        if let (Some(mask_feature), Some(mask)) = (feature.mask(), self.mask.as_mut()) {
            mask_feature.local_matrix(progress, &mut mask.matrix);
            if let Some(group) = mask_feature.group().and_then(|g| groups.get(g)) {
                mask.matrix = *group * mask.matrix;
            }
            match mask_feature.path() {
                Some(track) => {
                    track.apply(progress, &mut mask.path)?;
                    if let Some(trim) = mask_feature.path_trim() {
                        trim.apply(progress, &mut mask.path);
                    }
                    mask.path.transform(&mask.matrix);
                }
                None => mask.path.reset(),
            }
        }
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The feature's matrix, only for features that keep their own copy.
    pub fn unique_matrix(&self) -> Option<&Mat3> {
        match &self.matrix {
            FeatureMatrix::Unique(m) => Some(m),
            FeatureMatrix::Shared => None,
        }
    }

    /// Resolved path in canvas space; `None` for bitmap or pathless features.
    pub fn path(&self) -> Option<&KfPath> {
        self.path.as_ref()
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width.get()
    }

    pub fn opacity(&self) -> &Opacity {
        &self.opacity
    }

    pub fn alpha(&self) -> f32 {
        self.opacity.alpha()
    }

    pub fn alpha_u8(&self) -> u8 {
        self.opacity.alpha_u8()
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn line_cap(&self) -> LineCap {
        self.line_cap
    }

    pub fn gradient(&self) -> Option<&GradientSample> {
        self.gradient.as_ref()
    }

    pub fn mask(&self) -> Option<&MaskState> {
        self.mask.as_ref()
    }
}

/// Reusable per-frame state for one [`Animation`].
#[derive(Debug, Clone)]
pub struct AnimationState {
    animation: Arc<Animation>,
    progress: f32,
    groups: GroupMatrices,
    scratch: Mat3,
    features: Vec<FeatureState>,
}

impl AnimationState {
    pub fn new(animation: Arc<Animation>) -> Self {
        Self::with_retained_matrices(animation, |_| false)
    }

    /// Like [`AnimationState::new`], but features matching `retain` keep a
    /// unique matrix readable after each frame is resolved.
    pub fn with_retained_matrices(
        animation: Arc<Animation>,
        retain: impl Fn(&Feature) -> bool,
    ) -> Self {
        let features = animation
            .features()
            .iter()
            .map(|f| FeatureState::new(f, retain(f)))
            .collect();
        Self {
            groups: GroupMatrices::new(&animation),
            animation,
            progress: 0.0,
            scratch: Mat3::IDENTITY,
            features,
        }
    }

    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    /// Progress of the last resolved frame, after clamping.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Resolves every feature at `progress`, a frame number clamped to
    /// `[0, frame_count]`.
    pub fn set_frame_progress(&mut self, progress: f32) -> Result<(), PathError> {
        let progress = clamp_progress(progress, self.animation.frame_count());
        self.progress = progress;
        trace!(progress, "resolving frame");

        self.groups.compute(&self.animation, progress);
        for (feature, state) in self.animation.features().iter().zip(&mut self.features) {
            state.resolve(feature, progress, &self.groups, &mut self.scratch)?;
        }
        Ok(())
    }

    pub fn group_matrix(&self, id: i64) -> Option<&Mat3> {
        self.groups.get(id)
    }

    pub fn feature_states(&self) -> &[FeatureState] {
        &self.features
    }

    /// Features paired with their resolved state, in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = (&Feature, &FeatureState)> {
        self.animation.features().iter().zip(&self.features)
    }
}

fn clamp_progress(progress: f32, frame_count: i32) -> f32 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, frame_count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::{Keyframe, PropertyTrack};
    use crate::model::{AnimationGroup, FeatureTrack};
    use crate::path_morph::{PathShape, PathTrack};
    use crate::timing::TimingCurve;
    use crate::transform::MatrixTrack;
    use glam::{Vec2, Vec3};

    fn square() -> PathTrack {
        let shape = PathShape::parse(&["M0,0", "L10,0", "L10,10", "L0,10"]).unwrap();
        PathTrack::new(vec![Keyframe::new(0, shape)], Vec::new()).unwrap()
    }

    #[test]
    fn test_shared_matrix_is_not_exposed() {
        let animation = Animation::new(
            30,
            10,
            &[100.0, 100.0],
            vec![
                Feature::new("plain").with_path(square()),
                Feature::new("image").with_backed_image("sparkle"),
            ],
            Vec::new(),
        )
        .unwrap();
        let mut state = AnimationState::new(Arc::new(animation));
        state.set_frame_progress(0.0).unwrap();
        assert!(state.feature_states()[0].unique_matrix().is_none());
        assert!(state.feature_states()[1].unique_matrix().is_some());
        assert!(state.feature_states()[1].path().is_none());
    }

    #[test]
    fn test_retained_matrix_predicate() {
        let animation = Animation::new(
            30,
            10,
            &[100.0, 100.0],
            vec![Feature::new("keep").with_path(square())],
            Vec::new(),
        )
        .unwrap();
        let mut state =
            AnimationState::with_retained_matrices(Arc::new(animation), |f| f.name() == "keep");
        state.set_frame_progress(3.0).unwrap();
        assert_eq!(state.feature_states()[0].unique_matrix(), Some(&Mat3::IDENTITY));
    }

    #[test]
    fn test_progress_is_clamped() {
        let animation = Animation::new(30, 10, &[1.0, 1.0], Vec::new(), Vec::new()).unwrap();
        let mut state = AnimationState::new(Arc::new(animation));
        state.set_frame_progress(25.0).unwrap();
        assert_eq!(state.progress(), 10.0);
        state.set_frame_progress(f32::NAN).unwrap();
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn test_feature_nests_inside_group() {
        let group = AnimationGroup::new(
            1,
            None,
            vec![MatrixTrack::XPosition(PropertyTrack::constant(100.0))],
        );
        let feature = Feature::new("dot")
            .with_group(Some(1))
            .with_path(square())
            .with_tracks([FeatureTrack::Matrix(MatrixTrack::Rotation(
                PropertyTrack::constant(Vec3::new(90.0, 0.0, 0.0)),
            ))])
            .unwrap();
        let animation = Animation::new(30, 10, &[200.0, 200.0], vec![feature], vec![group]).unwrap();
        let mut state = AnimationState::new(Arc::new(animation));
        state.set_frame_progress(0.0).unwrap();
        let last = state.feature_states()[0].path().unwrap().last_point();
        // (0,10) rotated 90 degrees is (-10,0), then moved by the group
        assert!((last - Vec2::new(90.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_mask_resolves_own_path() {
        let mask = Feature::new("mask").with_path(square()).with_tracks([FeatureTrack::Matrix(
            MatrixTrack::Position(PropertyTrack::new(
                vec![Keyframe::new(0, Vec2::ZERO), Keyframe::new(10, Vec2::new(10.0, 0.0))],
                vec![TimingCurve::linear()],
            )
            .unwrap()),
        )]);
        let feature = Feature::new("masked").with_path(square()).with_mask(mask.unwrap());
        let animation = Animation::new(30, 10, &[50.0, 50.0], vec![feature], Vec::new()).unwrap();
        let mut state = AnimationState::new(Arc::new(animation));
        state.set_frame_progress(5.0).unwrap();
        let fs = &state.feature_states()[0];
        assert!(fs.unique_matrix().is_some());
        let mask = fs.mask().unwrap();
        assert_eq!(mask.path().last_point(), Vec2::new(5.0, 10.0));
    }
}
