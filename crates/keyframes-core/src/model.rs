//! The immutable animation model.

use crate::animatable::PropertyTrack;
use crate::color::Color;
use crate::error::{ModelError, Result};
use crate::gradient::GradientTrack;
use crate::path_morph::PathTrack;
use crate::transform::{apply_tracks, sort_tracks, MatrixTrack};
use crate::trim::PathTrim;
use glam::{Mat3, Vec2};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

impl FromStr for LineCap {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "butt" => Ok(LineCap::Butt),
            "round" => Ok(LineCap::Round),
            "square" => Ok(LineCap::Square),
            _ => Err(ModelError::InvalidLineCap(s.to_string())),
        }
    }
}

/// A node in the transform hierarchy. Features nest inside groups, groups
/// nest inside their parent.
#[derive(Debug, Clone)]
pub struct AnimationGroup {
    id: i64,
    parent: Option<i64>,
    name: Option<String>,
    tracks: Vec<MatrixTrack>,
}

impl AnimationGroup {
    /// A parent id of `0` means the group is a root.
    pub fn new(id: i64, parent: Option<i64>, mut tracks: Vec<MatrixTrack>) -> Self {
        sort_tracks(&mut tracks);
        Self {
            id,
            parent: parent.filter(|&p| p != 0),
            name: None,
            tracks,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn parent(&self) -> Option<i64> {
        self.parent
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tracks(&self) -> &[MatrixTrack] {
        &self.tracks
    }

    /// Writes this group's local matrix (not including its parent) into `m`.
    pub fn local_matrix(&self, progress: f32, m: &mut Mat3) {
        *m = Mat3::IDENTITY;
        apply_tracks(&self.tracks, progress, m);
    }
}

/// One non-matrix track of a feature, or a matrix track.
#[derive(Debug, Clone)]
pub enum FeatureTrack {
    Matrix(MatrixTrack),
    StrokeWidth(PropertyTrack<f32>),
    StrokeColor(PropertyTrack<Color>),
    FillColor(PropertyTrack<Color>),
    Opacity(PropertyTrack<f32>),
}

impl FeatureTrack {
    pub fn property_name(&self) -> &'static str {
        match self {
            FeatureTrack::Matrix(track) => track.property_name(),
            FeatureTrack::StrokeWidth(_) => "STROKE_WIDTH",
            FeatureTrack::StrokeColor(_) => "STROKE_COLOR",
            FeatureTrack::FillColor(_) => "FILL_COLOR",
            FeatureTrack::Opacity(_) => "OPACITY",
        }
    }
}

/// A drawable element: a morphing path or a bitmap, with appearance tracks.
#[derive(Debug)]
pub struct Feature {
    name: String,
    class_name: Option<String>,
    fill_color: Color,
    stroke_color: Color,
    stroke_width: f32,
    line_cap: LineCap,
    from_frame: f32,
    to_frame: f32,
    group: Option<i64>,
    path: Option<PathTrack>,
    path_trim: Option<PathTrim>,
    matrix_tracks: Vec<MatrixTrack>,
    stroke_width_track: Option<PropertyTrack<f32>>,
    stroke_color_track: Option<PropertyTrack<Color>>,
    fill_color_track: Option<PropertyTrack<Color>>,
    opacity_track: Option<PropertyTrack<f32>>,
    gradient: Option<GradientTrack>,
    mask: Option<Box<Feature>>,
    backed_image: Option<String>,
    size: Option<Vec2>,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: None,
            fill_color: Color::TRANSPARENT,
            stroke_color: Color::TRANSPARENT,
            stroke_width: 0.0,
            line_cap: LineCap::default(),
            from_frame: f32::NEG_INFINITY,
            to_frame: f32::INFINITY,
            group: None,
            path: None,
            path_trim: None,
            matrix_tracks: Vec::new(),
            stroke_width_track: None,
            stroke_color_track: None,
            fill_color_track: None,
            opacity_track: None,
            gradient: None,
            mask: None,
            backed_image: None,
            size: None,
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_fill_color(mut self, color: Color) -> Self {
        self.fill_color = color;
        self
    }

    pub fn with_stroke_color(mut self, color: Color) -> Self {
        self.stroke_color = color;
        self
    }

    pub fn with_stroke_width(mut self, width: f32) -> Self {
        self.stroke_width = width;
        self
    }

    pub fn with_line_cap(mut self, cap: LineCap) -> Self {
        self.line_cap = cap;
        self
    }

    /// Restricts drawing to `[from, to]`, inclusive.
    pub fn with_visibility(mut self, from: Option<f32>, to: Option<f32>) -> Self {
        self.from_frame = from.unwrap_or(f32::NEG_INFINITY);
        self.to_frame = to.unwrap_or(f32::INFINITY);
        self
    }

    /// A group id of `0` leaves the feature at the root.
    pub fn with_group(mut self, group: Option<i64>) -> Self {
        self.group = group.filter(|&g| g != 0);
        self
    }

    pub fn with_path(mut self, path: PathTrack) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_path_trim(mut self, trim: PathTrim) -> Self {
        self.path_trim = Some(trim);
        self
    }

    pub fn with_gradient(mut self, gradient: GradientTrack) -> Self {
        self.gradient = Some(gradient);
        self
    }

    pub fn with_mask(mut self, mask: Feature) -> Self {
        self.mask = Some(Box::new(mask));
        self
    }

    pub fn with_backed_image(mut self, name: impl Into<String>) -> Self {
        self.backed_image = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = Some(size);
        self
    }

    /// Adds animation tracks. Each non-matrix property may appear once.
    pub fn with_tracks(mut self, tracks: impl IntoIterator<Item = FeatureTrack>) -> Result<Self> {
        fn set_once<V>(slot: &mut Option<V>, value: V, name: &str) -> Result<()> {
            if slot.is_some() {
                return Err(ModelError::DuplicateProperty(name.to_string()));
            }
            *slot = Some(value);
            Ok(())
        }

        for track in tracks {
            let name = track.property_name();
            match track {
                FeatureTrack::Matrix(t) => self.matrix_tracks.push(t),
                FeatureTrack::StrokeWidth(t) => set_once(&mut self.stroke_width_track, t, name)?,
                FeatureTrack::StrokeColor(t) => set_once(&mut self.stroke_color_track, t, name)?,
                FeatureTrack::FillColor(t) => set_once(&mut self.fill_color_track, t, name)?,
                FeatureTrack::Opacity(t) => set_once(&mut self.opacity_track, t, name)?,
            }
        }
        sort_tracks(&mut self.matrix_tracks);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn line_cap(&self) -> LineCap {
        self.line_cap
    }

    pub fn from_frame(&self) -> f32 {
        self.from_frame
    }

    pub fn to_frame(&self) -> f32 {
        self.to_frame
    }

    pub fn is_visible_at(&self, progress: f32) -> bool {
        progress >= self.from_frame && progress <= self.to_frame
    }

    pub fn group(&self) -> Option<i64> {
        self.group
    }

    pub fn path(&self) -> Option<&PathTrack> {
        self.path.as_ref()
    }

    pub fn matrix_tracks(&self) -> &[MatrixTrack] {
        &self.matrix_tracks
    }

    pub fn stroke_width_track(&self) -> Option<&PropertyTrack<f32>> {
        self.stroke_width_track.as_ref()
    }

    pub fn stroke_color_track(&self) -> Option<&PropertyTrack<Color>> {
        self.stroke_color_track.as_ref()
    }

    pub fn fill_color_track(&self) -> Option<&PropertyTrack<Color>> {
        self.fill_color_track.as_ref()
    }

    pub fn opacity_track(&self) -> Option<&PropertyTrack<f32>> {
        self.opacity_track.as_ref()
    }

    pub fn path_trim(&self) -> Option<&PathTrim> {
        self.path_trim.as_ref()
    }

    pub fn gradient(&self) -> Option<&GradientTrack> {
        self.gradient.as_ref()
    }

    pub fn mask(&self) -> Option<&Feature> {
        self.mask.as_deref()
    }

    pub fn backed_image(&self) -> Option<&str> {
        self.backed_image.as_deref()
    }

    pub fn size(&self) -> Option<Vec2> {
        self.size
    }

    /// Writes the feature's own track matrix (without its group) into `m`.
    pub fn local_matrix(&self, progress: f32, m: &mut Mat3) {
        *m = Mat3::IDENTITY;
        apply_tracks(&self.matrix_tracks, progress, m);
    }

    fn check_groups(&self, known: &HashSet<i64>) -> Result<()> {
        if let Some(group) = self.group {
            if !known.contains(&group) {
                return Err(ModelError::UnknownFeatureGroup(group));
            }
        }
        if let Some(mask) = &self.mask {
            mask.check_groups(known)?;
        }
        Ok(())
    }
}

/// A complete, validated animation.
#[derive(Debug)]
pub struct Animation {
    key: Option<i64>,
    name: Option<String>,
    frame_rate: i32,
    frame_count: i32,
    canvas_size: Vec2,
    features: Vec<Feature>,
    groups: Vec<AnimationGroup>,
    bitmaps: BTreeMap<String, Vec<u8>>,
}

impl Animation {
    /// Validates the parts and sorts groups so parents precede children.
    pub fn new(
        frame_rate: i32,
        frame_count: i32,
        canvas_size: &[f32],
        features: Vec<Feature>,
        groups: Vec<AnimationGroup>,
    ) -> Result<Self> {
        if frame_rate <= 0 {
            return Err(ModelError::InvalidFrameRate(frame_rate));
        }
        if frame_count <= 0 {
            return Err(ModelError::InvalidFrameCount(frame_count));
        }
        let canvas_size = match canvas_size {
            [w, h] if *w > 0.0 && *h > 0.0 => Vec2::new(*w, *h),
            _ => return Err(ModelError::InvalidCanvasSize(canvas_size.to_vec())),
        };

        let groups = sort_groups(groups)?;
        let known: HashSet<i64> = groups.iter().map(AnimationGroup::id).collect();
        for feature in &features {
            feature
                .check_groups(&known)
                .map_err(|e| e.in_feature(feature.name()))?;
        }

        debug!(
            frame_rate,
            frame_count,
            features = features.len(),
            groups = groups.len(),
            "animation built"
        );

        Ok(Self {
            key: None,
            name: None,
            frame_rate,
            frame_count,
            canvas_size,
            features,
            groups,
            bitmaps: BTreeMap::new(),
        })
    }

    pub fn with_key(mut self, key: Option<i64>) -> Self {
        self.key = key;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_bitmaps(mut self, bitmaps: BTreeMap<String, Vec<u8>>) -> Self {
        self.bitmaps = bitmaps;
        self
    }

    pub fn key(&self) -> Option<i64> {
        self.key
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn frame_rate(&self) -> i32 {
        self.frame_rate
    }

    pub fn frame_count(&self) -> i32 {
        self.frame_count
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    /// Length of the animation in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.frame_count as f32 / self.frame_rate as f32
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Groups in topological order, parents first.
    pub fn groups(&self) -> &[AnimationGroup] {
        &self.groups
    }

    pub fn group(&self, id: i64) -> Option<&AnimationGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn bitmaps(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.bitmaps
    }

    pub fn bitmap(&self, name: &str) -> Option<&[u8]> {
        self.bitmaps.get(name).map(Vec::as_slice)
    }
}

/// Orders groups so each parent precedes its children.
///
/// Ids must be positive and unique, parents must exist, and the parent
/// relation must be acyclic. Siblings keep their input order.
pub fn sort_groups(groups: Vec<AnimationGroup>) -> Result<Vec<AnimationGroup>> {
    let mut index_of = HashMap::with_capacity(groups.len());
    for (i, group) in groups.iter().enumerate() {
        if group.id <= 0 {
            return Err(ModelError::InvalidGroupId(group.id));
        }
        if index_of.insert(group.id, i).is_some() {
            return Err(ModelError::DuplicateGroupId(group.id));
        }
    }

    let mut children: HashMap<i64, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        match group.parent {
            None => roots.push(i),
            Some(parent) if index_of.contains_key(&parent) => {
                children.entry(parent).or_default().push(i)
            }
            Some(parent) => {
                return Err(ModelError::UnknownParentGroup {
                    group: group.id,
                    parent,
                })
            }
        }
    }

    let mut order = Vec::with_capacity(groups.len());
    let mut stack: Vec<usize> = roots.into_iter().rev().collect();
    while let Some(i) = stack.pop() {
        order.push(i);
        if let Some(kids) = children.get(&groups[i].id) {
            stack.extend(kids.iter().rev());
        }
    }

    if order.len() != groups.len() {
        let visited: HashSet<usize> = order.iter().copied().collect();
        let stuck = (0..groups.len())
            .find(|i| !visited.contains(i))
            .map_or(0, |i| groups[i].id);
        return Err(ModelError::GroupCycle(stuck));
    }

    let mut slots: Vec<Option<AnimationGroup>> = groups.into_iter().map(Some).collect();
    Ok(order
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}
