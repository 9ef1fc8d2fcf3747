//! Conversion from the wire format into a validated [`Animation`].

use crate::animatable::{Keyframe, PropertyTrack};
use crate::color::Color;
use crate::error::{ModelError, Result};
use crate::gradient::GradientTrack;
use crate::model::{Animation, AnimationGroup, Feature, FeatureTrack, LineCap};
use crate::path_morph::{PathShape, PathTrack};
use crate::timing::TimingCurve;
use crate::transform::MatrixTrack;
use crate::trim::PathTrim;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use glam::{Vec2, Vec3};
use keyframes_data::model::{
    KfAnimatable, KfAnimationGroup, KfData, KfDocument, KfFeature, KfProperty, KfTimingCurve,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Document-wide values features need while loading.
struct Context {
    frame_rate: i32,
    frame_count: i32,
    canvas_height: f32,
}

impl Animation {
    pub fn from_document(doc: &KfDocument) -> Result<Animation> {
        let ctx = Context {
            frame_rate: doc.frame_rate,
            frame_count: doc.animation_frame_count,
            canvas_height: doc.canvas_size.get(1).copied().unwrap_or(0.0),
        };

        let groups = doc
            .animation_groups
            .iter()
            .map(|g| load_group(g).map_err(|e| e.in_group(g.group_id)))
            .collect::<Result<Vec<_>>>()?;

        let features = doc
            .features
            .iter()
            .enumerate()
            .map(|(i, f)| {
                load_feature(f, &ctx).map_err(|e| e.in_feature(&feature_label(f, i)))
            })
            .collect::<Result<Vec<_>>>()?;

        let bitmaps = decode_bitmaps(&doc.bitmaps)?;
        for feature in &features {
            if let Some(name) = feature.backed_image() {
                if !bitmaps.contains_key(name) {
                    warn!(feature = feature.name(), image = name, "backed image not in bitmaps");
                }
            }
        }

        let animation = Animation::new(
            doc.frame_rate,
            doc.animation_frame_count,
            &doc.canvas_size,
            features,
            groups,
        )?
        .with_key(doc.key)
        .with_name(doc.name.clone())
        .with_bitmaps(bitmaps);

        debug!(
            name = animation.name().unwrap_or(""),
            bitmaps = animation.bitmaps().len(),
            "document loaded"
        );
        Ok(animation)
    }
}

fn feature_label(f: &KfFeature, index: usize) -> String {
    f.name.clone().unwrap_or_else(|| format!("#{index}"))
}

fn load_group(g: &KfAnimationGroup) -> Result<AnimationGroup> {
    let tracks = g
        .animations
        .iter()
        .map(|p| -> Result<MatrixTrack> {
            match load_property(p)? {
                FeatureTrack::Matrix(track) => Ok(track),
                other => Err(ModelError::NonMatrixGroupProperty(
                    other.property_name().to_string(),
                )),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    let group = AnimationGroup::new(g.group_id, g.parent_group, tracks);
    Ok(match &g.group_name {
        Some(name) => group.with_name(name.clone()),
        None => group,
    })
}

fn load_feature(f: &KfFeature, ctx: &Context) -> Result<Feature> {
    let mut feature = Feature::new(f.name.clone().unwrap_or_default())
        .with_stroke_width(f.stroke_width.unwrap_or(0.0))
        .with_visibility(f.from_frame, f.to_frame)
        .with_group(f.animation_group);

    if let Some(class_name) = &f.class_name {
        feature = feature.with_class_name(class_name.clone());
    }
    if let Some(color) = &f.fill_color {
        feature = feature.with_fill_color(color.parse()?);
    }
    if let Some(color) = &f.stroke_color {
        feature = feature.with_stroke_color(color.parse()?);
    }
    if let Some(cap) = &f.stroke_line_cap {
        feature = feature.with_line_cap(cap.parse::<LineCap>()?);
    }
    if let Some(image) = &f.backed_image {
        feature = feature.with_backed_image(image.clone());
    }
    if let Some(size) = &f.size {
        match size.as_slice() {
            [w, h] => feature = feature.with_size(Vec2::new(*w, *h)),
            _ => warn!(feature = feature.name(), ?size, "ignoring malformed feature size"),
        }
    }

    if !f.key_frames.is_empty() {
        let keyframes = f
            .key_frames
            .iter()
            .map(|k| {
                PathShape::parse(&k.data)
                    .map(|shape| Keyframe::new(k.start_frame, shape))
                    .map_err(|source| ModelError::Path {
                        frame: k.start_frame,
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        feature = feature.with_path(PathTrack::new(keyframes, load_curves(&f.timing_curves)?)?);
    }

    if let Some(trim) = &f.path_trim {
        if f.key_frames.is_empty() {
            warn!(feature = feature.name(), "path_trim without key_frames has nothing to trim");
        }
        feature = feature.with_path_trim(PathTrim::new(
            load_scalar_track("path_trim_start", &trim.path_trim_start)?,
            load_scalar_track("path_trim_end", &trim.path_trim_end)?,
            load_scalar_track("path_trim_offset", &trim.path_trim_offset)?,
        ));
    }

    if let Some(gradient) = f.effects.as_ref().and_then(|e| e.gradient.as_ref()) {
        match (&gradient.color_start, &gradient.color_end) {
            (Some(start), Some(end)) => {
                feature = feature.with_gradient(GradientTrack::new(
                    load_color_track(start)?,
                    load_color_track(end)?,
                    ctx.canvas_height,
                    ctx.frame_rate,
                    ctx.frame_count,
                ));
            }
            _ => warn!(feature = feature.name(), "gradient needs both start and end colors"),
        }
    }

    if let Some(mask) = &f.masking {
        feature = feature.with_mask(load_feature(mask, ctx)?);
    }

    let tracks = f
        .feature_animations
        .iter()
        .map(load_property)
        .collect::<Result<Vec<_>>>()?;
    feature.with_tracks(tracks)
}

fn load_curves(raw: &[KfTimingCurve]) -> Result<Vec<TimingCurve>> {
    raw.iter()
        .map(|c| TimingCurve::from_control_points(c))
        .collect()
}

fn load_color_track(raw: &KfAnimatable<String>) -> Result<PropertyTrack<Color>> {
    let keyframes = raw
        .key_values
        .iter()
        .map(|k| -> Result<Keyframe<Color>> {
            Ok(Keyframe::new(k.start_frame, k.data.parse()?))
        })
        .collect::<Result<Vec<_>>>()?;
    PropertyTrack::new(keyframes, load_curves(&raw.timing_curves)?)
}

fn load_scalar_track(name: &str, raw: &KfAnimatable<KfData>) -> Result<PropertyTrack<f32>> {
    let keyframes = raw
        .key_values
        .iter()
        .map(|k| -> Result<Keyframe<f32>> {
            match k.data.as_numbers().as_deref() {
                Some([v]) => Ok(Keyframe::new(k.start_frame, *v)),
                other => Err(ModelError::KeyValueArity {
                    property: name.to_string(),
                    expected: "1".to_string(),
                    found: other.map_or(0, <[f32]>::len),
                }),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    PropertyTrack::new(keyframes, load_curves(&raw.timing_curves)?)
}

/// Builds the track for one `feature_animations` / `animations` entry.
fn load_property(p: &KfProperty) -> Result<FeatureTrack> {
    let name = p.property.as_str();
    let curves = load_curves(&p.timing_curves)?;
    let pivot = legacy_pivot(p)?;
    if p.anchor.is_some() && !matches!(name, "SCALE" | "ROTATION") {
        warn!(property = name, "anchor only applies to SCALE and ROTATION, ignoring it");
    }

    let arity = |expected: &str, found: usize| ModelError::KeyValueArity {
        property: name.to_string(),
        expected: expected.to_string(),
        found,
    };
    let numbers = |data: &KfData| data.as_numbers().ok_or_else(|| arity("numbers", 0));
    let vec2 = |data: &KfData| -> Result<Vec2> {
        match numbers(data)?.as_slice() {
            [x, y] => Ok(Vec2::new(*x, *y)),
            other => Err(arity("2", other.len())),
        }
    };
    let scalar = |data: &KfData| -> Result<f32> {
        match numbers(data)?.as_slice() {
            [v] => Ok(*v),
            other => Err(arity("1", other.len())),
        }
    };
    let color = |data: &KfData| -> Result<Color> {
        data.as_text()
            .ok_or_else(|| arity("a color string", 0))?
            .parse()
    };

    Ok(match name {
        "ANCHOR_POINT" => FeatureTrack::Matrix(MatrixTrack::AnchorPoint(build(p, curves, &vec2)?)),
        "SCALE" => FeatureTrack::Matrix(MatrixTrack::Scale {
            track: build(p, curves, &vec2)?,
            pivot,
        }),
        "POSITION" => FeatureTrack::Matrix(MatrixTrack::Position(build(p, curves, &vec2)?)),
        "ROTATION" => {
            let rotation = |data: &KfData| -> Result<Vec3> {
                match numbers(data)?.as_slice() {
                    [deg] => Ok(Vec3::new(*deg, pivot.x, pivot.y)),
                    [deg, px, py] => Ok(Vec3::new(*deg, *px, *py)),
                    other => Err(arity("1 or 3", other.len())),
                }
            };
            FeatureTrack::Matrix(MatrixTrack::Rotation(build(p, curves, &rotation)?))
        }
        "X_POSITION" => FeatureTrack::Matrix(MatrixTrack::XPosition(build(p, curves, &scalar)?)),
        "Y_POSITION" => FeatureTrack::Matrix(MatrixTrack::YPosition(build(p, curves, &scalar)?)),
        "STROKE_WIDTH" => FeatureTrack::StrokeWidth(build(p, curves, &scalar)?),
        "OPACITY" => FeatureTrack::Opacity(build(p, curves, &scalar)?),
        "STROKE_COLOR" => FeatureTrack::StrokeColor(build(p, curves, &color)?),
        "FILL_COLOR" => FeatureTrack::FillColor(build(p, curves, &color)?),
        other => return Err(ModelError::UnknownProperty(other.to_string())),
    })
}

fn build<V>(
    p: &KfProperty,
    curves: Vec<TimingCurve>,
    convert: &dyn Fn(&KfData) -> Result<V>,
) -> Result<PropertyTrack<V>> {
    let keyframes = p
        .key_values
        .iter()
        .map(|k| -> Result<Keyframe<V>> { Ok(Keyframe::new(k.start_frame, convert(&k.data)?)) })
        .collect::<Result<Vec<_>>>()?;
    PropertyTrack::new(keyframes, curves)
}

/// The deprecated non-keyframed `anchor` used as scale/rotation pivot.
fn legacy_pivot(p: &KfProperty) -> Result<Vec2> {
    match p.anchor.as_deref() {
        None => Ok(Vec2::ZERO),
        Some([x, y]) => Ok(Vec2::new(*x, *y)),
        Some(other) => Err(ModelError::KeyValueArity {
            property: format!("{} anchor", p.property),
            expected: "2".to_string(),
            found: other.len(),
        }),
    }
}

fn decode_bitmaps(raw: &BTreeMap<String, String>) -> Result<BTreeMap<String, Vec<u8>>> {
    raw.iter()
        .map(|(name, encoded)| {
            // Accept both bare base64 and data URIs.
            let payload = match encoded.split_once(";base64,") {
                Some((_, data)) => data,
                None => encoded.as_str(),
            };
            BASE64_STANDARD
                .decode(payload.trim())
                .map(|bytes| (name.clone(), bytes))
                .map_err(|e| ModelError::InvalidBitmap {
                    name: name.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}
