use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfDocument {
    #[serde(default)]
    pub key: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub frame_rate: i32,
    pub animation_frame_count: i32,
    pub canvas_size: Vec<f32>,
    #[serde(default)]
    pub features: Vec<KfFeature>,
    #[serde(default)]
    pub animation_groups: Vec<KfAnimationGroup>,
    #[serde(default)]
    pub bitmaps: BTreeMap<String, String>, // name -> base64 PNG
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfAnimationGroup {
    pub group_id: i64,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub parent_group: Option<i64>, // 0 or absent = root
    #[serde(default)]
    pub animations: Vec<KfProperty>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KfFeature {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>, // Key into the renderer's feature config table
    #[serde(default)]
    pub fill_color: Option<String>,
    #[serde(default)]
    pub stroke_color: Option<String>,
    #[serde(default)]
    pub stroke_width: Option<f32>,
    #[serde(default)]
    pub stroke_line_cap: Option<String>,
    #[serde(default)]
    pub from_frame: Option<f32>,
    #[serde(default)]
    pub to_frame: Option<f32>,
    #[serde(default)]
    pub size: Option<Vec<f32>>,
    #[serde(default)]
    pub animation_group: Option<i64>,
    #[serde(default)]
    pub feature_animations: Vec<KfProperty>,
    #[serde(default)]
    pub timing_curves: Vec<KfTimingCurve>,
    #[serde(default)]
    pub key_frames: Vec<KfValue<Vec<String>>>,
    #[serde(default)]
    pub effects: Option<KfEffects>,
    #[serde(default)]
    pub masking: Option<Box<KfFeature>>,
    #[serde(default)]
    pub backed_image: Option<String>,
    #[serde(default)]
    pub path_trim: Option<KfPathTrim>,
}

/// `[[x1, y1], [x2, y2]]` control points of a cubic easing curve.
/// Shape is validated by the engine, not here.
pub type KfTimingCurve = Vec<Vec<f32>>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfValue<T> {
    #[serde(deserialize_with = "deserialize_frame_number")]
    pub start_frame: i32,
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfAnimatable<T> {
    #[serde(default = "Vec::new")]
    pub key_values: Vec<KfValue<T>>,
    #[serde(default)]
    pub timing_curves: Vec<KfTimingCurve>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfProperty {
    pub property: String,
    #[serde(default)]
    pub key_values: Vec<KfValue<KfData>>,
    #[serde(default)]
    pub timing_curves: Vec<KfTimingCurve>,
    #[serde(default)]
    pub anchor: Option<Vec<f32>>,
}

/// Raw key value payload. Exporters write `[n, ...]` for numeric properties,
/// occasionally a bare number, and hex strings for color properties.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum KfData {
    Numbers(Vec<f32>),
    Number(f32),
    Text(String),
}

impl KfData {
    pub fn as_numbers(&self) -> Option<Vec<f32>> {
        match self {
            KfData::Numbers(v) => Some(v.clone()),
            KfData::Number(n) => Some(vec![*n]),
            KfData::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KfData::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct KfEffects {
    #[serde(default)]
    pub gradient: Option<KfGradient>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfGradient {
    #[serde(default)]
    pub gradient_type: Option<String>, // "linear" | "radial"; only linear is rendered
    #[serde(default)]
    pub color_start: Option<KfAnimatable<String>>,
    #[serde(default)]
    pub color_end: Option<KfAnimatable<String>>,
}

/// Trim Paths: start and end in percent of the path length, offset in degrees.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct KfPathTrim {
    pub path_trim_start: KfAnimatable<KfData>,
    pub path_trim_end: KfAnimatable<KfData>,
    pub path_trim_offset: KfAnimatable<KfData>,
}

// After Effects exports frame numbers as JSON numbers that are sometimes
// written with a trailing `.0`. Accept those, reject real fractions.
fn deserialize_frame_number<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if raw.fract() != 0.0 || raw < i32::MIN as f64 || raw > i32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "start_frame must be an integer frame number, got {raw}"
        )));
    }
    Ok(raw as i32)
}
