//! Matrix-producing tracks.
//!
//! Every track post-multiplies the matrix it is given (`m = op * m`), so
//! tracks applied later act in the coordinate space produced by earlier
//! ones. Tracks of an entity are always applied in [`MatrixTrack::order`].

use crate::animatable::PropertyTrack;
use glam::{Mat3, Vec2, Vec3};
use kurbo::Affine;

#[derive(Debug, Clone)]
pub enum MatrixTrack {
    /// Translates by the negated anchor so later ops act around it.
    AnchorPoint(PropertyTrack<Vec2>),
    /// Percent scale `[sx, sy]` about a fixed pivot.
    Scale {
        track: PropertyTrack<Vec2>,
        pivot: Vec2,
    },
    /// `(degrees, pivot_x, pivot_y)`, clockwise in y-down space.
    Rotation(PropertyTrack<Vec3>),
    /// Translation relative to the first keyframe, so a track that never
    /// moves leaves the matrix untouched.
    Position(PropertyTrack<Vec2>),
    XPosition(PropertyTrack<f32>),
    YPosition(PropertyTrack<f32>),
}

impl MatrixTrack {
    pub fn order(&self) -> u8 {
        match self {
            MatrixTrack::AnchorPoint(_) => 0,
            MatrixTrack::Scale { .. } => 1,
            MatrixTrack::Rotation(_) => 2,
            MatrixTrack::Position(_) => 3,
            MatrixTrack::XPosition(_) => 4,
            MatrixTrack::YPosition(_) => 5,
        }
    }

    pub fn property_name(&self) -> &'static str {
        match self {
            MatrixTrack::AnchorPoint(_) => "ANCHOR_POINT",
            MatrixTrack::Scale { .. } => "SCALE",
            MatrixTrack::Rotation(_) => "ROTATION",
            MatrixTrack::Position(_) => "POSITION",
            MatrixTrack::XPosition(_) => "X_POSITION",
            MatrixTrack::YPosition(_) => "Y_POSITION",
        }
    }

    pub fn apply(&self, progress: f32, m: &mut Mat3) {
        let op = match self {
            MatrixTrack::AnchorPoint(track) => Mat3::from_translation(-track.value_at(progress)),
            MatrixTrack::Scale { track, pivot } => {
                let scale = track.value_at(progress) / 100.0;
                about(*pivot, Mat3::from_scale(scale))
            }
            MatrixTrack::Rotation(track) => {
                let v = track.value_at(progress);
                about(Vec2::new(v.y, v.z), Mat3::from_angle(v.x.to_radians()))
            }
            MatrixTrack::Position(track) => {
                let origin = track.keyframes().first().map_or(Vec2::ZERO, |k| k.value);
                Mat3::from_translation(track.value_at(progress) - origin)
            }
            MatrixTrack::XPosition(track) => {
                Mat3::from_translation(Vec2::new(track.value_at(progress), 0.0))
            }
            MatrixTrack::YPosition(track) => {
                Mat3::from_translation(Vec2::new(0.0, track.value_at(progress)))
            }
        };
        *m = op * *m;
    }
}

/// Sorts tracks into application order.
pub fn sort_tracks(tracks: &mut [MatrixTrack]) {
    tracks.sort_by_key(MatrixTrack::order);
}

/// Applies `tracks` (already sorted) to `m` in order.
pub fn apply_tracks(tracks: &[MatrixTrack], progress: f32, m: &mut Mat3) {
    for track in tracks {
        track.apply(progress, m);
    }
}

fn about(pivot: Vec2, op: Mat3) -> Mat3 {
    if pivot == Vec2::ZERO {
        return op;
    }
    Mat3::from_translation(pivot) * op * Mat3::from_translation(-pivot)
}

/// Average absolute axis scale, used to scale stroke widths.
pub fn uniform_scale(m: &Mat3) -> f32 {
    (m.x_axis.x.abs() + m.y_axis.y.abs()) / 2.0
}

pub fn to_affine(m: &Mat3) -> Affine {
    let c = m.to_cols_array();
    Affine::new([
        c[0] as f64,
        c[1] as f64,
        c[3] as f64,
        c[4] as f64,
        c[6] as f64,
        c[7] as f64,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::Keyframe;
    use crate::timing::TimingCurve;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_scale_interpolates_percent() {
        let track = PropertyTrack::new(
            vec![
                Keyframe::new(0, Vec2::splat(100.0)),
                Keyframe::new(10, Vec2::splat(200.0)),
            ],
            vec![TimingCurve::linear()],
        )
        .unwrap();
        let scale = MatrixTrack::Scale {
            track,
            pivot: Vec2::ZERO,
        };
        let mut m = Mat3::IDENTITY;
        scale.apply(5.0, &mut m);
        assert!((m.x_axis.x - 1.5).abs() < 1e-6);
        assert!((m.y_axis.y - 1.5).abs() < 1e-6);
        assert!((uniform_scale(&m) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_is_clockwise_in_screen_space() {
        let rotation = MatrixTrack::Rotation(PropertyTrack::constant(Vec3::new(90.0, 0.0, 0.0)));
        let mut m = Mat3::IDENTITY;
        rotation.apply(0.0, &mut m);
        assert!(approx(m.transform_point2(Vec2::X), Vec2::Y));
    }

    #[test]
    fn test_rotation_about_pivot_keeps_pivot_fixed() {
        let rotation = MatrixTrack::Rotation(PropertyTrack::constant(Vec3::new(45.0, 10.0, 20.0)));
        let mut m = Mat3::IDENTITY;
        rotation.apply(0.0, &mut m);
        assert!(approx(m.transform_point2(Vec2::new(10.0, 20.0)), Vec2::new(10.0, 20.0)));
    }

    #[test]
    fn test_tracks_apply_in_fixed_order() {
        let mut tracks = vec![
            MatrixTrack::XPosition(PropertyTrack::constant(50.0)),
            MatrixTrack::Scale {
                track: PropertyTrack::constant(Vec2::splat(200.0)),
                pivot: Vec2::ZERO,
            },
            MatrixTrack::AnchorPoint(PropertyTrack::constant(Vec2::new(5.0, 5.0))),
        ];
        sort_tracks(&mut tracks);
        assert_eq!(tracks[0].property_name(), "ANCHOR_POINT");
        let mut m = Mat3::IDENTITY;
        apply_tracks(&tracks, 0.0, &mut m);
        // anchor first, then scale, then translate
        assert!(approx(m.transform_point2(Vec2::new(5.0, 5.0)), Vec2::new(50.0, 0.0)));
        assert!(approx(m.transform_point2(Vec2::new(6.0, 5.0)), Vec2::new(52.0, 0.0)));
    }

    #[test]
    fn test_position_is_relative_to_first_keyframe() {
        let position = MatrixTrack::Position(
            PropertyTrack::new(
                vec![
                    Keyframe::new(0, Vec2::new(50.0, 50.0)),
                    Keyframe::new(10, Vec2::new(60.0, 50.0)),
                ],
                vec![TimingCurve::linear()],
            )
            .unwrap(),
        );
        let mut m = Mat3::IDENTITY;
        position.apply(0.0, &mut m);
        assert_eq!(m, Mat3::IDENTITY);

        let mut m = Mat3::IDENTITY;
        position.apply(10.0, &mut m);
        assert_eq!(m.transform_point2(Vec2::new(1.0, 0.0)), Vec2::new(11.0, 0.0));
    }

    #[test]
    fn test_single_keyframe_position_does_not_move() {
        let position = MatrixTrack::Position(PropertyTrack::constant(Vec2::new(80.0, 80.0)));
        let mut m = Mat3::from_scale(Vec2::splat(2.0));
        position.apply(3.0, &mut m);
        assert_eq!(m, Mat3::from_scale(Vec2::splat(2.0)));
    }

    #[test]
    fn test_to_affine_matches_mat3() {
        let m = Mat3::from_translation(Vec2::new(3.0, 4.0)) * Mat3::from_angle(0.3);
        let p = Vec2::new(2.0, -1.0);
        let expected = m.transform_point2(p);
        let actual = to_affine(&m) * kurbo::Point::new(p.x as f64, p.y as f64);
        assert!((actual.x as f32 - expected.x).abs() < 1e-5);
        assert!((actual.y as f32 - expected.y).abs() < 1e-5);
    }
}
