//! Trim Paths: draws only a window of a path's length.

use crate::animatable::PropertyTrack;
use crate::path::KfPath;
use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathSeg, Point};

const ARCLEN_ACCURACY: f64 = 1e-3;

/// Animated trim window. `start` and `end` are percentages of the path
/// length, `offset` shifts the window by degrees of a full turn.
#[derive(Debug)]
pub struct PathTrim {
    start: PropertyTrack<f32>,
    end: PropertyTrack<f32>,
    offset: PropertyTrack<f32>,
}

impl PathTrim {
    pub fn new(
        start: PropertyTrack<f32>,
        end: PropertyTrack<f32>,
        offset: PropertyTrack<f32>,
    ) -> Self {
        Self { start, end, offset }
    }

    /// The visible window as fractions of the path length. The first value
    /// lies in `[0, 1)`; the second may pass 1 when the window wraps around
    /// the end of the path, but never by more than a full length.
    pub fn window(&self, progress: f32) -> (f64, f64) {
        let start = (self.start.value_at(progress) / 100.0).clamp(0.0, 1.0) as f64;
        let end = (self.end.value_at(progress) / 100.0).clamp(0.0, 1.0) as f64;
        let offset = (self.offset.value_at(progress) / 360.0) as f64;
        let (low, high) = if start <= end { (start, end) } else { (end, start) };
        let from = (low + offset).rem_euclid(1.0);
        (from, from + (high - low))
    }

    /// Replaces `path` with its visible window at `progress`.
    pub fn apply(&self, progress: f32, path: &mut KfPath) {
        let (from, to) = self.window(progress);
        if to - from >= 1.0 {
            return;
        }
        let source = path.as_bez_path();
        let mut out = BezPath::new();
        if to <= 1.0 {
            trim_into(source, from, to, &mut out);
        } else {
            trim_into(source, from, 1.0, &mut out);
            trim_into(source, 0.0, to - 1.0, &mut out);
        }
        path.replace(out);
    }
}

/// Appends the part of `path` between the length fractions `from` and `to`.
/// Subpaths are measured as one continuous length.
pub fn trim_into(path: &BezPath, from: f64, to: f64, out: &mut BezPath) {
    let segments: Vec<(PathSeg, f64)> = path
        .segments()
        .map(|seg| (seg, seg.arclen(ARCLEN_ACCURACY)))
        .collect();
    let total: f64 = segments.iter().map(|(_, len)| len).sum();
    if total <= 0.0 || to <= from {
        return;
    }
    let (from, to) = (from * total, to * total);

    let mut pen: Option<Point> = None;
    let mut walked = 0.0;
    for (seg, len) in segments {
        let seg_start = walked;
        walked += len;
        if len <= 0.0 || walked <= from || seg_start >= to {
            continue;
        }
        let t0 = if from > seg_start {
            seg.inv_arclen(from - seg_start, ARCLEN_ACCURACY).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let t1 = if to < walked {
            seg.inv_arclen(to - seg_start, ARCLEN_ACCURACY).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let piece = seg.subsegment(t0..t1);
        if pen != Some(piece.start()) {
            out.move_to(piece.start());
        }
        match piece {
            PathSeg::Line(l) => out.line_to(l.p1),
            PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
            PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
        }
        pen = Some(piece.end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::Keyframe;
    use glam::Vec2;
    use kurbo::PathEl;

    fn create_test_trim(start: f32, end: f32, offset: f32) -> PathTrim {
        PathTrim::new(
            PropertyTrack::constant(start),
            PropertyTrack::constant(end),
            PropertyTrack::constant(offset),
        )
    }

    fn line(points: &[Vec2]) -> KfPath {
        let mut path = KfPath::new();
        path.move_to(points[0]);
        for p in &points[1..] {
            path.line_to(*p);
        }
        path
    }

    fn assert_point(actual: Point, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() < 1e-4 && (actual.y - y).abs() < 1e-4,
            "expected ({x}, {y}), got {actual:?}"
        );
    }

    #[test]
    fn test_trim_keeps_first_half_of_line() {
        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        create_test_trim(0.0, 50.0, 0.0).apply(0.0, &mut path);
        let els = path.as_bez_path().elements();
        assert_eq!(els.len(), 2);
        assert_eq!(els[0], PathEl::MoveTo(Point::ZERO));
        assert!((path.last_point() - Vec2::new(5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_trim_continues_across_segments() {
        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]);
        create_test_trim(0.0, 75.0, 0.0).apply(0.0, &mut path);
        let els = path.as_bez_path().elements();
        // One contour: move, full first line, half of the second.
        assert_eq!(els.len(), 3);
        let PathEl::LineTo(end) = els[2] else {
            panic!("expected a line, got {:?}", els[2]);
        };
        assert_point(end, 10.0, 5.0);
    }

    #[test]
    fn test_offset_shifts_window() {
        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        create_test_trim(0.0, 50.0, 90.0).apply(0.0, &mut path);
        let els = path.as_bez_path().elements();
        let PathEl::MoveTo(start) = els[0] else {
            panic!("expected a move, got {:?}", els[0]);
        };
        assert_point(start, 2.5, 0.0);
        assert!((path.last_point() - Vec2::new(7.5, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_window_wraps_past_path_end() {
        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        create_test_trim(0.0, 50.0, 270.0).apply(0.0, &mut path);
        let els = path.as_bez_path().elements();
        assert_eq!(els.len(), 4);
        let (PathEl::MoveTo(a), PathEl::LineTo(b), PathEl::MoveTo(c), PathEl::LineTo(d)) =
            (els[0], els[1], els[2], els[3])
        else {
            panic!("expected two contours, got {els:?}");
        };
        assert_point(a, 7.5, 0.0);
        assert_point(b, 10.0, 0.0);
        assert_point(c, 0.0, 0.0);
        assert_point(d, 2.5, 0.0);
    }

    #[test]
    fn test_reversed_and_full_windows() {
        let trim = create_test_trim(80.0, 20.0, -360.0);
        let (from, to) = trim.window(0.0);
        assert!((from - 0.2).abs() < 1e-6 && (to - 0.8).abs() < 1e-6);

        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        create_test_trim(0.0, 100.0, 45.0).apply(0.0, &mut path);
        assert_eq!(path.as_bez_path().elements().len(), 2);
        assert_eq!(path.last_point(), Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_empty_window_clears_path() {
        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        create_test_trim(40.0, 40.0, 0.0).apply(0.0, &mut path);
        assert!(path.is_empty());
    }

    #[test]
    fn test_trim_measures_curves_by_length() {
        let mut path = KfPath::new();
        path.move_to(Vec2::ZERO);
        path.quad_to(Vec2::new(5.0, 10.0), Vec2::new(10.0, 0.0));
        create_test_trim(0.0, 50.0, 0.0).apply(0.0, &mut path);
        // The arch is symmetric, so half its length ends at its apex.
        let end = path.last_point();
        assert!((end.x - 5.0).abs() < 1e-2, "got {end:?}");
        assert!((end.y - 5.0).abs() < 1e-2, "got {end:?}");
    }

    #[test]
    fn test_animated_end_grows_path() {
        let end = PropertyTrack::new(
            vec![Keyframe::new(0, 0.0), Keyframe::new(10, 100.0)],
            vec![crate::timing::TimingCurve::linear()],
        )
        .unwrap();
        let trim = PathTrim::new(PropertyTrack::constant(0.0), end, PropertyTrack::constant(0.0));
        let mut path = line(&[Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        trim.apply(3.0, &mut path);
        assert!((path.last_point() - Vec2::new(3.0, 0.0)).length() < 1e-4);
    }
}
