//! Cubic-bezier easing curves sampled by arc length.

use crate::error::{ModelError, Result};
use glam::Vec2;
use kurbo::{CubicBez, ParamCurve, Point};

/// Arc-length distance between two stored samples.
const PRECISION: f64 = 0.03;
/// Lower bound on the sample count; the diagonal alone is ~1.41 long.
const MIN_SAMPLES: usize = 31;
/// Upper bound, reached only by curves with far-flung control points.
const MAX_SAMPLES: usize = 1024;
/// Parameter subdivisions used to measure arc length.
const PARAM_STEPS: usize = 4096;

/// An easing curve from (0,0) to (1,1) shaped by two control points.
///
/// The curve is flattened once at construction into monotonically spaced
/// `(x, y)` samples; evaluation is a binary search over `x` followed by a
/// linear interpolation of `y`.
#[derive(Debug, Clone)]
pub struct TimingCurve {
    xs: Box<[f32]>,
    ys: Box<[f32]>,
    linear: bool,
}

impl TimingCurve {
    pub fn new(c1: Vec2, c2: Vec2) -> Self {
        if is_on_diagonal(c1) && is_on_diagonal(c2) {
            return Self::linear();
        }

        let bez = CubicBez::new(
            Point::ZERO,
            Point::new(c1.x as f64, c1.y as f64),
            Point::new(c2.x as f64, c2.y as f64),
            Point::new(1.0, 1.0),
        );

        // Cumulative chord length over a fixed parameter grid.
        let mut lengths = Vec::with_capacity(PARAM_STEPS + 1);
        lengths.push(0.0);
        let mut previous = Point::ZERO;
        for step in 1..=PARAM_STEPS {
            let point = bez.eval(step as f64 / PARAM_STEPS as f64);
            let total = lengths[step - 1] + previous.distance(point);
            lengths.push(total);
            previous = point;
        }
        let length = lengths[PARAM_STEPS];
        let count = ((length / PRECISION) as usize + 1).clamp(MIN_SAMPLES, MAX_SAMPLES);

        let mut xs = Vec::with_capacity(count);
        let mut ys = Vec::with_capacity(count);
        let mut step = 0;
        for i in 0..count {
            let point = if i == 0 {
                Point::ZERO
            } else if i == count - 1 {
                Point::new(1.0, 1.0)
            } else {
                let distance = i as f64 * length / (count - 1) as f64;
                while step + 1 < PARAM_STEPS && lengths[step + 1] < distance {
                    step += 1;
                }
                let span = lengths[step + 1] - lengths[step];
                let within = if span > 0.0 {
                    (distance - lengths[step]) / span
                } else {
                    0.0
                };
                bez.eval((step as f64 + within) / PARAM_STEPS as f64)
            };
            xs.push(point.x as f32);
            ys.push(point.y as f32);
        }

        Self {
            xs: xs.into_boxed_slice(),
            ys: ys.into_boxed_slice(),
            linear: false,
        }
    }

    /// The identity curve. Evaluates to its input.
    pub fn linear() -> Self {
        Self {
            xs: Box::new([0.0, 1.0]),
            ys: Box::new([0.0, 1.0]),
            linear: true,
        }
    }

    /// Builds a curve from the wire shape `[[x1, y1], [x2, y2]]`.
    pub fn from_control_points(raw: &[Vec<f32>]) -> Result<Self> {
        match raw {
            [c1, c2] if c1.len() == 2 && c2.len() == 2 => Ok(Self::new(
                Vec2::new(c1[0], c1[1]),
                Vec2::new(c2[0], c2[1]),
            )),
            _ => Err(ModelError::InvalidTimingCurve(raw.to_vec())),
        }
    }

    pub fn is_linear(&self) -> bool {
        self.linear
    }

    pub fn sample_count(&self) -> usize {
        self.xs.len()
    }

    /// Maps linear progress `p` within a keyframe interval to eased progress.
    pub fn ease(&self, p: f32) -> f32 {
        if p.is_nan() || p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return 1.0;
        }
        if self.linear {
            return p;
        }

        let mut start = 0;
        let mut end = self.xs.len() - 1;
        while end - start > 1 {
            let mid = (start + end) / 2;
            if p < self.xs[mid] {
                end = mid;
            } else {
                start = mid;
            }
        }

        let x_range = self.xs[end] - self.xs[start];
        if x_range == 0.0 {
            return self.ys[start];
        }
        let fraction = (p - self.xs[start]) / x_range;
        self.ys[start] + fraction * (self.ys[end] - self.ys[start])
    }
}

fn is_on_diagonal(p: Vec2) -> bool {
    (p.x - p.y).abs() <= f32::EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve_is_identity() {
        let curve = TimingCurve::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
        assert!(curve.is_linear());
        for p in [0.1, 0.25, 0.5, 0.9] {
            assert_eq!(curve.ease(p), p);
        }
    }

    #[test]
    fn test_ease_clamps_input() {
        let curve = TimingCurve::new(Vec2::new(0.42, 0.0), Vec2::new(0.58, 1.0));
        assert_eq!(curve.ease(-1.0), 0.0);
        assert_eq!(curve.ease(2.0), 1.0);
        assert_eq!(curve.ease(f32::NAN), 0.0);
    }

    #[test]
    fn test_ease_in_out_is_symmetric() {
        let curve = TimingCurve::new(Vec2::new(0.42, 0.0), Vec2::new(0.58, 1.0));
        assert!(curve.sample_count() >= MIN_SAMPLES);
        assert!((curve.ease(0.5) - 0.5).abs() < 0.01);
        assert!(curve.ease(0.2) < 0.2);
        assert!(curve.ease(0.8) > 0.8);
    }

    #[test]
    fn test_ease_is_monotonic_for_standard_curve() {
        let curve = TimingCurve::new(Vec2::new(0.25, 0.1), Vec2::new(0.25, 1.0));
        let mut previous = 0.0;
        for i in 0..=100 {
            let value = curve.ease(i as f32 / 100.0);
            assert!(value + 1e-4 >= previous);
            previous = value;
        }
    }

    #[test]
    fn test_far_control_points_stay_bounded() {
        let curve = TimingCurve::new(Vec2::new(1e5, 0.0), Vec2::new(1.0, 1.0));
        assert_eq!(curve.sample_count(), MAX_SAMPLES);
        assert_eq!(curve.ease(0.0), 0.0);
        assert_eq!(curve.ease(1.0), 1.0);
        let mid = curve.ease(0.5);
        assert!((0.0..=1.0).contains(&mid));
    }

    #[test]
    fn test_sample_spacing_follows_arc_length() {
        // Straight but non-diagonal controls: length ~1.414, so 48 samples.
        let curve = TimingCurve::new(Vec2::new(0.2, 0.2001), Vec2::new(0.8, 0.8));
        assert!(!curve.is_linear());
        assert_eq!(curve.sample_count(), 48);
    }

    #[test]
    fn test_from_control_points_rejects_bad_shape() {
        assert!(TimingCurve::from_control_points(&[vec![0.0, 0.0]]).is_err());
        assert!(TimingCurve::from_control_points(&[vec![0.0], vec![1.0, 1.0]]).is_err());
        assert!(TimingCurve::from_control_points(&[vec![0.0, 0.0], vec![1.0, 1.0]]).is_ok());
    }
}
