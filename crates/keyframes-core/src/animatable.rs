use crate::error::{ModelError, Result};
use crate::timing::TimingCurve;
use glam::{Vec2, Vec3};

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }
}

impl Interpolatable for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::lerp(*self, *other, t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe<V> {
    pub frame: i32,
    pub value: V,
}

impl<V> Keyframe<V> {
    pub fn new(frame: i32, value: V) -> Self {
        Self { frame, value }
    }
}

/// The pair of keyframes surrounding a progress value and the eased
/// fraction between them. `b` is `None` when progress is clamped to a
/// boundary keyframe.
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a, V> {
    pub a: &'a V,
    pub b: Option<&'a V>,
    pub t: f32,
}

/// Keyframes for one property plus one easing curve per keyframe interval.
#[derive(Debug, Clone)]
pub struct PropertyTrack<V> {
    keyframes: Vec<Keyframe<V>>,
    curves: Vec<TimingCurve>,
}

impl<V> PropertyTrack<V> {
    pub fn new(keyframes: Vec<Keyframe<V>>, curves: Vec<TimingCurve>) -> Result<Self> {
        if keyframes.is_empty() {
            return Err(ModelError::EmptyTrack);
        }
        for pair in keyframes.windows(2) {
            if pair[1].frame <= pair[0].frame {
                return Err(ModelError::NonIncreasingKeyframes {
                    previous: pair[0].frame,
                    next: pair[1].frame,
                });
            }
        }
        let expected = keyframes.len() - 1;
        if curves.len() != expected {
            return Err(ModelError::TimingCurveCount {
                expected,
                found: curves.len(),
            });
        }
        Ok(Self { keyframes, curves })
    }

    /// A single keyframe at frame 0.
    pub fn constant(value: V) -> Self {
        Self {
            keyframes: vec![Keyframe::new(0, value)],
            curves: Vec::new(),
        }
    }

    pub fn keyframes(&self) -> &[Keyframe<V>] {
        &self.keyframes
    }

    pub fn first_frame(&self) -> i32 {
        self.keyframes[0].frame
    }

    pub fn last_frame(&self) -> i32 {
        self.keyframes[self.keyframes.len() - 1].frame
    }

    pub fn sample(&self, progress: f32) -> Sample<'_, V> {
        let first = &self.keyframes[0];
        let last = &self.keyframes[self.keyframes.len() - 1];

        if self.curves.is_empty() || progress.is_nan() || progress <= first.frame as f32 {
            return Sample {
                a: &first.value,
                b: None,
                t: 0.0,
            };
        }
        if progress >= last.frame as f32 {
            return Sample {
                a: &last.value,
                b: None,
                t: 0.0,
            };
        }

        // Tracks hold a handful of keyframes; a scan keeps ties deterministic.
        let index = self
            .keyframes
            .windows(2)
            .position(|pair| pair[0].frame as f32 <= progress && progress < pair[1].frame as f32)
            .unwrap_or(self.curves.len() - 1);

        let this = &self.keyframes[index];
        let next = &self.keyframes[index + 1];
        let p = (progress - this.frame as f32) / (next.frame - this.frame) as f32;
        Sample {
            a: &this.value,
            b: Some(&next.value),
            t: self.curves[index].ease(p),
        }
    }

    /// Converts every keyframe value, keeping frames and curves.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(V) -> std::result::Result<U, E>,
    ) -> std::result::Result<PropertyTrack<U>, E> {
        let mut keyframes = Vec::with_capacity(self.keyframes.len());
        for k in self.keyframes {
            keyframes.push(Keyframe::new(k.frame, f(k.value)?));
        }
        Ok(PropertyTrack {
            keyframes,
            curves: self.curves,
        })
    }
}

impl<V: Interpolatable> PropertyTrack<V> {
    pub fn value_at(&self, progress: f32) -> V {
        let sample = self.sample(progress);
        match sample.b {
            Some(b) => sample.a.lerp(b, sample.t),
            None => sample.a.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_track(frames: &[(i32, f32)]) -> PropertyTrack<f32> {
        let keyframes = frames.iter().map(|&(f, v)| Keyframe::new(f, v)).collect();
        let curves = (1..frames.len()).map(|_| TimingCurve::linear()).collect();
        PropertyTrack::new(keyframes, curves).unwrap()
    }

    #[test]
    fn test_sample_clamps_outside_range() {
        let track = linear_track(&[(10, 1.0), (20, 2.0)]);
        let before = track.sample(-5.0);
        assert_eq!(*before.a, 1.0);
        assert!(before.b.is_none());
        assert_eq!(before.t, 0.0);

        let after = track.sample(100.0);
        assert_eq!(*after.a, 2.0);
        assert!(after.b.is_none());
        assert_eq!(track.value_at(10.0), 1.0);
        assert_eq!(track.value_at(20.0), 2.0);
    }

    #[test]
    fn test_single_keyframe_is_constant() {
        let track = PropertyTrack::constant(7.0f32);
        for p in [-3.0, 0.0, 5.0, 1000.0] {
            let sample = track.sample(p);
            assert_eq!(*sample.a, 7.0);
            assert!(sample.b.is_none());
            assert_eq!(sample.t, 0.0);
        }
    }

    #[test]
    fn test_sample_finds_interval() {
        let track = linear_track(&[(0, 0.0), (10, 10.0), (30, 50.0)]);
        assert_eq!(track.value_at(5.0), 5.0);
        assert_eq!(track.value_at(10.0), 10.0);
        assert_eq!(track.value_at(20.0), 30.0);
        let sample = track.sample(10.0);
        assert_eq!(*sample.a, 10.0);
        assert_eq!(sample.b.copied(), Some(50.0));
        assert_eq!(sample.t, 0.0);
    }

    #[test]
    fn test_construction_validation() {
        let err = PropertyTrack::new(
            vec![Keyframe::new(0, 0.0f32), Keyframe::new(0, 1.0)],
            vec![TimingCurve::linear()],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::NonIncreasingKeyframes { .. }));

        let err = PropertyTrack::new(
            vec![Keyframe::new(0, 0.0f32), Keyframe::new(4, 1.0)],
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::TimingCurveCount {
                expected: 1,
                found: 0
            }
        );

        let err = PropertyTrack::<f32>::new(Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(err, ModelError::EmptyTrack);
    }

    #[test]
    fn test_vec2_track() {
        let track = PropertyTrack::new(
            vec![
                Keyframe::new(0, Vec2::new(100.0, 100.0)),
                Keyframe::new(10, Vec2::new(200.0, 200.0)),
            ],
            vec![TimingCurve::linear()],
        )
        .unwrap();
        assert_eq!(track.value_at(5.0), Vec2::new(150.0, 150.0));
    }
}
