//! Height remapping curves used when turning normalized heights into mesh
//! elevation.

use serde::{Deserialize, Serialize};

/// Remaps a normalized height `t` in [0, 1]. Expected to be monotonic.
pub trait HeightCurve {
    fn evaluate(&self, t: f32) -> f32;
}

impl<F> HeightCurve for F
where
    F: Fn(f32) -> f32,
{
    fn evaluate(&self, t: f32) -> f32 {
        self(t)
    }
}

/// Identity curve.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearCurve;

impl HeightCurve for LinearCurve {
    fn evaluate(&self, t: f32) -> f32 {
        t
    }
}

/// One control point of a [`KeyframeCurve`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

/// Piecewise linear curve through a list of keyframes.
///
/// Inputs before the first or after the last keyframe evaluate to the value of
/// that keyframe. An empty curve behaves like the identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct KeyframeCurve {
    keys: Vec<Keyframe>,
}

impl KeyframeCurve {
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.retain(|k| k.time.is_finite() && k.value.is_finite());
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Curve from `(time, value)` pairs.
    pub fn from_points(points: &[(f32, f32)]) -> Self {
        Self::new(points.iter().map(|&(time, value)| Keyframe { time, value }).collect())
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }
}

impl Default for KeyframeCurve {
    fn default() -> Self {
        Self::from_points(&[(0.0, 0.0), (1.0, 1.0)])
    }
}

impl From<Vec<Keyframe>> for KeyframeCurve {
    fn from(keys: Vec<Keyframe>) -> Self {
        Self::new(keys)
    }
}

impl From<KeyframeCurve> for Vec<Keyframe> {
    fn from(curve: KeyframeCurve) -> Self {
        curve.keys
    }
}

impl HeightCurve for KeyframeCurve {
    fn evaluate(&self, t: f32) -> f32 {
        let (Some(first), Some(last)) = (self.keys.first(), self.keys.last()) else {
            return t;
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; guaranteed to be in 1..len here.
        let upper = self.keys.partition_point(|k| k.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let span = b.time - a.time;
        if span <= 0.0 {
            return b.value;
        }
        let f = (t - a.time) / span;
        a.value + (b.value - a.value) * f
    }
}
