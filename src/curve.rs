// ==============================================================================
// curve.rs - RESPONSE CURVES (STIFFNESS / STICK SHAPING)
// ------------------------------------------------------------------------------
// Tuning curves are plain data: a list of (x, y) keys sorted by x, evaluated
// with piecewise-linear interpolation and clamped to the end keys outside the
// key range.
//
// Used by:
// - suspension stiffness:  F = stiffness_curve(compression) * stiffness
// - stickiness shaping:    F_stick *= stick_curve(compression)
//
// In config files a curve is written as [[x, y], [x, y], ...].
// ==============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{TreadError, TreadResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f32; 2]>", into = "Vec<[f32; 2]>")]
pub struct ResponseCurve {
    keys: Vec<[f32; 2]>,
}

impl ResponseCurve {
    /// Build a curve from control points. Keys must be finite with strictly
    /// increasing x.
    pub fn new(keys: Vec<[f32; 2]>) -> TreadResult<Self> {
        if keys.is_empty() {
            return Err(TreadError::InvalidCurve("curve needs at least one key".into()));
        }
        if let Some(bad) = keys.iter().find(|[x, y]| !x.is_finite() || !y.is_finite()) {
            return Err(TreadError::InvalidCurve(format!("non-finite key {bad:?}")));
        }
        if let Some(pair) = keys.windows(2).find(|w| w[1][0] <= w[0][0]) {
            return Err(TreadError::InvalidCurve(format!(
                "keys must be sorted by x: {:?} then {:?}",
                pair[0], pair[1]
            )));
        }
        Ok(Self { keys })
    }

    /// Flat response: always `y`.
    pub fn constant(y: f32) -> Self {
        Self { keys: vec![[0.0, y]] }
    }

    /// Straight line from (0, y0) to (1, y1).
    pub fn linear(y0: f32, y1: f32) -> Self {
        Self { keys: vec![[0.0, y0], [1.0, y1]] }
    }

    pub fn keys(&self) -> &[[f32; 2]] {
        &self.keys
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return 0.0,
        };

        if x.is_nan() || x <= first[0] {
            return first[1];
        }
        if x >= last[0] {
            return last[1];
        }

        // first key with kx > x; guaranteed to exist and be > 0 here
        let hi = self.keys.partition_point(|k| k[0] <= x);
        let [x0, y0] = self.keys[hi - 1];
        let [x1, y1] = self.keys[hi];

        let t = (x - x0) / (x1 - x0);
        y0 + (y1 - y0) * t
    }
}

impl TryFrom<Vec<[f32; 2]>> for ResponseCurve {
    type Error = TreadError;

    fn try_from(keys: Vec<[f32; 2]>) -> TreadResult<Self> {
        Self::new(keys)
    }
}

impl From<ResponseCurve> for Vec<[f32; 2]> {
    fn from(curve: ResponseCurve) -> Self {
        curve.keys
    }
}
