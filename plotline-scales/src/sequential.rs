//! Sequential and diverging color scales over a continuous domain.

use serde_json::{json, Value};

use plotline_data::value_as_f64;

use crate::scheme::Interpolator;
use crate::Scale;

pub struct SequentialScale {
    domain: (f64, f64),
    interpolator: Interpolator,
}

impl SequentialScale {
    pub fn new(domain: (f64, f64), interpolator: Interpolator) -> Self {
        Self {
            domain,
            interpolator,
        }
    }
}

impl Scale for SequentialScale {
    fn scale_type(&self) -> &'static str {
        "sequential"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        let span = self.domain.1 - self.domain.0;
        let t = if span == 0.0 {
            0.5
        } else {
            (v - self.domain.0) / span
        };
        Some(json!((self.interpolator)(t)))
    }

    fn domain(&self) -> Vec<Value> {
        vec![json!(self.domain.0), json!(self.domain.1)]
    }

    fn range(&self) -> Vec<Value> {
        vec![
            json!((self.interpolator)(0.0)),
            json!((self.interpolator)(1.0)),
        ]
    }
}

/// Three-point domain: values on either side of the center map into the
/// lower and upper halves of the ramp.
pub struct DivergingScale {
    domain: (f64, f64, f64),
    interpolator: Interpolator,
}

impl DivergingScale {
    pub fn new(domain: (f64, f64, f64), interpolator: Interpolator) -> Self {
        Self {
            domain,
            interpolator,
        }
    }
}

impl Scale for DivergingScale {
    fn scale_type(&self) -> &'static str {
        "diverging"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        let (lo, mid, hi) = self.domain;
        let t = if v <= mid {
            let span = mid - lo;
            if span == 0.0 {
                0.5
            } else {
                0.5 * (v - lo) / span
            }
        } else {
            let span = hi - mid;
            if span == 0.0 {
                0.5
            } else {
                0.5 + 0.5 * (v - mid) / span
            }
        };
        Some(json!((self.interpolator)(t)))
    }

    fn domain(&self) -> Vec<Value> {
        vec![json!(self.domain.0), json!(self.domain.1), json!(self.domain.2)]
    }

    fn range(&self) -> Vec<Value> {
        vec![
            json!((self.interpolator)(0.0)),
            json!((self.interpolator)(1.0)),
        ]
    }
}
