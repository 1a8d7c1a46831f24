//! Continuous numeric families: linear, log, pow, sqrt.

use serde_json::{json, Value};

use plotline_data::value_as_f64;

use plotline_data::array;
use crate::Scale;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NumericKind {
    Linear,
    Log { base: f64 },
    Pow { exponent: f64 },
}

/// One struct covers the continuous numeric families; the transform kind
/// is the only difference between them.
#[derive(Debug, Clone)]
pub struct NumericScale {
    name: &'static str,
    kind: NumericKind,
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
    round: bool,
}

impl NumericScale {
    pub fn linear() -> Self {
        Self::with_kind("linear", NumericKind::Linear)
    }

    pub fn log(base: f64) -> Self {
        let mut scale = Self::with_kind("log", NumericKind::Log { base });
        // a log domain cannot touch zero
        scale.domain = (1.0, 10.0);
        scale
    }

    pub fn pow(exponent: f64) -> Self {
        Self::with_kind("pow", NumericKind::Pow { exponent })
    }

    pub fn sqrt() -> Self {
        Self::with_kind("sqrt", NumericKind::Pow { exponent: 0.5 })
    }

    fn with_kind(name: &'static str, kind: NumericKind) -> Self {
        Self {
            name,
            kind,
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            clamp: false,
            round: false,
        }
    }

    pub fn with_domain(mut self, domain: (f64, f64)) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range = range;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Extend the domain to tick-aligned bounds.
    pub fn nice(mut self, count: usize) -> Self {
        match self.kind {
            NumericKind::Log { base } => {
                // snap to whole powers of the base
                if self.domain.0 > 0.0 && self.domain.1 > 0.0 {
                    let lo = base.powf(self.domain.0.log(base).floor());
                    let hi = base.powf(self.domain.1.log(base).ceil());
                    self.domain = (lo, hi);
                }
            }
            _ => {
                self.domain = array::nice_interval(self.domain.0, self.domain.1, count);
            }
        }
        self
    }

    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        array::ticks(lo, hi, count)
    }

    fn transform(&self, v: f64) -> Option<f64> {
        match self.kind {
            NumericKind::Linear => Some(v),
            NumericKind::Log { base } => {
                if v > 0.0 {
                    Some(v.log(base))
                } else {
                    None
                }
            }
            NumericKind::Pow { exponent } => Some(v.signum() * v.abs().powf(exponent)),
        }
    }

    fn untransform(&self, t: f64) -> f64 {
        match self.kind {
            NumericKind::Linear => t,
            NumericKind::Log { base } => base.powf(t),
            NumericKind::Pow { exponent } => t.signum() * t.abs().powf(1.0 / exponent),
        }
    }

    /// Map a plain number through the scale.
    pub fn position(&self, v: f64) -> Option<f64> {
        let t0 = self.transform(self.domain.0)?;
        let t1 = self.transform(self.domain.1)?;
        let tv = self.transform(v)?;
        if t0 == t1 || !t0.is_finite() || !t1.is_finite() {
            return Some(self.range.0);
        }
        let normalized = (tv - t0) / (t1 - t0);
        let mut out = self.range.0 + normalized * (self.range.1 - self.range.0);
        if self.clamp {
            let (lo, hi) = if self.range.0 <= self.range.1 {
                self.range
            } else {
                (self.range.1, self.range.0)
            };
            out = out.clamp(lo, hi);
        }
        if self.round {
            out = out.round();
        }
        Some(out)
    }
}

impl Scale for NumericScale {
    fn scale_type(&self) -> &'static str {
        self.name
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        self.position(v).filter(|p| p.is_finite()).map(|p| json!(p))
    }

    fn domain(&self) -> Vec<Value> {
        vec![json!(self.domain.0), json!(self.domain.1)]
    }

    fn range(&self) -> Vec<Value> {
        vec![json!(self.range.0), json!(self.range.1)]
    }

    fn zero_position(&self) -> Option<f64> {
        match self.kind {
            NumericKind::Log { .. } => None,
            _ => self.position(0.0),
        }
    }

    fn invert(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        let t0 = self.transform(self.domain.0)?;
        let t1 = self.transform(self.domain.1)?;
        if self.range.0 == self.range.1 {
            return Some(json!(self.domain.0));
        }
        let normalized = (v - self.range.0) / (self.range.1 - self.range.0);
        Some(json!(self.untransform(t0 + normalized * (t1 - t0))))
    }

    fn set_option(&mut self, name: &str, value: &Value) {
        match name {
            "base" => {
                if let (NumericKind::Log { base }, Some(b)) = (&mut self.kind, value.as_f64()) {
                    *base = b;
                }
            }
            "exponent" => {
                if let (NumericKind::Pow { exponent }, Some(e)) = (&mut self.kind, value.as_f64())
                {
                    *exponent = e;
                }
            }
            "round" => self.round = value.as_bool().unwrap_or(self.round),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_linear_maps_proportionally() {
        let scale = NumericScale::linear()
            .with_domain((0.0, 10.0))
            .with_range((0.0, 100.0));
        assert_eq!(scale.apply(&json!(2.5)), Some(json!(25.0)));
        // numeric strings coerce
        assert_eq!(scale.apply(&json!("5")), Some(json!(50.0)));
        assert_eq!(scale.apply(&json!("oops")), None);
    }

    #[test]
    fn test_linear_clamp() {
        let scale = NumericScale::linear()
            .with_domain((0.0, 10.0))
            .with_range((0.0, 100.0))
            .with_clamp(true);
        assert_eq!(scale.apply(&json!(20.0)), Some(json!(100.0)));
        assert_eq!(scale.apply(&json!(-5.0)), Some(json!(0.0)));
    }

    #[test]
    fn test_degenerate_domain_pins_to_range_start() {
        let scale = NumericScale::linear()
            .with_domain((4.0, 4.0))
            .with_range((10.0, 20.0));
        assert_eq!(scale.apply(&json!(4.0)), Some(json!(10.0)));
    }

    #[test]
    fn test_log_rejects_nonpositive() {
        let scale = NumericScale::log(10.0)
            .with_domain((1.0, 100.0))
            .with_range((0.0, 1.0));
        assert_eq!(scale.apply(&json!(10.0)), Some(json!(0.5)));
        assert_eq!(scale.apply(&json!(-3.0)), None);
        assert_eq!(scale.apply(&json!(0.0)), None);
    }

    #[test]
    fn test_log_nice_snaps_to_powers() {
        let scale = NumericScale::log(10.0).with_domain((3.0, 80.0)).nice(10);
        assert_eq!(scale.domain(), vec![json!(1.0), json!(100.0)]);
    }

    #[test]
    fn test_sqrt_handles_negative_by_sign() {
        let scale = NumericScale::sqrt()
            .with_domain((0.0, 4.0))
            .with_range((0.0, 2.0));
        let out = scale.apply(&json!(1.0)).unwrap();
        assert_approx_eq!(f64, out.as_f64().unwrap(), 1.0);
    }

    #[test]
    fn test_nice_extends_domain() {
        let scale = NumericScale::linear().with_domain((0.13, 9.8)).nice(10);
        assert_eq!(scale.domain(), vec![json!(0.0), json!(10.0)]);
    }

    #[test]
    fn test_zero_position_for_baselines() {
        let scale = NumericScale::linear()
            .with_domain((-10.0, 10.0))
            .with_range((0.0, 100.0));
        assert_approx_eq!(f64, scale.zero_position().unwrap(), 50.0);
    }

    #[test]
    fn test_invert_round_trips() {
        let scale = NumericScale::linear()
            .with_domain((0.0, 10.0))
            .with_range((100.0, 200.0));
        let inverted = scale.invert(&json!(150.0)).unwrap();
        assert_approx_eq!(f64, inverted.as_f64().unwrap(), 5.0);
    }
}
