//! Discrete families: ordinal lookup and band/point positioning.

use indexmap::IndexMap;
use serde_json::{json, Value};

use plotline_data::value_as_string;

use crate::error::PlotlineScaleError;
use crate::Scale;

/// Categorical lookup: domain values map to range values, cycling when
/// the range is shorter than the domain.
#[derive(Debug, Clone)]
pub struct OrdinalScale {
    index: IndexMap<String, usize>,
    range: Vec<Value>,
    unknown: Option<Value>,
}

impl OrdinalScale {
    pub fn try_new(domain: Vec<String>, range: Vec<Value>) -> Result<Self, PlotlineScaleError> {
        if domain.is_empty() {
            return Err(PlotlineScaleError::EmptyDomain);
        }
        if range.is_empty() {
            return Err(PlotlineScaleError::InvalidRange(
                "ordinal range is empty".to_string(),
            ));
        }
        let index = domain.into_iter().zip(0..).collect();
        Ok(Self {
            index,
            range,
            unknown: None,
        })
    }

    /// Value returned for inputs outside the domain; default is `None`,
    /// which omits the channel.
    pub fn with_unknown(mut self, unknown: Value) -> Self {
        self.unknown = Some(unknown);
        self
    }
}

impl Scale for OrdinalScale {
    fn scale_type(&self) -> &'static str {
        "ordinal"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let key = value_as_string(value);
        match self.index.get(&key) {
            Some(position) => Some(self.range[position % self.range.len()].clone()),
            None => self.unknown.clone(),
        }
    }

    fn domain(&self) -> Vec<Value> {
        self.index.keys().map(|k| json!(k)).collect()
    }

    fn range(&self) -> Vec<Value> {
        self.range.clone()
    }

    fn set_option(&mut self, name: &str, value: &Value) {
        if name == "unknown" {
            self.unknown = Some(value.clone());
        }
    }
}

/// Divides a continuous range into uniform bands for a discrete domain.
/// With `padding_inner` forced to 1 it degenerates into a point scale.
#[derive(Debug, Clone)]
pub struct BandScale {
    name: &'static str,
    index: IndexMap<String, usize>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    round: bool,
}

impl BandScale {
    pub fn try_new(domain: Vec<String>) -> Result<Self, PlotlineScaleError> {
        Self::with_name("band", domain, 0.0)
    }

    /// Point scale: zero-width bands centered on each step.
    pub fn try_new_point(domain: Vec<String>) -> Result<Self, PlotlineScaleError> {
        Self::with_name("point", domain, 1.0)
    }

    fn with_name(
        name: &'static str,
        domain: Vec<String>,
        padding_inner: f64,
    ) -> Result<Self, PlotlineScaleError> {
        if domain.is_empty() {
            return Err(PlotlineScaleError::EmptyDomain);
        }
        Ok(Self {
            name,
            index: domain.into_iter().zip(0..).collect(),
            range: (0.0, 1.0),
            padding_inner,
            padding_outer: 0.0,
            align: 0.5,
            round: false,
        })
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range = range;
        self
    }

    pub fn with_padding_inner(mut self, padding: f64) -> Self {
        if self.name == "band" {
            self.padding_inner = padding.clamp(0.0, 1.0);
        }
        self
    }

    pub fn with_padding_outer(mut self, padding: f64) -> Self {
        self.padding_outer = padding.max(0.0);
        self
    }

    pub fn with_align(mut self, align: f64) -> Self {
        self.align = align.clamp(0.0, 1.0);
        self
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    fn layout(&self) -> (f64, f64) {
        let n = self.index.len() as f64;
        let reverse = self.range.1 < self.range.0;
        let (start, stop) = if reverse {
            (self.range.1, self.range.0)
        } else {
            (self.range.0, self.range.1)
        };
        let space = (n - self.padding_inner + self.padding_outer * 2.0).max(1.0);
        let mut step = (stop - start) / space;
        if self.round {
            step = step.floor();
        }
        let mut first = start + (stop - start - step * (n - self.padding_inner)) * self.align;
        if self.round {
            first = first.round();
        }
        (first, step)
    }

    /// Start position of the band at `position` in domain order.
    fn band_start(&self, position: usize) -> f64 {
        let (first, step) = self.layout();
        let n = self.index.len();
        if self.range.1 < self.range.0 {
            first + step * (n - 1 - position) as f64
        } else {
            first + step * position as f64
        }
    }

    pub fn step(&self) -> f64 {
        self.layout().1
    }
}

impl Scale for BandScale {
    fn scale_type(&self) -> &'static str {
        self.name
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let key = value_as_string(value);
        let position = *self.index.get(&key)?;
        Some(json!(self.band_start(position)))
    }

    fn domain(&self) -> Vec<Value> {
        self.index.keys().map(|k| json!(k)).collect()
    }

    fn range(&self) -> Vec<Value> {
        vec![json!(self.range.0), json!(self.range.1)]
    }

    fn bandwidth(&self) -> Option<f64> {
        let step = self.step();
        let width = step * (1.0 - self.padding_inner);
        Some(if self.round { width.floor() } else { width })
    }

    fn set_option(&mut self, name: &str, value: &Value) {
        match (name, value.as_f64()) {
            ("padding", Some(padding)) => {
                if self.name == "band" {
                    self.padding_inner = padding.clamp(0.0, 1.0);
                }
                self.padding_outer = padding.max(0.0);
            }
            ("paddingInner", Some(padding)) => {
                if self.name == "band" {
                    self.padding_inner = padding.clamp(0.0, 1.0);
                }
            }
            ("paddingOuter", Some(padding)) => self.padding_outer = padding.max(0.0),
            ("align", Some(align)) => self.align = align.clamp(0.0, 1.0),
            ("round", _) => self.round = value.as_bool().unwrap_or(self.round),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn abc() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn test_ordinal_lookup_and_cycling() {
        let scale = OrdinalScale::try_new(abc(), vec![json!("red"), json!("blue")]).unwrap();
        assert_eq!(scale.apply(&json!("a")), Some(json!("red")));
        assert_eq!(scale.apply(&json!("b")), Some(json!("blue")));
        // c cycles back to the first range entry
        assert_eq!(scale.apply(&json!("c")), Some(json!("red")));
        assert_eq!(scale.apply(&json!("zzz")), None);
    }

    #[test]
    fn test_ordinal_unknown_fallback() {
        let scale = OrdinalScale::try_new(abc(), vec![json!("red")])
            .unwrap()
            .with_unknown(json!("gray"));
        assert_eq!(scale.apply(&json!("zzz")), Some(json!("gray")));
    }

    #[test]
    fn test_band_positions_without_padding() {
        let scale = BandScale::try_new(abc()).unwrap().with_range((0.0, 120.0));
        assert_eq!(scale.apply(&json!("a")), Some(json!(0.0)));
        assert_eq!(scale.apply(&json!("b")), Some(json!(40.0)));
        assert_approx_eq!(f64, scale.bandwidth().unwrap(), 40.0);
    }

    #[test]
    fn test_band_padding_shrinks_bandwidth() {
        let mut scale = BandScale::try_new(abc()).unwrap().with_range((0.0, 120.0));
        scale.set_option("paddingInner", &json!(0.5));
        assert!(scale.bandwidth().unwrap() < scale.step());
        assert_approx_eq!(f64, scale.bandwidth().unwrap(), scale.step() * 0.5);
    }

    #[test]
    fn test_point_scale_has_zero_bandwidth() {
        let scale = BandScale::try_new_point(abc())
            .unwrap()
            .with_range((0.0, 100.0));
        assert_approx_eq!(f64, scale.bandwidth().unwrap(), 0.0);
        assert_eq!(scale.apply(&json!("a")), Some(json!(0.0)));
        assert_eq!(scale.apply(&json!("c")), Some(json!(100.0)));
    }

    #[test]
    fn test_empty_domain_is_an_error() {
        assert!(BandScale::try_new(Vec::new()).is_err());
        assert!(OrdinalScale::try_new(Vec::new(), vec![json!(1)]).is_err());
    }

    #[test]
    fn test_reversed_range_reverses_band_order() {
        let scale = BandScale::try_new(abc()).unwrap().with_range((120.0, 0.0));
        let a = scale.apply(&json!("a")).unwrap().as_f64().unwrap();
        let c = scale.apply(&json!("c")).unwrap().as_f64().unwrap();
        assert!(a > c);
    }
}
