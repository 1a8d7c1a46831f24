//! Discretizing families: threshold, quantize, quantile. All three map
//! a continuous input onto a discrete range of output values.

use serde_json::{json, Value};

use plotline_data::value_as_f64;

use crate::error::PlotlineScaleError;
use crate::Scale;

/// Explicit cut points: `n` thresholds split the number line into `n + 1`
/// slots, one range value each.
#[derive(Debug, Clone)]
pub struct ThresholdScale {
    thresholds: Vec<f64>,
    range: Vec<Value>,
}

impl ThresholdScale {
    pub fn try_new(thresholds: Vec<f64>, range: Vec<Value>) -> Result<Self, PlotlineScaleError> {
        if range.len() != thresholds.len() + 1 {
            return Err(PlotlineScaleError::InvalidRange(format!(
                "threshold scale needs {} range values for {} thresholds, got {}",
                thresholds.len() + 1,
                thresholds.len(),
                range.len()
            )));
        }
        Ok(Self { thresholds, range })
    }

    fn slot(&self, v: f64) -> usize {
        self.thresholds.iter().take_while(|t| v >= **t).count()
    }
}

impl Scale for ThresholdScale {
    fn scale_type(&self) -> &'static str {
        "threshold"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        Some(self.range[self.slot(v)].clone())
    }

    fn domain(&self) -> Vec<Value> {
        self.thresholds.iter().map(|t| json!(t)).collect()
    }

    fn range(&self) -> Vec<Value> {
        self.range.clone()
    }
}

/// Uniform segmentation of a numeric extent into `range.len()` slots.
#[derive(Debug, Clone)]
pub struct QuantizeScale {
    domain: (f64, f64),
    range: Vec<Value>,
}

impl QuantizeScale {
    pub fn try_new(domain: (f64, f64), range: Vec<Value>) -> Result<Self, PlotlineScaleError> {
        if range.is_empty() {
            return Err(PlotlineScaleError::InvalidRange(
                "quantize range is empty".to_string(),
            ));
        }
        Ok(Self { domain, range })
    }
}

impl Scale for QuantizeScale {
    fn scale_type(&self) -> &'static str {
        "quantize"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        let span = self.domain.1 - self.domain.0;
        let slot = if span == 0.0 {
            0
        } else {
            let normalized = (v - self.domain.0) / span;
            ((normalized * self.range.len() as f64).floor() as isize)
                .clamp(0, self.range.len() as isize - 1) as usize
        };
        Some(self.range[slot].clone())
    }

    fn domain(&self) -> Vec<Value> {
        vec![json!(self.domain.0), json!(self.domain.1)]
    }

    fn range(&self) -> Vec<Value> {
        self.range.clone()
    }
}

/// Sample-quantile segmentation: cut points chosen so each slot holds an
/// equal share of the observed values.
#[derive(Debug, Clone)]
pub struct QuantileScale {
    thresholds: Vec<f64>,
    samples: Vec<f64>,
    range: Vec<Value>,
}

impl QuantileScale {
    pub fn try_new(mut samples: Vec<f64>, range: Vec<Value>) -> Result<Self, PlotlineScaleError> {
        if samples.is_empty() {
            return Err(PlotlineScaleError::EmptyDomain);
        }
        if range.is_empty() {
            return Err(PlotlineScaleError::InvalidRange(
                "quantile range is empty".to_string(),
            ));
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let n = range.len();
        let thresholds = (1..n)
            .map(|k| quantile_sorted(&samples, k as f64 / n as f64))
            .collect();
        Ok(Self {
            thresholds,
            samples,
            range,
        })
    }
}

/// R-7 interpolated quantile of an already sorted slice.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() as f64 - 1.0) * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (h - lo as f64)
}

impl Scale for QuantileScale {
    fn scale_type(&self) -> &'static str {
        "quantile"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let v = value_as_f64(value)?;
        let slot = self.thresholds.iter().take_while(|t| v >= **t).count();
        Some(self.range[slot].clone())
    }

    fn domain(&self) -> Vec<Value> {
        vec![
            json!(self.samples.first().copied().unwrap_or(0.0)),
            json!(self.samples.last().copied().unwrap_or(0.0)),
        ]
    }

    fn range(&self) -> Vec<Value> {
        self.range.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_slots() {
        let scale = ThresholdScale::try_new(
            vec![0.0, 10.0],
            vec![json!("low"), json!("mid"), json!("high")],
        )
        .unwrap();
        assert_eq!(scale.apply(&json!(-5.0)), Some(json!("low")));
        assert_eq!(scale.apply(&json!(0.0)), Some(json!("mid")));
        assert_eq!(scale.apply(&json!(25.0)), Some(json!("high")));
    }

    #[test]
    fn test_threshold_arity_checked() {
        assert!(ThresholdScale::try_new(vec![1.0], vec![json!("only")]).is_err());
    }

    #[test]
    fn test_quantize_uniform_segments() {
        let scale =
            QuantizeScale::try_new((0.0, 100.0), vec![json!(1), json!(2), json!(3), json!(4)])
                .unwrap();
        assert_eq!(scale.apply(&json!(10.0)), Some(json!(1)));
        assert_eq!(scale.apply(&json!(60.0)), Some(json!(3)));
        // out-of-domain values clamp into the end slots
        assert_eq!(scale.apply(&json!(-50.0)), Some(json!(1)));
        assert_eq!(scale.apply(&json!(500.0)), Some(json!(4)));
    }

    #[test]
    fn test_quantile_equal_population() {
        let samples: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        let scale =
            QuantileScale::try_new(samples, vec![json!("q1"), json!("q2"), json!("q3"), json!("q4")])
                .unwrap();
        assert_eq!(scale.apply(&json!(10.0)), Some(json!("q1")));
        assert_eq!(scale.apply(&json!(40.0)), Some(json!("q2")));
        assert_eq!(scale.apply(&json!(90.0)), Some(json!("q4")));
    }
}
