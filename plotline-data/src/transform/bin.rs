//! Bin transform: histogram rows with nice threshold boundaries.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::array::{nice_interval, tick_increment};
use crate::datum::{field_path, value_as_f64};
use crate::error::PlotlineDataError;
use crate::transform::{Transform, TransformOutput};
use crate::Dataset;

pub struct BinTransform;

impl Transform for BinTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let field = params
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| PlotlineDataError::transform("bin", "missing 'field' parameter"))?;
        let bin_count = params
            .get("bins")
            .and_then(Value::as_u64)
            .map(|n| n.max(1) as usize)
            .unwrap_or(10);

        let samples: Vec<(f64, &Value)> = data
            .iter()
            .filter_map(|row| field_path(row, field).and_then(value_as_f64).map(|v| (v, row)))
            .collect();
        if samples.is_empty() {
            return Ok(Dataset::new().into());
        }

        let (min, max) = samples.iter().fold((f64::MAX, f64::MIN), |(lo, hi), (v, _)| {
            (lo.min(*v), hi.max(*v))
        });
        let thresholds = nice_thresholds(min, max, bin_count);

        let mut bins: Vec<(f64, f64, Vec<Value>)> = thresholds
            .windows(2)
            .map(|edge| (edge[0], edge[1], Vec::new()))
            .collect();
        for (value, row) in &samples {
            // values at the upper bound fall into the last bin
            let slot = bins
                .iter()
                .position(|(x0, x1, _)| *value >= *x0 && *value < *x1)
                .unwrap_or(bins.len() - 1);
            bins[slot].2.push((*row).clone());
        }

        let rows = bins
            .into_iter()
            .map(|(x0, x1, values)| {
                json!({
                    "x0": x0,
                    "x1": x1,
                    "count": values.len(),
                    "values": values,
                })
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Nice threshold edges covering `[min, max]` with roughly `count` bins,
/// at the same step the continuous scales tick at.
fn nice_thresholds(min: f64, max: f64, count: usize) -> Vec<f64> {
    if min == max {
        return vec![min, min + 1.0];
    }
    let (start, stop) = nice_interval(min, max, count);
    let raw = tick_increment(start, stop, count as f64);
    let step = if raw > 0.0 { raw } else { -1.0 / raw };
    let n = ((stop - start) / step).round() as usize;
    (0..=n).map(|i| start + step * i as f64).collect()
}
