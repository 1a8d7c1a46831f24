//! Stack transform: per-row `[y0, y1]` intervals for a list of series
//! keys, with selectable offset and order policies.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::datum::{field_path, value_as_f64};
use crate::error::PlotlineDataError;
use crate::transform::{Transform, TransformOutput};
use crate::Dataset;

/// Baseline policy applied after the raw series values are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackOffset {
    /// Zero baseline, values accumulate upward
    #[default]
    Zero,
    /// Positive values stack up from zero, negative values down
    Diverging,
    /// Each index's stack is rescaled to sum to 1
    Normalize,
    /// Baseline centers the stack around zero
    Silhouette,
    /// Baseline minimizes weighted slope changes (streamgraphs)
    Wiggle,
}

/// Series ordering policy; `None` retains insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackOrder {
    #[default]
    None,
    Ascending,
    Descending,
    Reverse,
    InsideOut,
}

pub struct StackTransform;

impl Transform for StackTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let keys: Vec<String> = match params.get("keys") {
            Some(Value::Array(keys)) => keys
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => {
                return Err(PlotlineDataError::transform(
                    "stack",
                    "missing 'keys' parameter",
                ))
            }
        };
        let offset = parse_offset(params)?;
        let order = parse_order(params)?;

        // values[series][index]
        let values: Vec<Vec<f64>> = keys
            .iter()
            .map(|key| {
                data.iter()
                    .map(|row| field_path(row, key).and_then(value_as_f64).unwrap_or(0.0))
                    .collect()
            })
            .collect();

        let series_order = order_series(&values, order);
        let intervals = offset_series(&values, &series_order, offset);

        let mut rows = Vec::with_capacity(keys.len() * data.len());
        for series in &series_order {
            for (index, row) in data.iter().enumerate() {
                let (y0, y1) = intervals[*series][index];
                rows.push(json!({
                    "key": keys[*series],
                    "index": index,
                    "y0": y0,
                    "y1": y1,
                    "value": values[*series][index],
                    "data": row,
                }));
            }
        }
        Ok(Dataset::from(rows).into())
    }
}

fn parse_offset(params: &IndexMap<String, Value>) -> Result<StackOffset, PlotlineDataError> {
    match params.get("offset").and_then(Value::as_str) {
        None | Some("zero") => Ok(StackOffset::Zero),
        Some("diverging") => Ok(StackOffset::Diverging),
        Some("normalize") => Ok(StackOffset::Normalize),
        Some("silhouette") => Ok(StackOffset::Silhouette),
        Some("wiggle") => Ok(StackOffset::Wiggle),
        Some(other) => Err(PlotlineDataError::transform(
            "stack",
            format!("unknown offset '{other}'"),
        )),
    }
}

fn parse_order(params: &IndexMap<String, Value>) -> Result<StackOrder, PlotlineDataError> {
    match params.get("order").and_then(Value::as_str) {
        None | Some("none") => Ok(StackOrder::None),
        Some("ascending") => Ok(StackOrder::Ascending),
        Some("descending") => Ok(StackOrder::Descending),
        Some("reverse") => Ok(StackOrder::Reverse),
        Some("insideOut") => Ok(StackOrder::InsideOut),
        Some(other) => Err(PlotlineDataError::transform(
            "stack",
            format!("unknown order '{other}'"),
        )),
    }
}

/// Order series indices by the requested policy.
fn order_series(values: &[Vec<f64>], order: StackOrder) -> Vec<usize> {
    let n = values.len();
    let sums: Vec<f64> = values.iter().map(|series| series.iter().sum()).collect();
    let mut indices: Vec<usize> = (0..n).collect();
    match order {
        StackOrder::None => indices,
        StackOrder::Reverse => {
            indices.reverse();
            indices
        }
        StackOrder::Ascending => {
            indices.sort_by(|a, b| sums[*a].partial_cmp(&sums[*b]).unwrap_or(std::cmp::Ordering::Equal));
            indices
        }
        StackOrder::Descending => {
            indices.sort_by(|a, b| sums[*b].partial_cmp(&sums[*a]).unwrap_or(std::cmp::Ordering::Equal));
            indices
        }
        StackOrder::InsideOut => {
            // largest sums toward the middle, alternating sides
            let mut by_sum = indices;
            by_sum.sort_by(|a, b| sums[*b].partial_cmp(&sums[*a]).unwrap_or(std::cmp::Ordering::Equal));
            let mut top = Vec::new();
            let mut bottom = Vec::new();
            for (rank, series) in by_sum.into_iter().enumerate() {
                if rank % 2 == 0 {
                    top.push(series);
                } else {
                    bottom.push(series);
                }
            }
            bottom.reverse();
            bottom.extend(top);
            bottom
        }
    }
}

/// Compute `[y0, y1]` intervals per series/index for the chosen offset.
fn offset_series(
    values: &[Vec<f64>],
    series_order: &[usize],
    offset: StackOffset,
) -> Vec<Vec<(f64, f64)>> {
    let point_count = values.first().map(Vec::len).unwrap_or(0);
    let mut intervals = vec![vec![(0.0, 0.0); point_count]; values.len()];

    match offset {
        StackOffset::Zero | StackOffset::Normalize => {
            for index in 0..point_count {
                let mut baseline = 0.0;
                for series in series_order {
                    let value = values[*series][index];
                    intervals[*series][index] = (baseline, baseline + value);
                    baseline += value;
                }
                if offset == StackOffset::Normalize && baseline != 0.0 {
                    for series in series_order {
                        let (y0, y1) = intervals[*series][index];
                        intervals[*series][index] = (y0 / baseline, y1 / baseline);
                    }
                }
            }
        }
        StackOffset::Diverging => {
            for index in 0..point_count {
                let mut up = 0.0;
                let mut down = 0.0;
                for series in series_order {
                    let value = values[*series][index];
                    if value >= 0.0 {
                        intervals[*series][index] = (up, up + value);
                        up += value;
                    } else {
                        intervals[*series][index] = (down + value, down);
                        down += value;
                    }
                }
            }
        }
        StackOffset::Silhouette => {
            for index in 0..point_count {
                let total: f64 = series_order.iter().map(|s| values[*s][index]).sum();
                let mut baseline = -total / 2.0;
                for series in series_order {
                    let value = values[*series][index];
                    intervals[*series][index] = (baseline, baseline + value);
                    baseline += value;
                }
            }
        }
        StackOffset::Wiggle => {
            // streamgraph baseline from weighted slopes, per d3-shape
            let mut baseline = 0.0;
            let mut baselines = vec![0.0; point_count];
            for index in 0..point_count {
                let total: f64 = series_order.iter().map(|s| values[*s][index]).sum();
                if index > 0 && total > 0.0 {
                    let mut weighted_slope = 0.0;
                    let mut running = 0.0;
                    for series in series_order {
                        let slope = values[*series][index] - values[*series][index - 1];
                        weighted_slope += (running + values[*series][index] / 2.0) * slope;
                        running += values[*series][index];
                    }
                    baseline -= weighted_slope / total;
                }
                baselines[index] = baseline;
            }
            for index in 0..point_count {
                let mut running = baselines[index];
                for series in series_order {
                    let value = values[*series][index];
                    intervals[*series][index] = (running, running + value);
                    running += value;
                }
            }
        }
    }
    intervals
}
