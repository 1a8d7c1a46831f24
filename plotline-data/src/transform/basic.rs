//! Row-level transforms: filter, sort, group.

use indexmap::IndexMap;
use serde_json::{json, Value};

use plotline_schema::CompareOp;

use crate::datum::{compare_values, field_path, value_as_string};
use crate::error::PlotlineDataError;
use crate::transform::{Transform, TransformOutput};
use crate::Dataset;

/// Keep rows whose `field` satisfies `op` against `value`.
pub struct FilterTransform;

impl Transform for FilterTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let field = require_str(params, "field", "filter")?;
        let op: CompareOp = match params.get("op") {
            Some(op) => serde_json::from_value(op.clone()).map_err(|_| {
                PlotlineDataError::transform("filter", format!("unknown op {:?}", params["op"]))
            })?,
            None => CompareOp::Eq,
        };
        let expected = params.get("value").cloned().unwrap_or(Value::Null);

        let rows: Dataset = data
            .into_iter()
            .filter(|row| matches(field_path(row, field), op, &expected))
            .collect();
        Ok(rows.into())
    }
}

fn matches(actual: Option<&Value>, op: CompareOp, expected: &Value) -> bool {
    match op {
        CompareOp::NotNull => actual.map(|v| !v.is_null()).unwrap_or(false),
        CompareOp::In => match (actual, expected) {
            (Some(actual), Value::Array(choices)) => choices.contains(actual),
            _ => false,
        },
        _ => {
            let Some(actual) = actual else {
                return false;
            };
            let ordering = compare_values(actual, expected);
            match op {
                CompareOp::Eq => actual == expected || ordering.is_eq(),
                CompareOp::Neq => actual != expected && !ordering.is_eq(),
                CompareOp::Gt => ordering.is_gt(),
                CompareOp::Gte => ordering.is_ge(),
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Lte => ordering.is_le(),
                CompareOp::In | CompareOp::NotNull => unreachable!(),
            }
        }
    }
}

/// Stable sort by a field; ties keep their input order for determinism.
pub struct SortTransform;

impl Transform for SortTransform {
    fn apply(
        &self,
        mut data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let field = require_str(params, "field", "sort")?.to_string();
        let descending = params
            .get("order")
            .and_then(Value::as_str)
            .map(|order| order == "descending")
            .unwrap_or(false);

        data.sort_by(|a, b| {
            let av = field_path(a, &field).unwrap_or(&Value::Null);
            let bv = field_path(b, &field).unwrap_or(&Value::Null);
            let ordering = compare_values(av, bv);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
        Ok(data.into())
    }
}

/// Partition rows into `{key, values, count}` records, preserving
/// first-seen key order.
pub struct GroupTransform;

impl Transform for GroupTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let by = group_fields(params)
            .ok_or_else(|| PlotlineDataError::transform("group", "missing 'by' parameter"))?;

        let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
        for row in data {
            let key = by
                .iter()
                .map(|field| {
                    field_path(&row, field)
                        .map(value_as_string)
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join("-");
            groups.entry(key).or_default().push(row);
        }

        let rows: Dataset = groups
            .into_iter()
            .map(|(key, values)| json!({"key": key, "count": values.len(), "values": values}))
            .collect();
        Ok(rows.into())
    }
}

pub(crate) fn group_fields(params: &IndexMap<String, Value>) -> Option<Vec<String>> {
    match params.get("by") {
        Some(Value::String(field)) => Some(vec![field.clone()]),
        Some(Value::Array(fields)) => Some(
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

pub(crate) fn require_str<'a>(
    params: &'a IndexMap<String, Value>,
    name: &str,
    transform: &str,
) -> Result<&'a str, PlotlineDataError> {
    params
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| PlotlineDataError::transform(transform, format!("missing '{name}' parameter")))
}
