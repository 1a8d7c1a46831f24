//! Geometry-producing transforms: map projections, pie angle
//! assignment, and voronoi cell polygons.

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::warn;

use crate::datum::{field_path, value_as_f64};
use crate::error::PlotlineDataError;
use crate::transform::{Transform, TransformOutput};
use crate::Dataset;

/// Projects `longitude`/`latitude` fields onto planar `x`/`y`.
///
/// Unknown projection names warn and pass rows through untouched so a
/// bad name degrades instead of dropping the layer.
pub struct ProjectionTransform;

impl Transform for ProjectionTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let name = params
            .get("projection")
            .and_then(Value::as_str)
            .unwrap_or("equirectangular");
        let scale = params.get("scale").and_then(Value::as_f64).unwrap_or(100.0);
        let (tx, ty) = match params.get("translate") {
            Some(Value::Array(point)) if point.len() == 2 => (
                point[0].as_f64().unwrap_or(0.0),
                point[1].as_f64().unwrap_or(0.0),
            ),
            _ => (0.0, 0.0),
        };
        let lon_field = params
            .get("longitude")
            .and_then(Value::as_str)
            .unwrap_or("longitude");
        let lat_field = params
            .get("latitude")
            .and_then(Value::as_str)
            .unwrap_or("latitude");

        let project: fn(f64, f64) -> Option<(f64, f64)> = match name {
            "equirectangular" => |lon, lat| Some((lon, lat)),
            "mercator" => |lon, lat| {
                let clamped = lat.clamp(-1.4844, 1.4844);
                Some((lon, (std::f64::consts::FRAC_PI_4 + clamped / 2.0).tan().ln()))
            },
            "orthographic" => |lon, lat| {
                // back hemisphere is not visible
                if lat.cos() * lon.cos() < 0.0 {
                    return None;
                }
                Some((lat.cos() * lon.sin(), lat.sin()))
            },
            other => {
                warn!(projection = other, "unknown projection, passing data through");
                return Ok(data.into());
            }
        };

        let rows = data
            .into_iter()
            .map(|mut row| {
                let lon = field_path(&row, lon_field).and_then(value_as_f64);
                let lat = field_path(&row, lat_field).and_then(value_as_f64);
                if let (Some(lon), Some(lat)) = (lon, lat) {
                    let planar = project(lon.to_radians(), lat.to_radians());
                    if let (Some((px, py)), Value::Object(fields)) = (planar, &mut row) {
                        fields.insert("x".to_string(), json!(tx + scale * px));
                        fields.insert("y".to_string(), json!(ty - scale * py));
                    }
                }
                row
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Assigns start/end angles proportional to a value field.
pub struct PieTransform;

impl Transform for PieTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let value_field = params.get("value").and_then(Value::as_str).unwrap_or("value");
        let start = params
            .get("startAngle")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let end = params
            .get("endAngle")
            .and_then(Value::as_f64)
            .unwrap_or(std::f64::consts::TAU);
        let pad = params.get("padAngle").and_then(Value::as_f64).unwrap_or(0.0);

        let values: Vec<f64> = data
            .iter()
            .map(|row| {
                field_path(row, value_field)
                    .and_then(value_as_f64)
                    .map(|v| v.max(0.0))
                    .unwrap_or(0.0)
            })
            .collect();
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return Err(PlotlineDataError::transform("pie", "no positive values"));
        }
        let padding = pad * data.len() as f64;
        let sweep = (end - start - padding).max(0.0);

        // angles are assigned largest-first when sorted, but output rows
        // keep their input order
        let mut order: Vec<usize> = (0..data.len()).collect();
        if params.get("sort").and_then(Value::as_bool).unwrap_or(false) {
            order.sort_by(|a, b| {
                values[*b]
                    .partial_cmp(&values[*a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        let mut angles = vec![(0.0, 0.0); data.len()];
        let mut angle = start;
        for index in order {
            let slice = sweep * values[index] / total;
            angles[index] = (angle, angle + slice);
            angle += slice + pad;
        }

        let rows = data
            .iter()
            .enumerate()
            .map(|(index, row)| {
                json!({
                    "startAngle": angles[index].0,
                    "endAngle": angles[index].1,
                    "padAngle": pad,
                    "value": values[index],
                    "index": index,
                    "data": row,
                })
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Voronoi cells by half-plane clipping of the extent rectangle. O(n²)
/// per cell, which is fine for label and hover-target use.
pub struct VoronoiTransform;

impl Transform for VoronoiTransform {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError> {
        let x_field = params.get("x").and_then(Value::as_str).unwrap_or("x");
        let y_field = params.get("y").and_then(Value::as_str).unwrap_or("y");
        let extent = match params.get("extent") {
            Some(Value::Array(corners)) if corners.len() == 2 => {
                let corner = |v: &Value, i: usize| v.get(i).and_then(Value::as_f64).unwrap_or(0.0);
                [
                    (corner(&corners[0], 0), corner(&corners[0], 1)),
                    (corner(&corners[1], 0), corner(&corners[1], 1)),
                ]
            }
            _ => [(0.0, 0.0), (1.0, 1.0)],
        };

        let sites: Vec<(f64, f64)> = data
            .iter()
            .map(|row| {
                (
                    field_path(row, x_field).and_then(value_as_f64).unwrap_or(0.0),
                    field_path(row, y_field).and_then(value_as_f64).unwrap_or(0.0),
                )
            })
            .collect();

        let rows = data
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let cell = clip_cell(sites[index], &sites, index, extent);
                let polygon: Vec<Value> = cell.iter().map(|(x, y)| json!([x, y])).collect();
                let mut out = row.clone();
                if let Value::Object(fields) = &mut out {
                    fields.insert("polygon".to_string(), Value::Array(polygon));
                }
                out
            })
            .collect::<Vec<_>>();
        Ok(Dataset::from(rows).into())
    }
}

/// Clip the extent rectangle by the bisector half-plane of every other
/// site (Sutherland-Hodgman).
fn clip_cell(
    site: (f64, f64),
    sites: &[(f64, f64)],
    index: usize,
    extent: [(f64, f64); 2],
) -> Vec<(f64, f64)> {
    let [(x0, y0), (x1, y1)] = extent;
    let mut polygon = vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    for (other_index, other) in sites.iter().enumerate() {
        if other_index == index || polygon.is_empty() {
            continue;
        }
        // keep points no farther from `site` than from `other`
        let mid = ((site.0 + other.0) / 2.0, (site.1 + other.1) / 2.0);
        let normal = (site.0 - other.0, site.1 - other.1);
        let inside =
            |p: (f64, f64)| (p.0 - mid.0) * normal.0 + (p.1 - mid.1) * normal.1 >= 0.0;
        let mut clipped = Vec::with_capacity(polygon.len() + 1);
        for i in 0..polygon.len() {
            let current = polygon[i];
            let next = polygon[(i + 1) % polygon.len()];
            let current_in = inside(current);
            let next_in = inside(next);
            if current_in {
                clipped.push(current);
            }
            if current_in != next_in {
                clipped.push(intersect(current, next, mid, normal));
            }
        }
        polygon = clipped;
    }
    polygon
}

fn intersect(
    a: (f64, f64),
    b: (f64, f64),
    mid: (f64, f64),
    normal: (f64, f64),
) -> (f64, f64) {
    let da = (a.0 - mid.0) * normal.0 + (a.1 - mid.1) * normal.1;
    let db = (b.0 - mid.0) * normal.0 + (b.1 - mid.1) * normal.1;
    let t = da / (da - db);
    (a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1))
}
