//! Best-guess schema generation from raw rows.
//!
//! A heuristic convenience layered on top of the core rendering contract:
//! inspect row shape (field cardinality, type guesses, structural markers
//! like source/target or children keys), pick a visualization type, and
//! assemble a complete schema document for it.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::data::{DataPipelineSpec, DataSource, FieldDef, FieldType, TransformSpec};
use crate::document::{ChartSchema, VisualSpace};
use crate::error::PlotlineSchemaError;
use crate::layer::{ChannelSpec, LayerSpec, MarkSpec};
use crate::scale::{DomainMethod, NiceSpec, ScaleSpec};

#[derive(Debug, Clone, Default)]
pub struct InferOptions {
    /// Chart-type hint (bar, line, scatter, histogram, ...); inferred from
    /// the data when absent
    pub chart_type: Option<String>,
    pub title: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Explicit channel -> field assignments, filled in by inference when
    /// missing
    pub encoding: IndexMap<String, String>,
}

#[derive(Debug, Clone)]
struct FieldProfile {
    name: String,
    field_type: FieldType,
    unique_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowStructure {
    Tabular,
    Network,
    Hierarchy,
}

/// Generate a best-guess schema document for `rows`.
pub fn infer_schema(rows: &[Value], options: InferOptions) -> Result<ChartSchema, PlotlineSchemaError> {
    if rows.is_empty() {
        return Err(PlotlineSchemaError::EmptyData);
    }

    let profiles = profile_fields(rows);
    let structure = detect_structure(&rows[0]);
    let chart_type = options
        .chart_type
        .clone()
        .unwrap_or_else(|| infer_chart_type(&profiles, structure));

    let width = options.width.unwrap_or(800.0);
    let height = options.height.unwrap_or(400.0);
    let encoding = infer_encoding(&profiles, &options.encoding);

    let mut scales = IndexMap::new();
    for (channel, field) in &encoding {
        let Some(profile) = profiles.iter().find(|p| &p.name == field) else {
            continue;
        };
        let mut scale = match profile.field_type {
            FieldType::Quantitative => {
                let mut s = ScaleSpec::new("linear").domain_from("main", field, DomainMethod::Extent);
                s.nice = Some(NiceSpec::Enabled(true));
                s
            }
            FieldType::Temporal => {
                let mut s = ScaleSpec::new("time").domain_from("main", field, DomainMethod::Extent);
                s.nice = Some(NiceSpec::Enabled(true));
                s
            }
            _ => {
                let family = if channel == "x" { "band" } else { "ordinal" };
                let mut s =
                    ScaleSpec::new(family).domain_from("main", field, DomainMethod::Values);
                if channel == "color" {
                    s.scheme = Some("category10".to_string());
                }
                s
            }
        };
        scale.range = match channel.as_str() {
            "x" => Some(vec![json!(50.0), json!(width - 50.0)]),
            "y" => Some(vec![json!(height - 50.0), json!(50.0)]),
            "size" => Some(vec![json!(3.0), json!(20.0)]),
            _ => scale.range,
        };
        scales.insert(channel.clone(), scale);
    }

    let mut layer_encoding = IndexMap::new();
    for (channel, field) in &encoding {
        layer_encoding.insert(channel.clone(), ChannelSpec::scaled(field, channel));
    }

    let transforms = match structure {
        RowStructure::Hierarchy => vec![
            TransformSpec::new("hierarchy"),
            TransformSpec::new("treemap"),
        ],
        RowStructure::Network => vec![TransformSpec::new("force").output("nodes")],
        RowStructure::Tabular => vec![],
    };

    let schema = ChartSchema {
        id: format!("auto-{chart_type}"),
        title: options.title.or_else(|| Some(format!("{chart_type} chart"))),
        description: None,
        data: DataPipelineSpec {
            source: DataSource::Inline {
                data: Value::Array(rows.to_vec()),
            },
            transforms,
            fields: profiles
                .iter()
                .map(|p| FieldDef {
                    name: p.name.clone(),
                    field_type: p.field_type,
                    accessor: None,
                    format: None,
                })
                .collect(),
        },
        space: VisualSpace {
            width,
            height,
            background: None,
            clips: vec![],
        },
        scales,
        layers: vec![LayerSpec {
            id: Some("main".to_string()),
            data: None,
            mark: MarkSpec::new(mark_for(&chart_type)),
            encoding: layer_encoding,
            style: None,
            when: None,
            order: None,
            blend_mode: None,
            clip: None,
        }],
        behaviors: vec![],
        animations: vec![],
        metadata: None,
    };
    Ok(schema)
}

fn profile_fields(rows: &[Value]) -> Vec<FieldProfile> {
    let Some(sample) = rows.first().and_then(|r| r.as_object()) else {
        return vec![];
    };
    sample
        .keys()
        .map(|name| {
            let values: Vec<&Value> = rows
                .iter()
                .filter_map(|r| r.get(name))
                .filter(|v| !v.is_null())
                .collect();
            let unique_count = {
                let mut seen: Vec<String> = Vec::new();
                for v in &values {
                    let key = v.to_string();
                    if !seen.contains(&key) {
                        seen.push(key);
                    }
                }
                seen.len()
            };
            FieldProfile {
                name: name.clone(),
                field_type: guess_type(&values, unique_count),
                unique_count,
            }
        })
        .collect()
}

fn guess_type(values: &[&Value], unique_count: usize) -> FieldType {
    let Some(sample) = values.first() else {
        return FieldType::Nominal;
    };
    match sample {
        Value::Number(_) => {
            // low-cardinality numbers read better as ordinal categories
            if values.len() >= 5 && (unique_count as f64) / (values.len() as f64) <= 0.2 {
                FieldType::Ordinal
            } else {
                FieldType::Quantitative
            }
        }
        Value::String(s) => {
            if looks_temporal(s) {
                FieldType::Temporal
            } else if unique_count <= 20 {
                FieldType::Ordinal
            } else {
                FieldType::Nominal
            }
        }
        Value::Object(map) => {
            if map.contains_key("coordinates") || map.contains_key("geometry") {
                FieldType::Geometry
            } else {
                FieldType::Nominal
            }
        }
        _ => FieldType::Nominal,
    }
}

fn looks_temporal(s: &str) -> bool {
    // ISO dates and datetimes only; free-form date parsing guesses wrong
    // too often to be worth it here
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[0..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(|b| b.is_ascii_digit())
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(|b| b.is_ascii_digit())
}

fn detect_structure(sample: &Value) -> RowStructure {
    if sample.get("source").is_some() && sample.get("target").is_some() {
        RowStructure::Network
    } else if sample.get("children").is_some() || sample.get("parent").is_some() {
        RowStructure::Hierarchy
    } else {
        RowStructure::Tabular
    }
}

fn infer_chart_type(profiles: &[FieldProfile], structure: RowStructure) -> String {
    match structure {
        RowStructure::Network => return "force-directed".to_string(),
        RowStructure::Hierarchy => return "treemap".to_string(),
        RowStructure::Tabular => {}
    }
    let temporal = profiles.iter().filter(|p| p.field_type == FieldType::Temporal).count();
    let quantitative = profiles
        .iter()
        .filter(|p| p.field_type == FieldType::Quantitative)
        .count();
    let categorical = profiles
        .iter()
        .filter(|p| matches!(p.field_type, FieldType::Ordinal | FieldType::Nominal))
        .count();

    if temporal > 0 && quantitative > 0 {
        if quantitative > 1 {
            "multi-line".to_string()
        } else {
            "line".to_string()
        }
    } else if quantitative >= 2 {
        "scatter".to_string()
    } else if categorical > 0 && quantitative > 0 {
        let first_cat = profiles
            .iter()
            .find(|p| matches!(p.field_type, FieldType::Ordinal | FieldType::Nominal));
        if first_cat.map(|p| p.unique_count <= 10).unwrap_or(false) {
            "bar".to_string()
        } else {
            "histogram".to_string()
        }
    } else {
        "bar".to_string()
    }
}

fn infer_encoding(
    profiles: &[FieldProfile],
    user: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut encoding = user.clone();
    let find = |pred: &dyn Fn(&FieldProfile) -> bool| {
        profiles.iter().find(|p| pred(p)).map(|p| p.name.clone())
    };
    if !encoding.contains_key("x") {
        let x = find(&|p| p.field_type == FieldType::Temporal)
            .or_else(|| find(&|p| matches!(p.field_type, FieldType::Ordinal | FieldType::Nominal)))
            .or_else(|| profiles.first().map(|p| p.name.clone()));
        if let Some(x) = x {
            encoding.insert("x".to_string(), x);
        }
    }
    if !encoding.contains_key("y") {
        let y = find(&|p| p.field_type == FieldType::Quantitative)
            .or_else(|| profiles.get(1).map(|p| p.name.clone()));
        if let Some(y) = y {
            encoding.insert("y".to_string(), y);
        }
    }
    if !encoding.contains_key("color") && profiles.len() > 2 {
        let taken = encoding.get("x").cloned();
        let color = profiles
            .iter()
            .find(|p| {
                matches!(p.field_type, FieldType::Ordinal | FieldType::Nominal)
                    && Some(&p.name) != taken.as_ref()
            })
            .map(|p| p.name.clone());
        if let Some(color) = color {
            encoding.insert("color".to_string(), color);
        }
    }
    encoding
}

fn mark_for(chart_type: &str) -> &'static str {
    match chart_type {
        "bar" | "histogram" | "treemap" => "rect",
        "line" | "multi-line" => "line",
        "scatter" | "force-directed" => "circle",
        "area" => "area",
        "pie" => "arc",
        "choropleth" => "geoshape",
        _ => "circle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;

    #[test]
    fn test_bar_inference() {
        let rows = vec![
            json!({"category": "A", "value": 30}),
            json!({"category": "B", "value": 80}),
            json!({"category": "C", "value": 45}),
        ];
        let schema = infer_schema(&rows, InferOptions::default()).unwrap();
        assert_eq!(schema.layers[0].mark.mark_type, "rect");
        assert_eq!(schema.scales["x"].scale_type, "band");
        assert_eq!(schema.scales["y"].scale_type, "linear");
        assert!(validate(&schema).valid);
    }

    #[test]
    fn test_timeseries_inference() {
        let rows = vec![
            json!({"date": "2024-01-01", "value": 1.0}),
            json!({"date": "2024-01-02", "value": 2.0}),
        ];
        let schema = infer_schema(&rows, InferOptions::default()).unwrap();
        assert_eq!(schema.layers[0].mark.mark_type, "line");
        assert_eq!(schema.scales["x"].scale_type, "time");
    }

    #[test]
    fn test_network_inference() {
        let rows = vec![json!({"source": "a", "target": "b"})];
        let schema = infer_schema(&rows, InferOptions::default()).unwrap();
        assert_eq!(schema.data.transforms[0].transform_type, "force");
        assert_eq!(schema.layers[0].mark.mark_type, "circle");
    }

    #[test]
    fn test_empty_rows_error() {
        let err = infer_schema(&[], InferOptions::default()).unwrap_err();
        assert!(matches!(err, PlotlineSchemaError::EmptyData));
    }

    #[test]
    fn test_user_encoding_wins() {
        let rows = vec![json!({"a": 1.0, "b": 2.0})];
        let mut options = InferOptions::default();
        options.encoding.insert("x".to_string(), "b".to_string());
        let schema = infer_schema(&rows, options).unwrap();
        assert_eq!(
            schema.layers[0].encoding["x"].field.as_deref(),
            Some("b")
        );
    }
}
