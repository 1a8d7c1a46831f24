use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative data pipeline: a source plus an ordered transform list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPipelineSpec {
    pub source: DataSource,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    /// Logical column declarations, used for domain inference and
    /// validation rather than raw drawing
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Where rows come from.
///
/// Every variant produces an ordered sequence of row-like records;
/// heterogeneous key sets are permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DataSource {
    /// Embedded rows. A non-array value is wrapped in a one-row dataset.
    Inline { data: Value },
    /// Fetch + parse by format; format inferred from the extension when
    /// not explicit.
    Url {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<SourceFormat>,
        #[serde(default)]
        options: IndexMap<String, Value>,
    },
    /// Local file, same parsing rules as `url`.
    File {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<SourceFormat>,
        #[serde(default)]
        options: IndexMap<String, Value>,
    },
    /// Parametrized synthetic data.
    Generated {
        #[serde(default)]
        options: GeneratedOptions,
    },
    /// Named caller-registered producer.
    Computed {
        name: String,
        #[serde(default)]
        options: IndexMap<String, Value>,
    },
    /// Live feed; loading yields an empty dataset, rows arrive through
    /// the handle.
    Stream {
        #[serde(default)]
        options: IndexMap<String, Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Json,
    Csv,
    Tsv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedOptions {
    #[serde(default)]
    pub kind: GeneratedKind,
    #[serde(default = "default_count")]
    pub count: usize,
    /// Seed for deterministic output; unseeded generation is the one
    /// sanctioned source of render-to-render variation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub params: IndexMap<String, Value>,
}

fn default_count() -> usize {
    100
}

impl Default for GeneratedOptions {
    fn default() -> Self {
        Self {
            kind: GeneratedKind::default(),
            count: default_count(),
            seed: None,
            params: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneratedKind {
    #[default]
    Random,
    Timeseries,
    Alphabet,
    Network,
    Hierarchy,
}

/// One named step in the data pipeline.
///
/// The type tag is deliberately open: unknown tags that also lack a
/// registered custom function pass data through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    #[serde(rename = "type")]
    pub transform_type: String,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
    /// Cache the resulting dataset under this name for later layer
    /// references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl TransformSpec {
    pub fn new(transform_type: impl Into<String>) -> Self {
        Self {
            transform_type: transform_type.into(),
            params: IndexMap::new(),
            output: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn output(mut self, name: impl Into<String>) -> Self {
        self.output = Some(name.into());
        self
    }
}

/// Declares a logical column of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Dot-path into nested row objects; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Quantitative,
    Ordinal,
    Nominal,
    Temporal,
    Geometry,
    Computed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_round_trip() {
        let source = DataSource::Url {
            url: "data/stocks.csv".to_string(),
            format: None,
            options: IndexMap::new(),
        };
        let text = serde_json::to_string(&source).unwrap();
        assert_eq!(text, r#"{"type":"url","url":"data/stocks.csv","options":{}}"#);
        let back: DataSource = serde_json::from_str(&text).unwrap();
        assert_eq!(back, source);
    }

    #[test]
    fn test_generated_defaults() {
        let source: DataSource = serde_json::from_value(json!({
            "type": "generated",
            "options": {"kind": "timeseries"}
        }))
        .unwrap();
        let DataSource::Generated { options } = source else {
            panic!("expected generated source");
        };
        assert_eq!(options.kind, GeneratedKind::Timeseries);
        assert_eq!(options.count, 100);
        assert_eq!(options.seed, None);
    }

    #[test]
    fn test_transform_spec_tag() {
        let step: TransformSpec = serde_json::from_value(json!({
            "type": "stack",
            "params": {"keys": ["a", "b"]},
            "output": "stacked"
        }))
        .unwrap();
        assert_eq!(step.transform_type, "stack");
        assert_eq!(step.output.as_deref(), Some("stacked"));
    }
}
