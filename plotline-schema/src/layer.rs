use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One independently ordered drawing pass: a mark bound to channel
/// encodings over a named dataset.
///
/// Layers are regenerated, never mutated, on every render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Dataset reference; defaults to the pipeline's final "main" dataset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub mark: MarkSpec,
    #[serde(default)]
    pub encoding: IndexMap<String, ChannelSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<IndexMap<String, Value>>,
    /// Conditional visibility; the layer is skipped entirely when false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Condition>,
    /// Sort key for layer ordering; missing means 0, ties keep
    /// declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
    /// Reference to a clip definition in the visual space
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
}

/// The geometric primitive family a layer draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkSpec {
    /// Open tag: circle, rect, line, area, arc, text, geoshape, or any
    /// custom type. Unknown tags render as one generic group per row.
    #[serde(rename = "type")]
    pub mark_type: String,
    /// Literal fallback attributes applied when no channel covers them
    #[serde(default)]
    pub params: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorSpec>,
    /// Split one dataset into independently drawn sub-batches keyed by
    /// these fields (e.g. one line per category)
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Stable identity field for update/exit matching
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl MarkSpec {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            params: IndexMap::new(),
            generator: None,
            group_by: Vec::new(),
            key: None,
        }
    }
}

/// Path-construction algorithm for marks that draw one path over many rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSpec {
    /// line, area, arc, pie, symbol, ...
    #[serde(rename = "type")]
    pub generator_type: String,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
}

/// A visual channel resolved per datum: either a constant `value` or a
/// `field` reference, optionally scaled and post-transformed.
///
/// `value` and `field` are mutually exclusive; `value` wins when both are
/// present. A `field` whose named scale is absent resolves unscaled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    /// Post-scale transforms applied in declared order
    #[serde(default)]
    pub transform: Vec<ChannelTransform>,
}

impl ChannelSpec {
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Default::default()
        }
    }

    pub fn scaled(field: impl Into<String>, scale: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            scale: Some(scale.into()),
            ..Default::default()
        }
    }
}

/// Pure numeric post-scale transform applied to a resolved channel value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChannelTransform {
    Offset {
        by: f64,
    },
    Multiply {
        by: f64,
    },
    Log,
    Sqrt,
    Abs,
    Negate,
    /// Caller-registered expression taking the current value and the datum
    Custom {
        name: String,
    },
}

/// Conditional check used for layer visibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// Field comparison evaluated against the layer's first row
    Expression {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// True when the named dataset (default "main") is non-empty
    Data {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
    },
    /// Caller-registered predicate by name
    Predicate { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotNull,
}
