use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::behavior::{AnimationSpec, BehaviorSpec};
use crate::data::DataPipelineSpec;
use crate::layer::LayerSpec;
use crate::scale::ScaleSpec;

/// Root of the canonical schema: the single source of truth for one chart.
///
/// The renderer derives everything else (datasets, scale instances, scene
/// primitives) from this document and discards that derived state on every
/// full re-render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSchema {
    /// Unique identifier among concurrently managed charts
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub data: DataPipelineSpec,
    pub space: VisualSpace,
    /// Named scale definitions; build order is not significant
    #[serde(default)]
    pub scales: IndexMap<String, ScaleSpec>,
    /// Ordered list of drawing layers; declaration order breaks order ties
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub behaviors: Vec<BehaviorSpec>,
    #[serde(default)]
    pub animations: Vec<AnimationSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChartMetadata>,
}

impl ChartSchema {
    pub fn from_json(json: &str) -> Result<Self, crate::error::PlotlineSchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, crate::error::PlotlineSchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Canvas dimensions, background styling, and clip regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualSpace {
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<IndexMap<String, Value>>,
    #[serde(default)]
    pub clips: Vec<ClipDef>,
}

/// A reusable clip region referenced by layers through [`LayerSpec::clip`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDef {
    pub id: String,
    /// Shape tag: rect, circle, ellipse, path, polygon
    #[serde(rename = "type")]
    pub shape: String,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}
