use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::primitive::ScenePrimitive;

/// The compositor's output: layers in draw order inside a sized canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneGraph {
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub layers: Vec<SceneLayer>,
}

impl SceneGraph {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            background: None,
            layers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(|layer| layer.primitives.is_empty())
    }

    pub fn primitive_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.primitives.len()).sum()
    }

    pub fn layer(&self, id: &str) -> Option<&SceneLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
}

/// One schema layer's worth of drawable output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneLayer {
    pub id: String,
    /// Mark family that produced the primitives (line, circle, text...)
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub style: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<String>,
    #[serde(default)]
    pub primitives: Vec<ScenePrimitive>,
}

impl SceneLayer {
    pub fn new(id: impl Into<String>, mark_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mark_type: mark_type.into(),
            style: IndexMap::new(),
            clip: None,
            blend_mode: None,
            primitives: Vec::new(),
        }
    }
}
