use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative interaction attached after the draw pass.
///
/// Behaviors never affect data, scale, or mark resolution; they bind
/// gesture recognizers to already-rendered elements. Unknown behavior
/// types are ignored by the binder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSpec {
    /// zoom, pan, brush, drag, hover, click
    #[serde(rename = "type")]
    pub behavior_type: String,
    /// Target layer id; the whole surface when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
    /// event name -> handler (named built-in action or registered callback)
    #[serde(default)]
    pub handlers: IndexMap<String, HandlerSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerSpec {
    pub action: String,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

/// Declarative animation sequence, purely additive to rendered elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// load, update, interaction, time. Only load-triggered sequences run
    /// automatically after the first render.
    pub trigger: String,
    pub sequence: Vec<AnimationStep>,
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

fn default_duration() -> f64 {
    1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationStep {
    /// Layer id the step applies to
    pub target: String,
    pub properties: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}
