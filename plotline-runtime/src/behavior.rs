//! Behavior binding: declarative interaction specs become data records
//! the drawing surface consumes. No window or DOM plumbing lives here.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use plotline_schema::{BehaviorSpec, HandlerSpec, VisualSpace};

/// One resolved interaction binding, attached to the chart handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundBehavior {
    pub behavior_type: String,
    /// Target layer id; the whole surface when absent
    pub target: Option<String>,
    pub gesture: Gesture,
    pub handlers: IndexMap<String, HandlerSpec>,
}

/// Gesture configuration with surface-space defaults filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Gesture {
    Zoom {
        scale_extent: (f64, f64),
        translate_extent: [[f64; 2]; 2],
    },
    Pan,
    Brush {
        axis: BrushAxis,
        extent: [[f64; 2]; 2],
    },
    Drag,
    /// hover / click event maps; the listed events carry handlers
    Pointer { events: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushAxis {
    X,
    Y,
    Xy,
}

/// Resolve the schema's behaviors against the visual space. Unknown
/// behavior types are skipped with a warn.
pub fn bind_behaviors(specs: &[BehaviorSpec], space: &VisualSpace) -> Vec<BoundBehavior> {
    let surface = [[0.0, 0.0], [space.width, space.height]];
    specs
        .iter()
        .filter_map(|spec| {
            let gesture = match spec.behavior_type.as_str() {
                "zoom" => Gesture::Zoom {
                    scale_extent: pair(spec.params.get("scaleExtent")).unwrap_or((1.0, 10.0)),
                    translate_extent: corners(spec.params.get("translateExtent"))
                        .unwrap_or(surface),
                },
                "pan" => Gesture::Pan,
                "brush" => Gesture::Brush {
                    axis: match spec.params.get("axis").and_then(Value::as_str) {
                        Some("x") => BrushAxis::X,
                        Some("y") => BrushAxis::Y,
                        _ => BrushAxis::Xy,
                    },
                    extent: corners(spec.params.get("extent")).unwrap_or(surface),
                },
                "drag" => Gesture::Drag,
                "hover" | "click" => Gesture::Pointer {
                    events: spec.handlers.keys().cloned().collect(),
                },
                other => {
                    warn!(behavior = other, "unknown behavior type, skipping");
                    return None;
                }
            };
            Some(BoundBehavior {
                behavior_type: spec.behavior_type.clone(),
                target: spec.target.clone(),
                gesture,
                handlers: spec.handlers.clone(),
            })
        })
        .collect()
}

fn pair(value: Option<&Value>) -> Option<(f64, f64)> {
    let items = value?.as_array()?;
    Some((items.first()?.as_f64()?, items.get(1)?.as_f64()?))
}

fn corners(value: Option<&Value>) -> Option<[[f64; 2]; 2]> {
    let items = value?.as_array()?;
    let corner = |v: &Value| -> Option<[f64; 2]> {
        let p = v.as_array()?;
        Some([p.first()?.as_f64()?, p.get(1)?.as_f64()?])
    };
    Some([corner(items.first()?)?, corner(items.get(1)?)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn space() -> VisualSpace {
        VisualSpace {
            width: 640.0,
            height: 480.0,
            background: None,
            clips: Vec::new(),
        }
    }

    fn spec(behavior_type: &str, params: Value) -> BehaviorSpec {
        BehaviorSpec {
            behavior_type: behavior_type.to_string(),
            target: None,
            params: serde_json::from_value(params).unwrap(),
            handlers: IndexMap::new(),
        }
    }

    #[test]
    fn test_zoom_defaults_fill_from_surface() {
        let bound = bind_behaviors(&[spec("zoom", json!({}))], &space());
        assert_eq!(bound.len(), 1);
        match &bound[0].gesture {
            Gesture::Zoom {
                scale_extent,
                translate_extent,
            } => {
                assert_eq!(*scale_extent, (1.0, 10.0));
                assert_eq!(*translate_extent, [[0.0, 0.0], [640.0, 480.0]]);
            }
            other => panic!("expected zoom, got {other:?}"),
        }
    }

    #[test]
    fn test_brush_axis_from_params() {
        let bound = bind_behaviors(&[spec("brush", json!({"axis": "x"}))], &space());
        match &bound[0].gesture {
            Gesture::Brush { axis, .. } => assert_eq!(*axis, BrushAxis::X),
            other => panic!("expected brush, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_behavior_is_skipped() {
        let bound = bind_behaviors(
            &[spec("lasso", json!({})), spec("pan", json!({}))],
            &space(),
        );
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].behavior_type, "pan");
    }

    #[test]
    fn test_hover_collects_handler_events() {
        let mut hover = spec("hover", json!({}));
        hover.handlers.insert(
            "pointerenter".to_string(),
            HandlerSpec {
                action: "highlight".to_string(),
                params: IndexMap::new(),
            },
        );
        let bound = bind_behaviors(&[hover], &space());
        match &bound[0].gesture {
            Gesture::Pointer { events } => assert_eq!(events, &["pointerenter"]),
            other => panic!("expected pointer, got {other:?}"),
        }
    }
}
