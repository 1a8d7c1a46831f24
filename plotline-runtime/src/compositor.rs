//! Layer composition: ordering, visibility conditions, and per-layer
//! mark dispatch into a [`SceneGraph`].

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use plotline_data::{compare_values, field_path, value_as_string, NamedDatasets};
use plotline_scene::{SceneGraph, SceneLayer};
use plotline_schema::{ChartSchema, CompareOp, Condition, LayerSpec};

use crate::marks::{MarkContext, MarkRegistry};
use crate::resolve::ScaleSet;

/// Caller-registered visibility predicate over the loaded datasets.
pub type LayerPredicate = Arc<dyn Fn(&NamedDatasets) -> bool + Send + Sync>;

/// Turns the ordered layer list into scene layers, skipping layers whose
/// `when` condition fails and delegating drawing to the mark registry.
#[derive(Clone, Default)]
pub struct LayerCompositor {
    marks: MarkRegistry,
    predicates: HashMap<String, LayerPredicate>,
}

impl LayerCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn marks_mut(&mut self) -> &mut MarkRegistry {
        &mut self.marks
    }

    pub fn register_predicate(&mut self, name: impl Into<String>, predicate: LayerPredicate) {
        self.predicates.insert(name.into(), predicate);
    }

    pub fn compose(
        &self,
        schema: &ChartSchema,
        datasets: &NamedDatasets,
        scales: &ScaleSet,
    ) -> SceneGraph {
        let mut graph = SceneGraph::new(schema.space.width, schema.space.height);
        graph.background = schema.space.background.as_ref().and_then(|style| {
            style
                .get("fill")
                .or_else(|| style.get("color"))
                .map(value_as_string)
        });

        // stable sort keeps declaration order for equal keys
        let mut ordered: Vec<(usize, &LayerSpec)> = schema.layers.iter().enumerate().collect();
        ordered.sort_by_key(|(_, layer)| layer.order.unwrap_or(0));

        for (index, layer) in ordered {
            let layer_id = layer
                .id
                .clone()
                .unwrap_or_else(|| format!("layer-{index}"));
            let dataset_name = layer.data.as_deref().unwrap_or("main");
            let data: &[Value] = match datasets.get(dataset_name) {
                Some(rows) => rows.as_slice(),
                None => {
                    warn!(layer = %layer_id, dataset = dataset_name, "layer dataset not found");
                    &[]
                }
            };

            if let Some(condition) = &layer.when {
                if !self.check(condition, data, datasets) {
                    debug!(layer = %layer_id, "layer hidden by condition");
                    continue;
                }
            }

            let mut scene_layer = SceneLayer::new(layer_id, layer.mark.mark_type.clone());
            if let Some(style) = &layer.style {
                scene_layer.style = style.clone();
            }
            scene_layer.clip = layer.clip.clone();
            scene_layer.blend_mode = layer.blend_mode.clone();
            scene_layer.primitives = self.marks.dispatch(&MarkContext {
                layer,
                data,
                scales,
                width: schema.space.width,
                height: schema.space.height,
            });
            graph.layers.push(scene_layer);
        }
        graph
    }

    fn check(&self, condition: &Condition, data: &[Value], datasets: &NamedDatasets) -> bool {
        match condition {
            Condition::Expression { field, op, value } => data
                .first()
                .map(|row| compare(row, field, *op, value))
                .unwrap_or(false),
            Condition::Data { data } => {
                let name = data.as_deref().unwrap_or("main");
                datasets.get(name).map(|rows| !rows.is_empty()).unwrap_or(false)
            }
            Condition::Predicate { name } => match self.predicates.get(name) {
                Some(predicate) => predicate(datasets),
                None => {
                    warn!(predicate = %name, "unregistered layer predicate, hiding layer");
                    false
                }
            },
        }
    }
}

fn compare(row: &Value, field: &str, op: CompareOp, expected: &Value) -> bool {
    let actual = field_path(row, field);
    match op {
        CompareOp::NotNull => actual.map(|v| !v.is_null()).unwrap_or(false),
        CompareOp::Eq => actual == Some(expected),
        CompareOp::Neq => actual != Some(expected),
        CompareOp::In => match expected {
            Value::Array(items) => actual.map(|v| items.contains(v)).unwrap_or(false),
            _ => false,
        },
        CompareOp::Gt | CompareOp::Gte | CompareOp::Lt | CompareOp::Lte => {
            let Some(actual) = actual else { return false };
            let ordering = compare_values(actual, expected);
            match op {
                CompareOp::Gt => ordering == Ordering::Greater,
                CompareOp::Gte => ordering != Ordering::Less,
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Lte => ordering != Ordering::Greater,
                _ => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use plotline_schema::{ChannelSpec, DataPipelineSpec, DataSource, MarkSpec, VisualSpace};
    use serde_json::json;

    fn schema(layers: Vec<LayerSpec>) -> ChartSchema {
        ChartSchema {
            id: "test".to_string(),
            title: None,
            description: None,
            data: DataPipelineSpec {
                source: DataSource::Inline { data: json!([]) },
                transforms: Vec::new(),
                fields: Vec::new(),
            },
            space: VisualSpace {
                width: 100.0,
                height: 100.0,
                background: None,
                clips: Vec::new(),
            },
            scales: IndexMap::new(),
            layers,
            behaviors: Vec::new(),
            animations: Vec::new(),
            metadata: None,
        }
    }

    fn layer(id: &str, order: Option<i32>) -> LayerSpec {
        LayerSpec {
            id: Some(id.to_string()),
            data: None,
            mark: MarkSpec::new("circle"),
            encoding: IndexMap::new(),
            style: None,
            when: None,
            order,
            blend_mode: None,
            clip: None,
        }
    }

    fn datasets(rows: Vec<Value>) -> NamedDatasets {
        let mut sets = NamedDatasets::default();
        sets.insert("main", rows);
        sets
    }

    #[test]
    fn test_layers_sorted_by_order_with_stable_ties() {
        let schema = schema(vec![
            layer("c", Some(2)),
            layer("a", Some(0)),
            layer("b", Some(0)),
        ]);
        let graph = LayerCompositor::new().compose(&schema, &datasets(vec![]), &ScaleSet::new());
        let ids: Vec<&str> = graph.layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_data_condition_hides_layer_on_empty_dataset() {
        let mut hidden = layer("hidden", None);
        hidden.when = Some(Condition::Data { data: None });
        let schema = schema(vec![hidden]);
        let graph = LayerCompositor::new().compose(&schema, &datasets(vec![]), &ScaleSet::new());
        assert!(graph.layers.is_empty());
    }

    #[test]
    fn test_expression_condition_checks_first_row() {
        let mut gated = layer("gated", None);
        gated.when = Some(Condition::Expression {
            field: "count".to_string(),
            op: CompareOp::Gte,
            value: json!(10),
        });
        let schema = schema(vec![gated]);
        let compositor = LayerCompositor::new();

        let visible = compositor.compose(
            &schema,
            &datasets(vec![json!({"count": 12})]),
            &ScaleSet::new(),
        );
        assert_eq!(visible.layers.len(), 1);

        let hidden = compositor.compose(
            &schema,
            &datasets(vec![json!({"count": 3})]),
            &ScaleSet::new(),
        );
        assert!(hidden.layers.is_empty());
    }

    #[test]
    fn test_unregistered_predicate_hides_layer() {
        let mut gated = layer("gated", None);
        gated.when = Some(Condition::Predicate {
            name: "zoomed".to_string(),
        });
        let schema = schema(vec![gated]);
        let graph = LayerCompositor::new().compose(
            &schema,
            &datasets(vec![json!({})]),
            &ScaleSet::new(),
        );
        assert!(graph.layers.is_empty());
    }

    #[test]
    fn test_missing_dataset_renders_empty_layer() {
        let mut orphan = layer("orphan", None);
        orphan.data = Some("absent".to_string());
        orphan
            .encoding
            .insert("x".to_string(), ChannelSpec::field("x"));
        let schema = schema(vec![orphan]);
        let graph = LayerCompositor::new().compose(&schema, &datasets(vec![]), &ScaleSet::new());
        assert_eq!(graph.layers.len(), 1);
        assert!(graph.layers[0].primitives.is_empty());
    }
}
