//! End-to-end render passes: schema document in, scene graph out.

use std::sync::Arc;

use float_cmp::assert_approx_eq;
use serde_json::{json, Value};

use plotline_data::value_as_f64;
use plotline_runtime::renderer::ChartRenderer;
use plotline_scene::ScenePrimitive;
use plotline_schema::ChartSchema;

fn schema_from(value: Value) -> ChartSchema {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    serde_json::from_value(value).expect("schema json")
}

fn bar_schema(rows: Value) -> ChartSchema {
    schema_from(json!({
        "id": "bars",
        "data": {"source": {"type": "inline", "data": rows}},
        "space": {"width": 100.0, "height": 100.0},
        "scales": {
            "x": {"type": "band", "domain": ["a", "b"], "range": [0, 100]},
            "y": {"type": "linear", "domain": [0, 10], "range": [100, 0]}
        },
        "layers": [{
            "id": "bars",
            "mark": {"type": "rect"},
            "encoding": {
                "x": {"field": "cat", "scale": "x"},
                "y": {"field": "v", "scale": "y"}
            }
        }]
    }))
}

fn attr_f64(primitive: &ScenePrimitive, name: &str) -> f64 {
    primitive
        .attr(name)
        .and_then(value_as_f64)
        .unwrap_or_else(|| panic!("missing numeric attr {name}"))
}

#[tokio::test]
async fn test_rendering_twice_produces_identical_scenes() {
    let schema = bar_schema(json!([
        {"cat": "a", "v": 10},
        {"cat": "b", "v": 5}
    ]));
    let renderer = ChartRenderer::new();
    let first = renderer.render(&schema).await.unwrap();
    let second = renderer.render(&schema).await.unwrap();
    assert_eq!(first.scene, second.scene);
}

#[tokio::test]
async fn test_band_and_linear_scales_place_two_bars() {
    let schema = bar_schema(json!([
        {"cat": "a", "v": 10},
        {"cat": "b", "v": 5}
    ]));
    let rendered = ChartRenderer::new().render(&schema).await.unwrap();
    let bars = &rendered.scene.layer("bars").unwrap().primitives;
    assert_eq!(bars.len(), 2);

    // first band starts at 0, second at the 50px step; width is the band
    assert_approx_eq!(f64, attr_f64(&bars[0], "x"), 0.0);
    assert_approx_eq!(f64, attr_f64(&bars[0], "width"), 50.0);
    assert_approx_eq!(f64, attr_f64(&bars[1], "x"), 50.0);

    // v=10 tops out at 0 and grounds at the scale's zero (100)
    assert_approx_eq!(f64, attr_f64(&bars[0], "y"), 0.0);
    assert_approx_eq!(f64, attr_f64(&bars[0], "height"), 100.0);
    assert_approx_eq!(f64, attr_f64(&bars[1], "y"), 50.0);
    assert_approx_eq!(f64, attr_f64(&bars[1], "height"), 50.0);
}

#[tokio::test]
async fn test_inferred_extent_domain_is_exact() {
    let schema = schema_from(json!({
        "id": "dots",
        "data": {"source": {"type": "inline", "data": [
            {"v": 3}, {"v": 9}, {"v": 1}
        ]}},
        "space": {"width": 100.0, "height": 100.0},
        "scales": {
            "y": {
                "type": "linear",
                "domainFrom": {"field": "v", "method": "extent"},
                "range": [100, 0]
            }
        },
        "layers": [{
            "mark": {"type": "circle"},
            "encoding": {"y": {"field": "v", "scale": "y"}}
        }]
    }));
    let rendered = ChartRenderer::new().render(&schema).await.unwrap();
    let domain = rendered.scales.get("y").unwrap().domain();
    let endpoints: Vec<f64> = domain.iter().filter_map(value_as_f64).collect();
    assert_eq!(endpoints, vec![1.0, 9.0]);
}

#[tokio::test]
async fn test_missing_field_omits_attribute_without_failing() {
    let schema = schema_from(json!({
        "id": "sparse",
        "data": {"source": {"type": "inline", "data": [
            {"x": 1, "y": 2},
            {"x": 3}
        ]}},
        "space": {"width": 100.0, "height": 100.0},
        "layers": [{
            "id": "dots",
            "mark": {"type": "circle"},
            "encoding": {
                "x": {"field": "x"},
                "y": {"field": "y"}
            }
        }]
    }));
    let rendered = ChartRenderer::new().render(&schema).await.unwrap();
    let dots = &rendered.scene.layer("dots").unwrap().primitives;
    assert_eq!(dots.len(), 2);
    assert!(dots[0].attr("cy").is_some());
    assert!(dots[1].attr("cy").is_none());
    assert!(dots[1].attr("cx").is_some());
}

#[tokio::test]
async fn test_layers_draw_in_order_with_stable_ties() {
    let schema = schema_from(json!({
        "id": "layered",
        "data": {"source": {"type": "inline", "data": [{"x": 1}]}},
        "space": {"width": 100.0, "height": 100.0},
        "layers": [
            {"id": "c", "order": 2, "mark": {"type": "circle"}, "encoding": {}},
            {"id": "a", "order": 0, "mark": {"type": "circle"}, "encoding": {}},
            {"id": "b", "order": 0, "mark": {"type": "circle"}, "encoding": {}}
        ]
    }));
    let rendered = ChartRenderer::new().render(&schema).await.unwrap();
    let ids: Vec<&str> = rendered
        .scene
        .layers
        .iter()
        .map(|layer| layer.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_unknown_mark_falls_back_to_group_per_row() {
    let rows: Vec<Value> = (0..5).map(|i| json!({"x": i})).collect();
    let schema = schema_from(json!({
        "id": "custom",
        "data": {"source": {"type": "inline", "data": rows}},
        "space": {"width": 100.0, "height": 100.0},
        "layers": [{
            "id": "custom",
            "mark": {"type": "hexbin"},
            "encoding": {"x": {"field": "x"}}
        }]
    }));
    let rendered = ChartRenderer::new().render(&schema).await.unwrap();
    let primitives = &rendered.scene.layer("custom").unwrap().primitives;
    assert_eq!(primitives.len(), 5);
    assert!(primitives
        .iter()
        .all(|p| matches!(p, ScenePrimitive::Group { .. })));
}

#[tokio::test]
async fn test_transform_order_changes_the_result() {
    let rows = json!([{"a": 1}, {"a": 2}, {"a": 3}]);
    let filter_then_stack = schema_from(json!({
        "id": "fs",
        "data": {
            "source": {"type": "inline", "data": rows},
            "transforms": [
                {"type": "filter", "params": {"field": "a", "op": "gte", "value": 2}},
                {"type": "stack", "params": {"keys": ["a"]}}
            ]
        },
        "space": {"width": 10.0, "height": 10.0},
        "layers": [{"mark": {"type": "rect"}, "encoding": {}}]
    }));
    let stack_then_filter = schema_from(json!({
        "id": "sf",
        "data": {
            "source": {"type": "inline", "data": rows},
            "transforms": [
                {"type": "stack", "params": {"keys": ["a"]}},
                {"type": "filter", "params": {"field": "a", "op": "gte", "value": 2}}
            ]
        },
        "space": {"width": 10.0, "height": 10.0},
        "layers": [{"mark": {"type": "rect"}, "encoding": {}}]
    }));

    let renderer = ChartRenderer::new();
    let first = renderer.render(&filter_then_stack).await.unwrap();
    let second = renderer.render(&stack_then_filter).await.unwrap();
    // stacked rows no longer carry `a` at the top level, so the late
    // filter drops everything
    assert_eq!(first.datasets.main().len(), 2);
    assert!(second.datasets.main().is_empty());
}

#[tokio::test]
async fn test_normalized_stack_spans_unit_interval() {
    let schema = schema_from(json!({
        "id": "normalized",
        "data": {
            "source": {"type": "inline", "data": [
                {"a": 2, "b": 6},
                {"a": 5, "b": 5}
            ]},
            "transforms": [
                {"type": "stack", "params": {"keys": ["a", "b"], "offset": "normalize"}}
            ]
        },
        "space": {"width": 10.0, "height": 10.0},
        "layers": [{"mark": {"type": "rect"}, "encoding": {}}]
    }));
    let rendered = ChartRenderer::new().render(&schema).await.unwrap();
    for index in 0..2 {
        let top = rendered
            .datasets
            .main()
            .iter()
            .filter(|row| row["index"] == json!(index))
            .filter_map(|row| row.get("y1").and_then(value_as_f64))
            .fold(0.0, f64::max);
        assert_approx_eq!(f64, top, 1.0, epsilon = 1e-9);
    }
}

#[tokio::test]
async fn test_invalid_schema_fails_before_any_work() {
    let schema = schema_from(json!({
        "id": "",
        "data": {"source": {"type": "inline", "data": []}},
        "space": {"width": 0.0, "height": 0.0},
        "layers": []
    }));
    let result = ChartRenderer::new().render(&schema).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_rerender_replaces_derived_state_and_bumps_generation() {
    let schema = bar_schema(json!([
        {"cat": "a", "v": 10},
        {"cat": "b", "v": 5}
    ]));
    let renderer = Arc::new(ChartRenderer::new());
    let mut handle = renderer.mount(schema).await.unwrap();
    assert_eq!(handle.generation(), 1);
    assert_eq!(handle.scene().primitive_count(), 2);

    handle
        .update_data(vec![json!({"cat": "a", "v": 4})])
        .await
        .unwrap();
    assert_eq!(handle.generation(), 2);
    // the previous pass's primitives are gone wholesale
    assert_eq!(handle.scene().primitive_count(), 1);
    assert_eq!(handle.dataset("main").unwrap().len(), 1);
}

#[tokio::test]
async fn test_schema_patch_rerenders_with_merged_document() {
    let schema = bar_schema(json!([
        {"cat": "a", "v": 10},
        {"cat": "b", "v": 5}
    ]));
    let renderer = Arc::new(ChartRenderer::new());
    let mut handle = renderer.mount(schema).await.unwrap();

    handle
        .update_schema(&json!({"space": {"width": 200.0}}))
        .await
        .unwrap();
    assert_eq!(handle.scene().width, 200.0);
    // untouched parts of the document survive the merge
    assert_eq!(handle.scene().height, 100.0);
    assert_eq!(handle.generation(), 2);
}

#[tokio::test]
async fn test_force_chart_ticks_through_the_handle() {
    let schema = schema_from(json!({
        "id": "network",
        "data": {
            "source": {"type": "inline", "data": [
                {"id": "a"}, {"id": "b"},
                {"source": "a", "target": "b"}
            ]},
            "transforms": [
                {"type": "force", "params": {"chargeStrength": 0.0}, "output": "layout"}
            ]
        },
        "space": {"width": 100.0, "height": 100.0},
        "layers": [{
            "id": "nodes",
            "mark": {"type": "circle"},
            "encoding": {
                "x": {"field": "x"},
                "y": {"field": "y"}
            }
        }]
    }));
    let renderer = Arc::new(ChartRenderer::new());
    let mut handle = renderer.mount(schema).await.unwrap();
    let before = handle.dataset("main").unwrap().clone();

    // the simulation already ran to quiescence during the pipeline, so
    // warm it and tick a few more steps
    let applied = handle.tick(5);
    if applied > 0 {
        let after = handle.dataset("main").unwrap();
        assert_ne!(&before, after);
    }
    assert_eq!(handle.dataset("main").unwrap().len(), 2);
}
