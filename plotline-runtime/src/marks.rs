//! Mark dispatch: strategy objects keyed by mark type turn a layer's
//! rows into scene primitives.
//!
//! Unknown mark types never error; they fall back to one generic group
//! per row so custom renderers downstream still see the resolved
//! attributes.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::warn;

use plotline_data::{value_as_f64, value_as_string};
use plotline_scene::{AttrBag, ScenePrimitive};
use plotline_schema::LayerSpec;

use crate::generator::{arc_path, area_path, line_path, Curve};
use crate::resolve::{resolve, ScaleSet};

/// Everything a mark needs for one layer pass.
pub struct MarkContext<'a> {
    pub layer: &'a LayerSpec,
    pub data: &'a [Value],
    pub scales: &'a ScaleSet,
    pub width: f64,
    pub height: f64,
}

pub trait MarkRenderer: Send + Sync {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive>;
}

/// Mark strategies by type tag, seeded with the built-in families.
#[derive(Clone)]
pub struct MarkRegistry {
    marks: HashMap<String, Arc<dyn MarkRenderer>>,
    fallback: Arc<dyn MarkRenderer>,
}

impl MarkRegistry {
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            marks: HashMap::new(),
            fallback: Arc::new(GenericMark),
        };
        registry.register("line", Arc::new(LineMark));
        registry.register("area", Arc::new(AreaMark));
        registry.register("arc", Arc::new(ArcMark));
        for tag in ["path", "geoshape", "contour"] {
            registry.register(tag, Arc::new(PathDataMark));
        }
        for tag in ["circle", "rect", "ellipse", "line-segment", "polygon", "symbol", "point"] {
            registry.register(tag, Arc::new(ShapeMark { kind: tag }));
        }
        registry.register("text", Arc::new(TextMark));
        registry.register("label", Arc::new(TextMark));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, mark: Arc<dyn MarkRenderer>) {
        self.marks.insert(name.into(), mark);
    }

    /// Render a layer, honoring `group_by` partitioning and falling back
    /// to the generic mark for unknown tags.
    pub fn dispatch(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        let mark_type = ctx.layer.mark.mark_type.as_str();
        let renderer = match self.marks.get(mark_type) {
            Some(renderer) => renderer.clone(),
            None => {
                warn!(mark = mark_type, "unknown mark type, using generic groups");
                self.fallback.clone()
            }
        };

        if ctx.layer.mark.group_by.is_empty() {
            return renderer.render(ctx);
        }

        // composite key partitioning, one sub-group per batch
        let mut batches: IndexMap<String, Vec<Value>> = IndexMap::new();
        for row in ctx.data {
            let key = ctx
                .layer
                .mark
                .group_by
                .iter()
                .map(|field| {
                    plotline_data::field_path(row, field)
                        .map(value_as_string)
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join("|");
            batches.entry(key).or_default().push(row.clone());
        }
        batches
            .into_iter()
            .map(|(key, batch)| {
                let sub_ctx = MarkContext {
                    layer: ctx.layer,
                    data: &batch,
                    scales: ctx.scales,
                    width: ctx.width,
                    height: ctx.height,
                };
                ScenePrimitive::group(renderer.render(&sub_ctx)).with_attr("key", json!(key))
            })
            .collect()
    }
}

impl Default for MarkRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Map a channel name onto the attribute a shape kind expects.
fn attr_name(kind: &str, channel: &str) -> String {
    let mapped = match (kind, channel) {
        ("circle" | "point", "x") => "cx",
        ("circle" | "point", "y") => "cy",
        ("circle" | "point", "size" | "radius") => "r",
        ("ellipse", "x") => "cx",
        ("ellipse", "y") => "cy",
        (_, "radius") => "r",
        (_, "size") => "width",
        (_, "color") => "fill",
        _ => channel,
    };
    mapped.to_string()
}

/// Resolve every encoding channel for one datum into an attribute bag,
/// then fill gaps with the mark's literal params.
fn resolve_attrs(ctx: &MarkContext, datum: &Value, kind: &str) -> AttrBag {
    let mut attrs = AttrBag::new();
    for (channel, spec) in &ctx.layer.encoding {
        if let Some(value) = resolve(datum, spec, ctx.scales) {
            attrs.insert(attr_name(kind, channel), value);
        }
    }
    for (name, value) in &ctx.layer.mark.params {
        let name = attr_name(kind, name);
        attrs.entry(name).or_insert_with(|| value.clone());
    }
    attrs
}

/// Uniform per-layer attributes (stroke, fill...) resolved against the
/// first row; path-like marks draw one primitive for many rows.
fn style_attrs(ctx: &MarkContext, positional: &[&str]) -> AttrBag {
    let Some(first) = ctx.data.first() else {
        return AttrBag::new();
    };
    let mut attrs = resolve_attrs(ctx, first, "path");
    for channel in positional {
        attrs.shift_remove(*channel);
    }
    attrs
}

fn resolved_points(ctx: &MarkContext, x: &str, y: &str) -> Vec<(f64, f64)> {
    ctx.data
        .iter()
        .filter_map(|row| {
            let x = channel_f64(ctx, row, x)?;
            let y = channel_f64(ctx, row, y)?;
            Some((x, y))
        })
        .collect()
}

fn channel_f64(ctx: &MarkContext, row: &Value, channel: &str) -> Option<f64> {
    let spec = ctx.layer.encoding.get(channel)?;
    resolve(row, spec, ctx.scales).as_ref().and_then(value_as_f64)
}

fn curve_of(ctx: &MarkContext) -> Curve {
    Curve::from_name(
        ctx.layer
            .mark
            .generator
            .as_ref()
            .and_then(|g| g.curve.as_deref()),
    )
}

/// Baseline position for areas and grounded rects: the y scale's zero,
/// else the bottom of the canvas.
fn y_baseline(ctx: &MarkContext) -> f64 {
    ctx.layer
        .encoding
        .get("y")
        .and_then(|spec| spec.scale.as_deref())
        .and_then(|name| ctx.scales.get(name))
        .and_then(|scale| scale.zero_position())
        .unwrap_or(ctx.height)
}

struct LineMark;

impl MarkRenderer for LineMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        let points = resolved_points(ctx, "x", "y");
        if points.is_empty() {
            return Vec::new();
        }
        let mut primitive = ScenePrimitive::path(line_path(&points, curve_of(ctx)));
        let attrs = style_attrs(ctx, &["x", "y"]);
        primitive.attrs_mut().extend(attrs);
        primitive.attrs_mut().entry("fill".to_string()).or_insert(json!("none"));
        vec![primitive]
    }
}

struct AreaMark;

impl MarkRenderer for AreaMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        let top = resolved_points(ctx, "x", "y");
        if top.is_empty() {
            return Vec::new();
        }
        let baseline: Vec<(f64, f64)> = if ctx.layer.encoding.contains_key("y2") {
            resolved_points(ctx, "x", "y2")
        } else {
            let y0 = y_baseline(ctx);
            top.iter().map(|(x, _)| (*x, y0)).collect()
        };
        let mut primitive = ScenePrimitive::path(area_path(&top, &baseline, curve_of(ctx)));
        primitive
            .attrs_mut()
            .extend(style_attrs(ctx, &["x", "y", "y2"]));
        vec![primitive]
    }
}

struct ArcMark;

impl ArcMark {
    /// Angles come from the pie transform's fields when present, else one
    /// pie pass over the `angle` (or `y`) channel.
    fn angles(ctx: &MarkContext) -> Vec<(f64, f64)> {
        let precomputed: Vec<Option<(f64, f64)>> = ctx
            .data
            .iter()
            .map(|row| {
                let start = row.get("startAngle").and_then(value_as_f64)?;
                let end = row.get("endAngle").and_then(value_as_f64)?;
                Some((start, end))
            })
            .collect();
        if precomputed.iter().all(Option::is_some) {
            return precomputed.into_iter().flatten().collect();
        }

        let channel = if ctx.layer.encoding.contains_key("angle") {
            "angle"
        } else {
            "y"
        };
        let values: Vec<f64> = ctx
            .data
            .iter()
            .map(|row| channel_f64(ctx, row, channel).unwrap_or(0.0).max(0.0))
            .collect();
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            return Vec::new();
        }
        let mut angle = 0.0;
        values
            .iter()
            .map(|v| {
                let sweep = std::f64::consts::TAU * v / total;
                let wedge = (angle, angle + sweep);
                angle += sweep;
                wedge
            })
            .collect()
    }
}

impl MarkRenderer for ArcMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        let params = &ctx.layer.mark.params;
        let number = |name: &str, default: f64| {
            params.get(name).and_then(Value::as_f64).unwrap_or(default)
        };
        let cx = number("cx", ctx.width / 2.0);
        let cy = number("cy", ctx.height / 2.0);
        let outer = number("outerRadius", ctx.width.min(ctx.height) / 2.0);
        let inner = number("innerRadius", 0.0);

        Self::angles(ctx)
            .into_iter()
            .enumerate()
            .map(|(index, (start, end))| {
                let mut primitive =
                    ScenePrimitive::path(arc_path(cx, cy, inner, outer, start, end));
                if let Some(row) = ctx.data.get(index) {
                    let attrs = resolve_attrs(ctx, row, "path");
                    for (name, value) in attrs {
                        if !matches!(name.as_str(), "x" | "y" | "angle" | "y2") {
                            primitive.set_attr(name, value);
                        }
                    }
                }
                primitive
            })
            .collect()
    }
}

/// geoshape / path / contour: path data is carried by the `path` channel.
struct PathDataMark;

impl MarkRenderer for PathDataMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        ctx.data
            .iter()
            .filter_map(|row| {
                let spec = ctx.layer.encoding.get("path")?;
                let d = resolve(row, spec, ctx.scales)?;
                let mut primitive = ScenePrimitive::path(value_as_string(&d));
                for (name, value) in resolve_attrs(ctx, row, "path") {
                    if name != "path" {
                        primitive.set_attr(name, value);
                    }
                }
                Some(primitive)
            })
            .collect()
    }
}

struct ShapeMark {
    kind: &'static str,
}

impl MarkRenderer for ShapeMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        ctx.data
            .iter()
            .map(|row| {
                let mut attrs = resolve_attrs(ctx, row, self.kind);
                match self.kind {
                    "rect" => ground_rect(ctx, &mut attrs),
                    "circle" | "point" => {
                        attrs.entry("r".to_string()).or_insert(json!(3.0));
                    }
                    "polygon" => flatten_points(&mut attrs),
                    _ => {}
                }
                let mut primitive = ScenePrimitive::shape(self.kind);
                for (name, value) in attrs {
                    primitive.set_attr(name, value);
                }
                primitive
            })
            .collect()
    }
}

/// Rect post-pass: derive height from y/y2, ground bars at the y zero
/// when only y is given, and default width to the x band.
fn ground_rect(ctx: &MarkContext, attrs: &mut AttrBag) {
    let y = attrs.get("y").and_then(value_as_f64);
    let y2 = attrs.shift_remove("y2").as_ref().and_then(value_as_f64);
    if let (Some(y), None) = (y, attrs.get("height").and_then(value_as_f64)) {
        let other = y2.unwrap_or_else(|| y_baseline(ctx));
        attrs.insert("y".to_string(), json!(y.min(other)));
        attrs.insert("height".to_string(), json!((other - y).abs()));
    }
    if !attrs.contains_key("width") {
        let band = ctx
            .layer
            .encoding
            .get("x")
            .and_then(|spec| spec.scale.as_deref())
            .and_then(|name| ctx.scales.get(name))
            .and_then(|scale| scale.bandwidth());
        if let Some(width) = band {
            attrs.insert("width".to_string(), json!(width));
        }
    }
}

/// Voronoi-style `[[x, y], ...]` arrays become an SVG points string.
fn flatten_points(attrs: &mut AttrBag) {
    if let Some(Value::Array(points)) = attrs.get("points").cloned() {
        let flat = points
            .iter()
            .filter_map(|p| {
                let x = p.get(0).and_then(Value::as_f64)?;
                let y = p.get(1).and_then(Value::as_f64)?;
                Some(format!("{x},{y}"))
            })
            .collect::<Vec<_>>()
            .join(" ");
        attrs.insert("points".to_string(), json!(flat));
    }
}

struct TextMark;

impl MarkRenderer for TextMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        ctx.data
            .iter()
            .filter_map(|row| {
                let spec = ctx.layer.encoding.get("text")?;
                let content = resolve(row, spec, ctx.scales)?;
                let mut primitive = ScenePrimitive::text(value_as_string(&content));
                for (name, value) in resolve_attrs(ctx, row, "text") {
                    if name != "text" {
                        primitive.set_attr(name, value);
                    }
                }
                Some(primitive)
            })
            .collect()
    }
}

/// Fallback for unknown mark types: one group per row carrying every
/// resolved channel, so external renderers can still draw something.
struct GenericMark;

impl MarkRenderer for GenericMark {
    fn render(&self, ctx: &MarkContext) -> Vec<ScenePrimitive> {
        ctx.data
            .iter()
            .map(|row| {
                let mut primitive = ScenePrimitive::group(Vec::new());
                for (name, value) in resolve_attrs(ctx, row, "group") {
                    primitive.set_attr(name, value);
                }
                primitive
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotline_scales::NumericScale;
    use plotline_schema::{ChannelSpec, MarkSpec};

    fn layer(mark: &str) -> LayerSpec {
        LayerSpec {
            id: None,
            data: None,
            mark: MarkSpec::new(mark),
            encoding: IndexMap::new(),
            style: None,
            when: None,
            order: None,
            blend_mode: None,
            clip: None,
        }
    }

    fn scale_set() -> ScaleSet {
        let mut set = ScaleSet::new();
        set.insert(
            "y",
            Arc::new(
                NumericScale::linear()
                    .with_domain((0.0, 10.0))
                    .with_range((100.0, 0.0)),
            ),
        );
        set
    }

    fn ctx<'a>(layer: &'a LayerSpec, data: &'a [Value], scales: &'a ScaleSet) -> MarkContext<'a> {
        MarkContext {
            layer,
            data,
            scales,
            width: 200.0,
            height: 100.0,
        }
    }

    #[test]
    fn test_line_mark_emits_single_path() {
        let mut layer = layer("line");
        layer.encoding.insert("x".to_string(), ChannelSpec::field("x"));
        layer.encoding.insert("y".to_string(), ChannelSpec::field("y"));
        let data = vec![json!({"x": 0, "y": 0}), json!({"x": 10, "y": 5})];
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        assert_eq!(out.len(), 1);
        match &out[0] {
            ScenePrimitive::Path { d, attrs } => {
                assert_eq!(d, "M0,0L10,5");
                assert_eq!(attrs.get("fill"), Some(&json!("none")));
            }
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_positions_map_to_cx_cy() {
        let mut layer = layer("circle");
        layer.encoding.insert("x".to_string(), ChannelSpec::field("x"));
        layer.encoding.insert("y".to_string(), ChannelSpec::field("y"));
        let data = vec![json!({"x": 3, "y": 4})];
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        let attrs = out[0].attrs();
        assert_eq!(attrs.get("cx"), Some(&json!(3)));
        assert_eq!(attrs.get("cy"), Some(&json!(4)));
        // default radius fills in
        assert_eq!(attrs.get("r"), Some(&json!(3.0)));
    }

    #[test]
    fn test_null_channel_is_omitted() {
        let mut layer = layer("circle");
        layer.encoding.insert("x".to_string(), ChannelSpec::field("x"));
        layer
            .encoding
            .insert("fill".to_string(), ChannelSpec::field("missing"));
        let data = vec![json!({"x": 1})];
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        assert!(out[0].attr("fill").is_none());
        assert!(out[0].attr("cx").is_some());
    }

    #[test]
    fn test_rect_grounds_at_scale_zero() {
        let mut layer = layer("rect");
        layer
            .encoding
            .insert("y".to_string(), ChannelSpec::scaled("v", "y"));
        let data = vec![json!({"v": 5.0})];
        let scales = scale_set();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        let attrs = out[0].attrs();
        // v=5 maps to 50; baseline at 100 (scale zero)
        assert_eq!(attrs.get("y"), Some(&json!(50.0)));
        assert_eq!(attrs.get("height"), Some(&json!(50.0)));
    }

    #[test]
    fn test_unknown_mark_renders_group_per_row() {
        let mut layer = layer("hexbin");
        layer.encoding.insert("x".to_string(), ChannelSpec::field("x"));
        let data: Vec<Value> = (0..5).map(|i| json!({"x": i})).collect();
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        assert_eq!(out.len(), 5);
        assert!(matches!(out[0], ScenePrimitive::Group { .. }));
    }

    #[test]
    fn test_group_by_partitions_batches() {
        let mut layer = layer("line");
        layer.mark.group_by = vec!["series".to_string()];
        layer.encoding.insert("x".to_string(), ChannelSpec::field("x"));
        layer.encoding.insert("y".to_string(), ChannelSpec::field("y"));
        let data = vec![
            json!({"series": "a", "x": 0, "y": 0}),
            json!({"series": "b", "x": 0, "y": 1}),
            json!({"series": "a", "x": 1, "y": 2}),
        ];
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].attr("key"), Some(&json!("a")));
        match &out[0] {
            ScenePrimitive::Group { children, .. } => assert_eq!(children.len(), 1),
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_arc_mark_uses_pie_fields_when_present() {
        let layer = layer("arc");
        let data = vec![
            json!({"startAngle": 0.0, "endAngle": 3.141592653589793}),
            json!({"startAngle": 3.141592653589793, "endAngle": 6.283185307179586}),
        ];
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], ScenePrimitive::Path { .. }));
    }

    #[test]
    fn test_text_mark_reads_text_channel() {
        let mut layer = layer("text");
        layer
            .encoding
            .insert("text".to_string(), ChannelSpec::field("name"));
        layer.encoding.insert("x".to_string(), ChannelSpec::field("x"));
        let data = vec![json!({"name": "peak", "x": 10})];
        let scales = ScaleSet::new();
        let out = MarkRegistry::with_builtins().dispatch(&ctx(&layer, &data, &scales));
        match &out[0] {
            ScenePrimitive::Text { content, attrs } => {
                assert_eq!(content, "peak");
                assert_eq!(attrs.get("x"), Some(&json!(10)));
                assert!(attrs.get("text").is_none());
            }
            other => panic!("expected text, got {other:?}"),
        }
    }
}
