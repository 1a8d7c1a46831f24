//! The render entrypoint: schema in, scene + bindings out, plus the
//! live handle for updates, introspection, and force ticking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use plotline_data::{DataPipeline, Dataset, NamedDatasets};
use plotline_scales::{Scale, ScaleRegistry};
use plotline_scene::SceneGraph;
use plotline_schema::{validate, ChartSchema, DataSource, PlotlineSchemaError};

use crate::animation::{bind_animations, AnimationTimeline};
use crate::behavior::{bind_behaviors, BoundBehavior};
use crate::compositor::LayerCompositor;
use crate::error::PlotlineChartError;
use crate::resolve::ScaleSet;

/// Everything one full render pass derives from the schema. Replaced
/// wholesale on re-render; nothing is diffed or patched.
pub struct RenderedChart {
    pub scene: SceneGraph,
    pub datasets: NamedDatasets,
    pub scales: ScaleSet,
    pub behaviors: Vec<BoundBehavior>,
    pub timeline: AnimationTimeline,
    pub simulation: Option<plotline_data::ForceSimulation>,
}

/// Stateless pipeline-to-scene driver. Shared across handles; per-chart
/// state lives on [`ChartHandle`].
pub struct ChartRenderer {
    pipeline: DataPipeline,
    scales: ScaleRegistry,
    compositor: LayerCompositor,
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self {
            pipeline: DataPipeline::new(),
            scales: ScaleRegistry::with_builtins(),
            compositor: LayerCompositor::new(),
        }
    }

    pub fn pipeline_mut(&mut self) -> &mut DataPipeline {
        &mut self.pipeline
    }

    pub fn scales_mut(&mut self) -> &mut ScaleRegistry {
        &mut self.scales
    }

    pub fn compositor_mut(&mut self) -> &mut LayerCompositor {
        &mut self.compositor
    }

    /// One full pass: validate, load, transform, build scales, compose
    /// layers, bind behaviors and animations. Structural errors are fatal
    /// before any work happens.
    pub async fn render(&self, schema: &ChartSchema) -> Result<RenderedChart, PlotlineChartError> {
        let validation = validate(schema);
        for warning in &validation.warnings {
            warn!(chart = %schema.id, "{warning}");
        }
        if !validation.valid {
            return Err(PlotlineChartError::InvalidSchema(
                validation.errors.join("; "),
            ));
        }

        let result = self.pipeline.run(&schema.data).await?;

        let mut scales = ScaleSet::new();
        for (name, spec) in &schema.scales {
            let scale = self.scales.build(spec, &result.datasets)?;
            scales.insert(name.clone(), Arc::from(scale));
        }

        let scene = self.compositor.compose(schema, &result.datasets, &scales);
        let behaviors = bind_behaviors(&schema.behaviors, &schema.space);
        let timeline = bind_animations(&schema.animations);
        debug!(
            chart = %schema.id,
            layers = scene.layers.len(),
            primitives = scene.primitive_count(),
            "chart rendered"
        );

        Ok(RenderedChart {
            scene,
            datasets: result.datasets,
            scales,
            behaviors,
            timeline,
            simulation: result.simulation,
        })
    }

    /// Re-run only the layer pass over already-loaded datasets.
    pub fn compose(
        &self,
        schema: &ChartSchema,
        datasets: &NamedDatasets,
        scales: &ScaleSet,
    ) -> SceneGraph {
        self.compositor.compose(schema, datasets, scales)
    }

    /// Render the schema and wrap the result in a live handle.
    pub async fn mount(
        self: Arc<Self>,
        schema: ChartSchema,
    ) -> Result<ChartHandle, PlotlineChartError> {
        let rendered = self.render(&schema).await?;
        Ok(ChartHandle {
            schema,
            renderer: self,
            rendered,
            generation: Arc::new(AtomicU64::new(1)),
        })
    }
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A mounted chart: the schema document plus its latest derived state.
pub struct ChartHandle {
    schema: ChartSchema,
    renderer: Arc<ChartRenderer>,
    rendered: RenderedChart,
    generation: Arc<AtomicU64>,
}

impl ChartHandle {
    pub fn schema(&self) -> &ChartSchema {
        &self.schema
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.rendered.scene
    }

    pub fn scale(&self, name: &str) -> Option<&Arc<dyn Scale>> {
        self.rendered.scales.get(name)
    }

    pub fn dataset(&self, name: &str) -> Option<&Dataset> {
        self.rendered.datasets.get(name)
    }

    pub fn behaviors(&self) -> &[BoundBehavior] {
        &self.rendered.behaviors
    }

    pub fn timeline(&self) -> &AnimationTimeline {
        &self.rendered.timeline
    }

    /// Monotonic count of completed render passes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Replace the schema's data source with inline rows and re-render.
    pub async fn update_data(&mut self, rows: Dataset) -> Result<(), PlotlineChartError> {
        self.schema.data.source = DataSource::Inline {
            data: Value::Array(rows),
        };
        self.render_pass().await
    }

    /// JSON-merge a patch onto the schema document and re-render.
    pub async fn update_schema(&mut self, patch: &Value) -> Result<(), PlotlineChartError> {
        let mut document =
            serde_json::to_value(&self.schema).map_err(PlotlineSchemaError::from)?;
        merge_patch(&mut document, patch);
        self.schema = serde_json::from_value(document).map_err(PlotlineSchemaError::from)?;
        self.render_pass().await
    }

    /// Advance the retained force simulation and recompose. Returns the
    /// number of ticks actually applied before the layout cooled.
    pub fn tick(&mut self, ticks: usize) -> usize {
        let Some(simulation) = self.rendered.simulation.as_mut() else {
            return 0;
        };
        let mut applied = 0;
        for _ in 0..ticks {
            if !simulation.tick() {
                break;
            }
            applied += 1;
        }
        if applied > 0 {
            self.rendered
                .datasets
                .insert("main", simulation.nodes_dataset());
            let link_sets: Vec<String> = self
                .rendered
                .datasets
                .names()
                .filter(|name| name.ends_with("_links"))
                .map(str::to_string)
                .collect();
            let links = simulation.links_dataset();
            for name in link_sets {
                self.rendered.datasets.insert(name, links.clone());
            }
            self.rendered.scene = self.renderer.compose(
                &self.schema,
                &self.rendered.datasets,
                &self.rendered.scales,
            );
        }
        applied
    }

    /// Full re-render; the previous pass's derived state is dropped
    /// wholesale. A pass that finishes after a newer one started is
    /// abandoned instead of clobbering fresher output.
    async fn render_pass(&mut self) -> Result<(), PlotlineChartError> {
        let pass = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let rendered = self.renderer.render(&self.schema).await?;
        if self.generation.load(Ordering::SeqCst) != pass {
            debug!(chart = %self.schema.id, pass, "stale render pass abandoned");
            return Ok(());
        }
        self.rendered = rendered;
        Ok(())
    }
}

/// RFC 7386 style merge: objects merge recursively, null deletes,
/// everything else replaces.
fn merge_patch(target: &mut Value, patch: &Value) {
    match patch {
        Value::Object(entries) => {
            if !target.is_object() {
                *target = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(map) = target {
                for (key, value) in entries {
                    if value.is_null() {
                        map.remove(key);
                    } else {
                        merge_patch(map.entry(key.clone()).or_insert(Value::Null), value);
                    }
                }
            }
        }
        other => *target = other.clone(),
    }
}
