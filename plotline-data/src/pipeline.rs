//! The pipeline: load the source, run the transform list in order, and
//! publish named datasets for layers and scales to reference.
//!
//! Two names are reserved: `source` holds the rows as loaded and `main`
//! holds the rows after the final transform. A step with an `output`
//! name additionally caches its result under that name, and any side
//! datasets it produces land under `<output>_<suffix>`.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use plotline_schema::DataPipelineSpec;

use crate::error::PlotlineDataError;
use crate::source::SourceLoader;
use crate::transform::{force::ForceSimulation, TransformRegistry};
use crate::Dataset;

/// Datasets keyed by name, in publication order.
#[derive(Debug, Clone, Default)]
pub struct NamedDatasets {
    datasets: IndexMap<String, Dataset>,
}

impl NamedDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.datasets.insert(name.into(), dataset);
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    /// The post-transform dataset; empty slice if the pipeline never ran.
    pub fn main(&self) -> &[Value] {
        self.datasets.get("main").map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.datasets.iter().map(|(name, data)| (name.as_str(), data))
    }
}

/// Everything a pipeline run produces.
pub struct PipelineResult {
    pub datasets: NamedDatasets,
    /// Present when a force step ran; the runtime ticks it for animated
    /// layouts.
    pub simulation: Option<ForceSimulation>,
}

/// Source loader plus transform registry, run against a pipeline spec.
#[derive(Clone, Default)]
pub struct DataPipeline {
    loader: SourceLoader,
    registry: TransformRegistry,
}

impl DataPipeline {
    pub fn new() -> Self {
        Self {
            loader: SourceLoader::new(),
            registry: TransformRegistry::with_builtins(),
        }
    }

    pub fn with_parts(loader: SourceLoader, registry: TransformRegistry) -> Self {
        Self { loader, registry }
    }

    pub fn loader_mut(&mut self) -> &mut SourceLoader {
        &mut self.loader
    }

    pub fn registry_mut(&mut self) -> &mut TransformRegistry {
        &mut self.registry
    }

    pub async fn run(&self, spec: &DataPipelineSpec) -> Result<PipelineResult, PlotlineDataError> {
        let rows = self.loader.load(&spec.source).await?;
        debug!(rows = rows.len(), "source loaded");

        let mut datasets = NamedDatasets::new();
        datasets.insert("source", rows.clone());

        let mut current = rows;
        let mut simulation = None;
        for step in &spec.transforms {
            let Some((name, transform)) = self.resolve(&step.transform_type, &step.params) else {
                warn!(transform = %step.transform_type, "unknown transform, passing data through");
                continue;
            };
            let out = transform.apply(current, &step.params)?;
            debug!(transform = %name, rows = out.data.len(), "transform applied");
            current = out.data;
            if out.simulation.is_some() {
                simulation = out.simulation;
            }
            let base = step.output.as_deref();
            if let Some(output) = base {
                datasets.insert(output, current.clone());
            }
            for (suffix, extra) in out.extras {
                // side datasets still publish without an output name
                let base = base.unwrap_or(&name);
                datasets.insert(format!("{base}_{suffix}"), extra);
            }
        }

        datasets.insert("main", current);
        Ok(PipelineResult {
            datasets,
            simulation,
        })
    }

    /// Registry lookup, with `custom` steps naming their entry in params.
    fn resolve(
        &self,
        transform_type: &str,
        params: &IndexMap<String, Value>,
    ) -> Option<(String, std::sync::Arc<dyn crate::transform::Transform>)> {
        let name = if transform_type == "custom" {
            params.get("name").and_then(Value::as_str)?
        } else {
            transform_type
        };
        self.registry.get(name).map(|t| (name.to_string(), t))
    }
}
