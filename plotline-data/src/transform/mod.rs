//! Declarative transform steps and their registry.
//!
//! Each transform is a strategy object keyed by its type tag. The registry
//! is seeded with the built-ins at startup and callers can register their
//! own entries before a render pass; dispatch is registry lookup plus a
//! documented pass-through fallback, never a growing conditional chain.

pub mod basic;
pub mod bin;
pub mod force;
pub mod geo;
pub mod hierarchy;
pub mod stack;

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::PlotlineDataError;
use crate::Dataset;

/// Result of one transform step.
pub struct TransformOutput {
    /// Dataset fed to the next step
    pub data: Dataset,
    /// Side datasets published next to the step's `output` name under
    /// `<output>_<suffix>` (e.g. a force layout's "links")
    pub extras: Vec<(String, Dataset)>,
    /// A stateful simulation handed to the runtime for tick-driven
    /// re-rendering
    pub simulation: Option<force::ForceSimulation>,
}

impl From<Dataset> for TransformOutput {
    fn from(data: Dataset) -> Self {
        Self {
            data,
            extras: Vec::new(),
            simulation: None,
        }
    }
}

/// One named step in the data pipeline: dataset in, dataset out.
pub trait Transform: Send + Sync {
    fn apply(
        &self,
        data: Dataset,
        params: &IndexMap<String, Value>,
    ) -> Result<TransformOutput, PlotlineDataError>;
}

/// Named transform strategies, seeded with built-ins, open to callers.
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    /// Empty registry; useful for tests that want full control.
    pub fn new() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Registry seeded with every built-in transform.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("filter", Arc::new(basic::FilterTransform));
        registry.register("sort", Arc::new(basic::SortTransform));
        registry.register("group", Arc::new(basic::GroupTransform));
        registry.register("stack", Arc::new(stack::StackTransform));
        registry.register("bin", Arc::new(bin::BinTransform));
        registry.register("hierarchy", Arc::new(hierarchy::HierarchyTransform));
        registry.register("treemap", Arc::new(hierarchy::TreemapTransform));
        registry.register("partition", Arc::new(hierarchy::PartitionTransform));
        registry.register("pack", Arc::new(hierarchy::PackTransform));
        registry.register("tree", Arc::new(hierarchy::TreeTransform));
        registry.register("cluster", Arc::new(hierarchy::ClusterTransform));
        registry.register("force", Arc::new(force::ForceTransform));
        registry.register("projection", Arc::new(geo::ProjectionTransform));
        registry.register("pie", Arc::new(geo::PieTransform));
        registry.register("voronoi", Arc::new(geo::VoronoiTransform));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, transform: Arc<dyn Transform>) {
        self.transforms.insert(name.into(), transform);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transform>> {
        self.transforms.get(name).cloned()
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
