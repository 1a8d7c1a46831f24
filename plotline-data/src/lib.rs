//! Data pipeline: load a source dataset and run an ordered list of
//! declarative transforms over it, producing named datasets for the
//! renderer's layers and scales.
//!
//! Rows are open JSON objects with heterogeneous key sets; field access is
//! dot-path based and total (missing paths resolve to nothing, never a
//! panic). Transforms are strategy objects in a registry seeded with
//! built-ins; unknown transform tags pass data through unchanged with a
//! warning, a deliberate tolerance policy for an evolving schema format.

pub mod array;
pub mod datum;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod source;
pub mod transform;

pub use datum::{compare_values, field_path, value_as_f64, value_as_string};
pub use error::PlotlineDataError;
pub use pipeline::{DataPipeline, NamedDatasets, PipelineResult};
pub use source::SourceLoader;
pub use transform::{Transform, TransformOutput, TransformRegistry};
pub use transform::force::ForceSimulation;

/// One ordered collection of row-like records.
pub type Dataset = Vec<serde_json::Value>;
