//! Canonical chart schema: one declarative document that can describe any
//! chart type, rendered by a single generic engine.
//!
//! The schema document is plain data (JSON-serializable) so it can be
//! authored, edited, and exchanged by surrounding tooling. This crate holds
//! the document model, a pure structural validator, and a best-guess schema
//! inference helper for raw row data.

pub mod behavior;
pub mod data;
pub mod document;
pub mod error;
pub mod infer;
pub mod layer;
pub mod scale;
pub mod validate;

pub use behavior::{AnimationSpec, AnimationStep, BehaviorSpec, HandlerSpec};
pub use data::{
    DataPipelineSpec, DataSource, FieldDef, FieldType, GeneratedKind, GeneratedOptions,
    SourceFormat, TransformSpec,
};
pub use document::{ChartMetadata, ChartSchema, ClipDef, VisualSpace};
pub use error::PlotlineSchemaError;
pub use infer::{infer_schema, InferOptions};
pub use layer::{
    ChannelSpec, ChannelTransform, CompareOp, Condition, GeneratorSpec, LayerSpec, MarkSpec,
};
pub use scale::{DomainFrom, DomainMethod, NiceSpec, ScaleSpec};
pub use validate::{validate, Validation};
