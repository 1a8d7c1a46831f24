//! The render pass: a validated chart schema goes through load,
//! transform, scale construction, value resolution, mark dispatch, and
//! layer composition, ending in a serializable scene plus interaction
//! and animation bindings.
//!
//! Rendering is full-replace: every pass derives all state from the
//! schema document and drops the previous pass wholesale. The
//! [`renderer::ChartHandle`] keeps the live pieces (datasets, scales,
//! retained force simulation) between passes.

pub mod animation;
pub mod behavior;
pub mod compositor;
pub mod error;
pub mod generator;
pub mod marks;
pub mod registry;
pub mod renderer;
pub mod resolve;

pub use animation::{bind_animations, AnimationTimeline, TimelineEntry};
pub use behavior::{bind_behaviors, BoundBehavior, BrushAxis, Gesture};
pub use compositor::{LayerCompositor, LayerPredicate};
pub use error::PlotlineChartError;
pub use generator::Curve;
pub use marks::{MarkContext, MarkRegistry, MarkRenderer};
pub use registry::ChartRegistry;
pub use renderer::{ChartHandle, ChartRenderer, RenderedChart};
pub use resolve::{resolve, ScaleSet};
