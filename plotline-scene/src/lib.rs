//! Renderer-neutral scene graph.
//!
//! The compositor emits one [`SceneLayer`] per schema layer, each holding
//! flat lists of [`ScenePrimitive`]s with open attribute bags. Backends
//! walk the graph and draw; nothing here knows about pixels or SVG.
//!
//! An attribute a datum could not produce is simply absent from the bag.
//! Absence is the only "no value" representation; attribute values are
//! never null.

pub mod graph;
pub mod primitive;

pub use graph::{SceneGraph, SceneLayer};
pub use primitive::{AttrBag, ScenePrimitive};
