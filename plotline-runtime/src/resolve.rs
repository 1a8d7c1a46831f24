//! Channel resolution: one datum + one channel spec -> one visual value.
//!
//! Resolution is total. Every failure mode (missing field, value the
//! scale can't map, non-numeric input to a numeric transform) resolves to
//! `None`, and the caller omits the attribute.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{json, Value};
use tracing::warn;

use plotline_data::{field_path, value_as_f64};
use plotline_scales::Scale;
use plotline_schema::{ChannelSpec, ChannelTransform};

/// The scales built for one render pass, by name.
#[derive(Clone, Default)]
pub struct ScaleSet {
    scales: IndexMap<String, Arc<dyn Scale>>,
}

impl ScaleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, scale: Arc<dyn Scale>) {
        self.scales.insert(name.into(), scale);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Scale>> {
        self.scales.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scales.keys().map(String::as_str)
    }
}

/// Resolve a channel against a datum.
///
/// A constant `value` wins over `field` and bypasses the scale; channel
/// transforms still apply. A named scale missing from the set resolves
/// the field unscaled.
pub fn resolve(datum: &Value, channel: &ChannelSpec, scales: &ScaleSet) -> Option<Value> {
    let mut current = if let Some(constant) = &channel.value {
        constant.clone()
    } else {
        let field = channel.field.as_deref()?;
        let raw = field_path(datum, field)?.clone();
        if raw.is_null() {
            return None;
        }
        match channel.scale.as_deref().and_then(|name| scales.get(name)) {
            Some(scale) => scale.apply(&raw)?,
            None => raw,
        }
    };

    for transform in &channel.transform {
        current = apply_transform(&current, transform)?;
    }
    Some(current)
}

fn apply_transform(value: &Value, transform: &ChannelTransform) -> Option<Value> {
    match transform {
        ChannelTransform::Custom { name } => {
            warn!(transform = %name, "unregistered custom channel transform, value unchanged");
            Some(value.clone())
        }
        numeric => {
            let v = value_as_f64(value)?;
            let out = match numeric {
                ChannelTransform::Offset { by } => v + by,
                ChannelTransform::Multiply { by } => v * by,
                ChannelTransform::Log => {
                    if v > 0.0 {
                        v.ln()
                    } else {
                        return None;
                    }
                }
                ChannelTransform::Sqrt => {
                    if v >= 0.0 {
                        v.sqrt()
                    } else {
                        return None;
                    }
                }
                ChannelTransform::Abs => v.abs(),
                ChannelTransform::Negate => -v,
                ChannelTransform::Custom { .. } => unreachable!(),
            };
            Some(json!(out))
        }
    }
}
