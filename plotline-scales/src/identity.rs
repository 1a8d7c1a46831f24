//! Identity scale: values pass through untouched. Used when a channel
//! carries already-visual values (pixel positions, literal colors).

use serde_json::Value;

use crate::Scale;

#[derive(Debug, Clone, Default)]
pub struct IdentityScale;

impl Scale for IdentityScale {
    fn scale_type(&self) -> &'static str {
        "identity"
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            None
        } else {
            Some(value.clone())
        }
    }

    fn domain(&self) -> Vec<Value> {
        Vec::new()
    }

    fn range(&self) -> Vec<Value> {
        Vec::new()
    }

    fn invert(&self, value: &Value) -> Option<Value> {
        Some(value.clone())
    }
}
