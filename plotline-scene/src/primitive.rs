use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Open attribute bag; keys are visual attribute names (`cx`, `fill`,
/// `width`, ...). Attributes without a value are omitted, never null.
pub type AttrBag = IndexMap<String, Value>;

/// One drawable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScenePrimitive {
    /// Outline geometry carried as an SVG-style path expression
    Path {
        d: String,
        #[serde(default)]
        attrs: AttrBag,
    },
    /// Positioned closed shape (circle, rect, ellipse, line, polygon...)
    Shape {
        shape: String,
        #[serde(default)]
        attrs: AttrBag,
    },
    Text {
        content: String,
        #[serde(default)]
        attrs: AttrBag,
    },
    /// Container used by the generic fallback and composite marks
    Group {
        #[serde(default)]
        children: Vec<ScenePrimitive>,
        #[serde(default)]
        attrs: AttrBag,
    },
}

impl ScenePrimitive {
    pub fn path(d: impl Into<String>) -> Self {
        Self::Path {
            d: d.into(),
            attrs: AttrBag::new(),
        }
    }

    pub fn shape(shape: impl Into<String>) -> Self {
        Self::Shape {
            shape: shape.into(),
            attrs: AttrBag::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
            attrs: AttrBag::new(),
        }
    }

    pub fn group(children: Vec<ScenePrimitive>) -> Self {
        Self::Group {
            children,
            attrs: AttrBag::new(),
        }
    }

    pub fn attrs(&self) -> &AttrBag {
        match self {
            Self::Path { attrs, .. }
            | Self::Shape { attrs, .. }
            | Self::Text { attrs, .. }
            | Self::Group { attrs, .. } => attrs,
        }
    }

    pub fn attrs_mut(&mut self) -> &mut AttrBag {
        match self {
            Self::Path { attrs, .. }
            | Self::Shape { attrs, .. }
            | Self::Text { attrs, .. }
            | Self::Group { attrs, .. } => attrs,
        }
    }

    /// Set an attribute, dropping nulls instead of storing them.
    pub fn with_attr(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: Value) {
        if !value.is_null() {
            self.attrs_mut().insert(name.into(), value);
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs().get(name)
    }
}
