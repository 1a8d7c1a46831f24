//! Scale families: mappings from data values to visual values.
//!
//! Every family implements the object-safe [`Scale`] trait so the
//! channel resolver can treat them uniformly. Scales are built from a
//! [`plotline_schema::ScaleSpec`] by the [`registry::ScaleRegistry`],
//! which also resolves `domainFrom` inference against the pipeline's
//! named datasets.

pub mod continuous;
pub mod discrete;
pub mod discretize;
pub mod error;
pub mod identity;
pub mod registry;
pub mod scheme;
pub mod sequential;
pub mod temporal;

use serde_json::Value;

pub use continuous::NumericScale;
pub use discrete::{BandScale, OrdinalScale};
pub use discretize::{QuantileScale, QuantizeScale, ThresholdScale};
pub use error::PlotlineScaleError;
pub use identity::IdentityScale;
pub use registry::ScaleRegistry;
pub use sequential::{DivergingScale, SequentialScale};
pub use temporal::TimeScale;

/// A mapping from data values to visual values.
///
/// `apply` is total: a value the scale has no answer for yields `None`,
/// and the caller omits the channel rather than panicking or inventing
/// a default.
pub trait Scale: Send + Sync {
    fn scale_type(&self) -> &'static str;

    fn apply(&self, value: &Value) -> Option<Value>;

    fn domain(&self) -> Vec<Value>;

    fn range(&self) -> Vec<Value>;

    /// Width of one band; `None` for non-band families.
    fn bandwidth(&self) -> Option<f64> {
        None
    }

    /// Range position of the domain's zero, used as an area/bar baseline.
    fn zero_position(&self) -> Option<f64> {
        None
    }

    /// Range value back to domain value, where the family supports it.
    fn invert(&self, _value: &Value) -> Option<Value> {
        None
    }

    /// Apply a generic option by name. Families pick up the options they
    /// expose and silently ignore the rest.
    fn set_option(&mut self, _name: &str, _value: &Value) {}
}
