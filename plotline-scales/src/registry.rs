//! Scale construction: a strategy registry keyed by the spec's family
//! tag, plus `domainFrom` inference against the pipeline's datasets.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use plotline_data::{field_path, value_as_f64, value_as_string, NamedDatasets};
use plotline_schema::{DomainMethod, ScaleSpec};

use crate::continuous::NumericScale;
use crate::discrete::{BandScale, OrdinalScale};
use crate::discretize::{QuantileScale, QuantizeScale, ThresholdScale};
use crate::error::PlotlineScaleError;
use crate::identity::IdentityScale;
use crate::scheme;
use crate::sequential::{DivergingScale, SequentialScale};
use crate::temporal::{epoch_millis, TimeScale};
use crate::Scale;

/// Builds one scale family from a spec and its resolved domain values.
pub type ScaleBuilder =
    Arc<dyn Fn(&ScaleSpec, &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> + Send + Sync>;

/// Caller-registered domain reducer for `method: custom`.
pub type DomainReducer = Arc<dyn Fn(&[Value]) -> Vec<Value> + Send + Sync>;

pub struct ScaleRegistry {
    builders: HashMap<String, ScaleBuilder>,
    reducers: HashMap<String, DomainReducer>,
}

impl ScaleRegistry {
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
            reducers: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for family in ["linear", "log", "sqrt", "pow"] {
            registry.register(family, Arc::new(build_numeric));
        }
        registry.register("time", Arc::new(build_time));
        registry.register("utc", Arc::new(build_time));
        registry.register("ordinal", Arc::new(build_ordinal));
        registry.register("band", Arc::new(build_band));
        registry.register("point", Arc::new(build_band));
        registry.register("sequential", Arc::new(build_sequential));
        registry.register("diverging", Arc::new(build_diverging));
        registry.register("threshold", Arc::new(build_threshold));
        registry.register("quantize", Arc::new(build_quantize));
        registry.register("quantile", Arc::new(build_quantile));
        registry.register("identity", Arc::new(|_, _| {
            Ok(Box::new(IdentityScale) as Box<dyn Scale>)
        }));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, builder: ScaleBuilder) {
        self.builders.insert(name.into(), builder);
    }

    pub fn register_reducer(&mut self, name: impl Into<String>, reducer: DomainReducer) {
        self.reducers.insert(name.into(), reducer);
    }

    /// Build the scale a spec describes, inferring its domain from the
    /// named datasets when `domainFrom` is present.
    pub fn build(
        &self,
        spec: &ScaleSpec,
        datasets: &NamedDatasets,
    ) -> Result<Box<dyn Scale>, PlotlineScaleError> {
        let domain = self.resolve_domain(spec, datasets)?;
        let builder = match self.builders.get(&spec.scale_type) {
            Some(builder) => builder.clone(),
            None => {
                warn!(scale_type = %spec.scale_type, "unknown scale type, using linear");
                self.builders
                    .get("linear")
                    .cloned()
                    .ok_or(PlotlineScaleError::EmptyDomain)?
            }
        };
        let mut scale = builder(spec, &domain)?;
        for (name, value) in &spec.params {
            scale.set_option(name, value);
        }
        Ok(scale)
    }

    /// Explicit domain wins; otherwise reduce the referenced dataset
    /// field by the requested method.
    fn resolve_domain(
        &self,
        spec: &ScaleSpec,
        datasets: &NamedDatasets,
    ) -> Result<Vec<Value>, PlotlineScaleError> {
        if let Some(domain) = &spec.domain {
            return Ok(domain.clone());
        }
        let Some(from) = &spec.domain_from else {
            return Ok(Vec::new());
        };
        let name = from.data.as_deref().unwrap_or("main");
        let rows = datasets
            .get(name)
            .ok_or_else(|| PlotlineScaleError::DatasetLookupError(name.to_string()))?;
        let values: Vec<Value> = rows
            .iter()
            .filter_map(|row| field_path(row, &from.field).cloned())
            .filter(|v| !v.is_null())
            .collect();

        match &from.method {
            DomainMethod::Extent => {
                let (min, max) = numeric_extent(&values)?;
                Ok(vec![json!(min), json!(max)])
            }
            DomainMethod::Max => {
                let (_, max) = numeric_extent(&values)?;
                Ok(vec![json!(0.0), json!(max)])
            }
            DomainMethod::Min => {
                let (min, _) = numeric_extent(&values)?;
                Ok(vec![json!(min), json!(0.0)])
            }
            DomainMethod::Values => {
                let mut seen = std::collections::HashSet::new();
                Ok(values
                    .into_iter()
                    .filter(|v| seen.insert(value_as_string(v)))
                    .collect())
            }
            DomainMethod::Custom(reducer) => {
                let reducer = self
                    .reducers
                    .get(reducer)
                    .ok_or_else(|| PlotlineScaleError::UnknownDomainMethod(reducer.clone()))?;
                Ok(reducer(&values))
            }
        }
    }
}

impl Default for ScaleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Numeric view of a domain value, accepting epoch date strings so time
/// extents infer like numeric ones.
fn as_number(value: &Value) -> Option<f64> {
    value_as_f64(value).or_else(|| epoch_millis(value))
}

fn numeric_extent(values: &[Value]) -> Result<(f64, f64), PlotlineScaleError> {
    let numbers: Vec<f64> = values.iter().filter_map(as_number).collect();
    if numbers.is_empty() {
        return Err(PlotlineScaleError::EmptyDomain);
    }
    let min = numbers.iter().copied().fold(f64::MAX, f64::min);
    let max = numbers.iter().copied().fold(f64::MIN, f64::max);
    Ok((min, max))
}

/// Two-ended numeric domain from resolved values; defaults to [0, 1].
fn endpoints(domain: &[Value]) -> (f64, f64) {
    let lo = domain.first().and_then(as_number).unwrap_or(0.0);
    let hi = domain.last().and_then(as_number).unwrap_or(1.0);
    (lo, hi)
}

/// Two-ended numeric range from the spec, honoring `reverse`.
fn range_endpoints(spec: &ScaleSpec) -> (f64, f64) {
    let (lo, hi) = match &spec.range {
        Some(range) => (
            range.first().and_then(Value::as_f64).unwrap_or(0.0),
            range.last().and_then(Value::as_f64).unwrap_or(1.0),
        ),
        None => (0.0, 1.0),
    };
    if spec.reverse {
        (hi, lo)
    } else {
        (lo, hi)
    }
}

fn string_domain(domain: &[Value]) -> Vec<String> {
    domain.iter().map(value_as_string).collect()
}

fn build_numeric(spec: &ScaleSpec, domain: &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let mut scale = match spec.scale_type.as_str() {
        "log" => NumericScale::log(10.0),
        "sqrt" => NumericScale::sqrt(),
        "pow" => NumericScale::pow(1.0),
        _ => NumericScale::linear(),
    };
    if !domain.is_empty() {
        scale = scale.with_domain(endpoints(domain));
    }
    scale = scale
        .with_range(range_endpoints(spec))
        .with_clamp(spec.clamp);
    if let Some(count) = spec.nice.and_then(|n| n.count()) {
        scale = scale.nice(count);
    }
    Ok(Box::new(scale))
}

fn build_time(spec: &ScaleSpec, domain: &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let lo = domain.first().and_then(as_number).ok_or_else(|| {
        PlotlineScaleError::InvalidDomain("time scale needs a parseable domain".to_string())
    })?;
    let hi = domain.last().and_then(as_number).ok_or_else(|| {
        PlotlineScaleError::InvalidDomain("time scale needs a parseable domain".to_string())
    })?;
    let scale = TimeScale::new((lo, hi), range_endpoints(spec), spec.scale_type == "utc")
        .with_clamp(spec.clamp);
    Ok(Box::new(scale))
}

fn build_ordinal(spec: &ScaleSpec, domain: &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let mut range = match (&spec.range, &spec.scheme) {
        (Some(range), _) => range.clone(),
        (None, Some(scheme)) => scheme::palette(scheme)?,
        (None, None) => scheme::palette("category10")?,
    };
    if spec.reverse {
        range.reverse();
    }
    Ok(Box::new(OrdinalScale::try_new(string_domain(domain), range)?))
}

fn build_band(spec: &ScaleSpec, domain: &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let domain = string_domain(domain);
    let scale = if spec.scale_type == "point" {
        BandScale::try_new_point(domain)?
    } else {
        BandScale::try_new(domain)?
    };
    Ok(Box::new(scale.with_range(range_endpoints(spec))))
}

fn build_sequential(
    spec: &ScaleSpec,
    domain: &[Value],
) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let name = spec.interpolator.as_deref().unwrap_or("viridis");
    let (mut lo, mut hi) = endpoints(domain);
    if spec.reverse {
        std::mem::swap(&mut lo, &mut hi);
    }
    Ok(Box::new(SequentialScale::new(
        (lo, hi),
        scheme::interpolator(name)?,
    )))
}

fn build_diverging(
    spec: &ScaleSpec,
    domain: &[Value],
) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let (lo, hi) = endpoints(domain);
    let mid = if domain.len() >= 3 {
        domain.get(1).and_then(as_number).unwrap_or((lo + hi) / 2.0)
    } else {
        (lo + hi) / 2.0
    };
    let name = spec.interpolator.as_deref().unwrap_or("blues");
    Ok(Box::new(DivergingScale::new(
        (lo, mid, hi),
        scheme::interpolator(name)?,
    )))
}

fn build_threshold(
    spec: &ScaleSpec,
    domain: &[Value],
) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let thresholds: Vec<f64> = domain.iter().filter_map(as_number).collect();
    let range = spec.range.clone().ok_or_else(|| {
        PlotlineScaleError::InvalidRange("threshold scale needs an explicit range".to_string())
    })?;
    Ok(Box::new(ThresholdScale::try_new(thresholds, range)?))
}

fn build_quantize(spec: &ScaleSpec, domain: &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let range = match (&spec.range, &spec.scheme) {
        (Some(range), _) => range.clone(),
        (None, Some(scheme)) => scheme::palette(scheme)?,
        (None, None) => {
            return Err(PlotlineScaleError::InvalidRange(
                "quantize scale needs a range or scheme".to_string(),
            ))
        }
    };
    Ok(Box::new(QuantizeScale::try_new(endpoints(domain), range)?))
}

fn build_quantile(spec: &ScaleSpec, domain: &[Value]) -> Result<Box<dyn Scale>, PlotlineScaleError> {
    let samples: Vec<f64> = domain.iter().filter_map(as_number).collect();
    let range = spec.range.clone().ok_or_else(|| {
        PlotlineScaleError::InvalidRange("quantile scale needs an explicit range".to_string())
    })?;
    Ok(Box::new(QuantileScale::try_new(samples, range)?))
}
