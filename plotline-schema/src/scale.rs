use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative scale definition.
///
/// Exactly one of `domain` / `domain_from` should be honored; when both are
/// present the explicit `domain` wins. Entries in `params` are applied
/// generically by name: a scale family picks up the options it exposes and
/// ignores the rest, so new scale parameters need no registry changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSpec {
    /// Open family tag (linear, log, sqrt, pow, time, utc, ordinal, band,
    /// point, sequential, diverging, threshold, quantile, quantize,
    /// identity). Unknown tags fall back to linear.
    #[serde(rename = "type")]
    pub scale_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_from: Option<DomainFrom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Vec<Value>>,
    /// Named categorical color scheme used as the range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Named continuous color interpolator (sequential/diverging families)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nice: Option<NiceSpec>,
    #[serde(default)]
    pub clamp: bool,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub params: IndexMap<String, Value>,
}

impl ScaleSpec {
    pub fn new(scale_type: impl Into<String>) -> Self {
        Self {
            scale_type: scale_type.into(),
            domain: None,
            domain_from: None,
            range: None,
            scheme: None,
            interpolator: None,
            nice: None,
            clamp: false,
            reverse: false,
            params: IndexMap::new(),
        }
    }

    pub fn domain(mut self, domain: Vec<Value>) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn domain_from(
        mut self,
        data: impl Into<String>,
        field: impl Into<String>,
        method: DomainMethod,
    ) -> Self {
        self.domain_from = Some(DomainFrom {
            data: Some(data.into()),
            field: field.into(),
            method,
        });
        self
    }

    pub fn range(mut self, range: Vec<Value>) -> Self {
        self.range = Some(range);
        self
    }
}

/// Domain-inference directive: read a named dataset's field and reduce the
/// value array by `method`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainFrom {
    /// Dataset name; defaults to "main"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub field: String,
    #[serde(default)]
    pub method: DomainMethod,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DomainMethod {
    /// `[min, max]` of the observed values
    #[default]
    Extent,
    /// `[0, max]`
    Max,
    /// `[min, 0]`
    Min,
    /// Distinct values in first-seen order
    Values,
    /// Caller-registered reducer given the raw value array
    Custom(String),
}

/// `nice` accepts a plain toggle or an approximate tick count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NiceSpec {
    Enabled(bool),
    Count(u32),
}

impl NiceSpec {
    /// Tick count to round to, or `None` when niceing is off.
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::Enabled(true) => Some(10),
            Self::Enabled(false) => None,
            Self::Count(n) => Some(*n as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_from_defaults() {
        let spec: ScaleSpec = serde_json::from_value(json!({
            "type": "linear",
            "domainFrom": {"field": "value", "method": "max"},
            "range": [350, 50],
            "nice": true
        }))
        .unwrap();
        let from = spec.domain_from.unwrap();
        assert_eq!(from.data, None);
        assert_eq!(from.method, DomainMethod::Max);
        assert_eq!(spec.nice.unwrap().count(), Some(10));
    }

    #[test]
    fn test_nice_count() {
        let spec: ScaleSpec =
            serde_json::from_value(json!({"type": "linear", "nice": 5})).unwrap();
        assert_eq!(spec.nice.unwrap().count(), Some(5));
    }

    #[test]
    fn test_explicit_domain_survives_round_trip() {
        let spec = ScaleSpec::new("band")
            .domain(vec![json!("A"), json!("B")])
            .range(vec![json!(0), json!(100)]);
        let text = serde_json::to_string(&spec).unwrap();
        let back: ScaleSpec = serde_json::from_str(&text).unwrap();
        assert_eq!(back, spec);
    }
}
