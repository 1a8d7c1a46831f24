//! Time scales: linear interpolation over epoch milliseconds, with
//! tolerant parsing of the date shapes JSON rows actually carry.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};

use crate::continuous::NumericScale;
use crate::Scale;

/// Parse a row value into epoch milliseconds. Accepts numbers (already
/// epoch ms), RFC 3339 strings, and bare `YYYY-MM-DD` dates.
pub fn epoch_millis(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
                return Some(instant.timestamp_millis() as f64);
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                return Some(naive.and_utc().timestamp_millis() as f64);
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis() as f64);
            }
            None
        }
        _ => None,
    }
}

/// Linear scale over time. The `utc` flag only changes how the domain is
/// reported; arithmetic is epoch-based either way.
pub struct TimeScale {
    inner: NumericScale,
    utc: bool,
}

impl TimeScale {
    pub fn new(domain: (f64, f64), range: (f64, f64), utc: bool) -> Self {
        Self {
            inner: NumericScale::linear().with_domain(domain).with_range(range),
            utc,
        }
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.inner = self.inner.with_clamp(clamp);
        self
    }
}

impl Scale for TimeScale {
    fn scale_type(&self) -> &'static str {
        if self.utc {
            "utc"
        } else {
            "time"
        }
    }

    fn apply(&self, value: &Value) -> Option<Value> {
        let ms = epoch_millis(value)?;
        self.inner.apply(&json!(ms))
    }

    fn domain(&self) -> Vec<Value> {
        self.inner
            .domain()
            .into_iter()
            .map(|v| {
                let Some(ms) = v.as_f64() else {
                    return v;
                };
                match DateTime::<Utc>::from_timestamp_millis(ms as i64) {
                    Some(instant) => json!(instant.to_rfc3339()),
                    None => v,
                }
            })
            .collect()
    }

    fn range(&self) -> Vec<Value> {
        self.inner.range()
    }

    fn invert(&self, value: &Value) -> Option<Value> {
        self.inner.invert(value)
    }

    fn set_option(&mut self, name: &str, value: &Value) {
        self.inner.set_option(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_epoch_millis_parses_common_shapes() {
        assert_eq!(epoch_millis(&json!(1000)), Some(1000.0));
        assert_eq!(epoch_millis(&json!("1970-01-01")), Some(0.0));
        assert_eq!(
            epoch_millis(&json!("1970-01-02T00:00:00Z")),
            Some(86_400_000.0)
        );
        assert_eq!(epoch_millis(&json!("not a date")), None);
    }

    #[test]
    fn test_time_scale_interpolates_between_dates() {
        let start = epoch_millis(&json!("2020-01-01")).unwrap();
        let end = epoch_millis(&json!("2020-01-03")).unwrap();
        let scale = TimeScale::new((start, end), (0.0, 100.0), true);
        let mid = scale.apply(&json!("2020-01-02")).unwrap();
        assert_approx_eq!(f64, mid.as_f64().unwrap(), 50.0);
    }
}
