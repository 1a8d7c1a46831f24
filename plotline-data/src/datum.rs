//! Dot-path field access and value coercion over open JSON rows.

use std::cmp::Ordering;

use serde_json::Value;

/// Resolve a dot-path (`"a.b.c"`) into a nested row object.
///
/// Total: any missing or non-object segment yields `None`. Explicit
/// segment splitting and stepwise lookup, no expression evaluation.
pub fn field_path<'a>(datum: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = datum;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Numeric view of a JSON value; numeric-looking strings are accepted.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// String view used for grouping keys and ordinal domains.
pub fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Comparison consistent with sort-by-field semantics: numbers before
/// strings, nulls last.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (value_as_f64(a), value_as_f64(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            _ => value_as_string(a).cmp(&value_as_string(b)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path_nested() {
        let datum = json!({"a": {"b": {"c": 42}}, "list": [{"v": 1}, {"v": 2}]});
        assert_eq!(field_path(&datum, "a.b.c"), Some(&json!(42)));
        assert_eq!(field_path(&datum, "list.1.v"), Some(&json!(2)));
    }

    #[test]
    fn test_field_path_missing_is_none() {
        let datum = json!({"a": {"b": 1}});
        assert_eq!(field_path(&datum, "a.b.c"), None);
        assert_eq!(field_path(&datum, "missing"), None);
        assert_eq!(field_path(&json!(3), "x"), None);
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(value_as_f64(&json!(2.5)), Some(2.5));
        assert_eq!(value_as_f64(&json!(" 7 ")), Some(7.0));
        assert_eq!(value_as_f64(&json!("abc")), None);
        assert_eq!(value_as_f64(&json!(null)), None);
    }

    #[test]
    fn test_compare_null_last() {
        assert_eq!(compare_values(&json!(1), &json!(2)), Ordering::Less);
        assert_eq!(compare_values(&json!(null), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
    }
}
