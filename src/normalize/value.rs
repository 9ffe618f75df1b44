//! Lenient accessors over `serde_json::Value`.
//!
//! Providers disagree on key spelling and on whether numbers arrive as JSON
//! numbers or numeric strings; every accessor here accepts both and returns
//! `None` instead of failing.

use serde_json::Value;

/// First present, non-null value among `keys`.
pub fn get_any<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

pub fn as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-empty string; numbers are not stringified.
pub fn as_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn f64_at(obj: &Value, keys: &[&str]) -> Option<f64> {
    get_any(obj, keys).and_then(as_f64)
}

pub fn u32_at(obj: &Value, keys: &[&str]) -> Option<u32> {
    get_any(obj, keys).and_then(as_u32)
}

pub fn str_at<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(as_str)
}

pub fn bool_at(obj: &Value, keys: &[&str]) -> Option<bool> {
    get_any(obj, keys).and_then(as_bool)
}

/// Array elements that are JSON objects. A map is read as its values, in
/// payload order.
pub fn object_entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().filter(|item| item.is_object()).collect(),
        Value::Object(map) => map.values().filter(|item| item.is_object()).collect(),
        _ => Vec::new(),
    }
}

pub fn clamp_u32(value: Option<u32>, min: u32, max: u32, default: u32) -> u32 {
    value.map(|v| v.clamp(min, max)).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_and_numeric_strings_both_parse() {
        assert_eq!(as_u32(&json!(1308)), Some(1308));
        assert_eq!(as_u32(&json!("1308")), Some(1308));
        assert_eq!(as_u32(&json!(-1)), None);
        assert_eq!(as_f64(&json!("7.3%")), Some(7.3));
        assert_eq!(as_f64(&json!(null)), None);
    }

    #[test]
    fn get_any_skips_nulls() {
        let obj = json!({"a": null, "b": 2});
        assert_eq!(get_any(&obj, &["a", "b"]), Some(&json!(2)));
        assert_eq!(get_any(&json!([1]), &["a"]), None);
    }

    #[test]
    fn str_at_skips_blank_strings() {
        let obj = json!({"name": "  ", "avatarName": "Acheron"});
        assert_eq!(str_at(&obj, &["name", "avatarName"]), Some("Acheron"));
    }

    #[test]
    fn object_entries_reads_maps_in_payload_order() {
        let map: Value = serde_json::from_str(r#"{"b": {"n": 1}, "a": {"n": 2}, "c": 3}"#).unwrap();
        let entries = object_entries(&map);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["n"], json!(1));
        assert_eq!(entries[1]["n"], json!(2));
    }
}
