//! Serde helpers for fields that arrive as strings, numbers or booleans.
//!
//! Rule values and severities are typed by whoever produced the payload
//! (spreadsheets, automation jobs), so `120` and `"120"` must both land as
//! the same field.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a JSON scalar as a string. Objects, arrays and null yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Deserialize an optional scalar into an optional string.
pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => scalar_to_string(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a string, number or boolean")),
    }
}

/// Deserialize an optional integer given either as a number or a numeric string.
pub fn opt_int<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("'{n}' is not a valid integer"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a valid integer"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected an integer, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_string")]
        value: Option<String>,
        #[serde(default, deserialize_with = "opt_int")]
        severity: Option<i32>,
    }

    #[test]
    fn numbers_become_strings() {
        let probe: Probe = serde_json::from_value(json!({ "value": 120, "severity": 2 })).unwrap();
        assert_eq!(probe.value.as_deref(), Some("120"));
        assert_eq!(probe.severity, Some(2));
    }

    #[test]
    fn numeric_string_severity_is_accepted() {
        let probe: Probe =
            serde_json::from_value(json!({ "value": "DELETE", "severity": " 3 " })).unwrap();
        assert_eq!(probe.value.as_deref(), Some("DELETE"));
        assert_eq!(probe.severity, Some(3));
    }

    #[test]
    fn missing_and_null_fields_are_none() {
        let probe: Probe = serde_json::from_value(json!({ "value": null })).unwrap();
        assert!(probe.value.is_none());
        assert!(probe.severity.is_none());
    }

    #[test]
    fn objects_are_rejected() {
        let result: Result<Probe, _> = serde_json::from_value(json!({ "value": { "a": 1 } }));
        assert!(result.is_err());
    }

    #[test]
    fn non_numeric_severity_is_rejected() {
        let result: Result<Probe, _> = serde_json::from_value(json!({ "severity": "high" }));
        assert!(result.is_err());
    }
}
