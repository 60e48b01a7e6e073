//! Typed rule parameters and variables.
//!
//! Every rule keeps its parameters in a serde-derived config struct. The
//! outside world sees them as a flat `ParamMap` (name -> value), which is also
//! the shape persisted in the settings file. Updates go through
//! [`merge_config`]: the current struct is serialized, the updates are laid
//! over it, and the result is deserialized back, so serde does the type
//! checking and unknown names are caught before anything changes.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{RuleError, RuleResult};

/// Scalar parameter or variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Parameter name -> value. Ordered for stable display and persistence.
pub type ParamMap = BTreeMap<String, ParamValue>;

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    fn to_json(&self) -> Option<Value> {
        match self {
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Int(i) => Some(Value::Number(Number::from(*i))),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number),
            Self::Str(s) => Some(Value::String(s.clone())),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Int(i))
                } else if n.is_u64() {
                    n.as_u64().map(|u| Self::Int(u.min(i64::MAX as u64) as i64))
                } else {
                    n.as_f64().map(Self::Float)
                }
            }
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// Flatten a config struct into a `ParamMap`.
///
/// Non-scalar fields are skipped.
pub fn to_param_map<T: Serialize>(config: &T) -> ParamMap {
    match serde_json::to_value(config) {
        Ok(Value::Object(fields)) => fields
            .iter()
            .filter_map(|(k, v)| ParamValue::from_json(v).map(|pv| (k.clone(), pv)))
            .collect(),
        _ => ParamMap::new(),
    }
}

/// Lay `updates` over `current` and return the merged config.
///
/// Fails without side effects on an unknown name or a value serde cannot
/// coerce into the field type. Range checks are left to the caller.
pub fn merge_config<T>(rule: &str, current: &T, updates: &ParamMap) -> RuleResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut fields: Map<String, Value> = match serde_json::to_value(current) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) | Err(_) => {
            return Err(RuleError::InvalidType {
                rule: rule.to_string(),
                message: "config is not a flat struct".to_string(),
            })
        }
    };

    for (name, value) in updates {
        if !fields.contains_key(name) {
            return Err(RuleError::UnknownParameter {
                rule: rule.to_string(),
                param: name.clone(),
            });
        }
        let json = value
            .to_json()
            .ok_or_else(|| RuleError::out_of_range(rule, name, "value is not finite"))?;
        fields.insert(name.clone(), json);
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| RuleError::InvalidType {
        rule: rule.to_string(),
        message: e.to_string(),
    })
}

/// Convert a window length in seconds to milliseconds.
pub fn window_ms(seconds: f64) -> u64 {
    (seconds * 1000.0).round() as u64
}

/// Range check shared by window-length parameters.
pub fn ensure_positive_seconds(rule: &str, param: &str, seconds: f64) -> RuleResult<()> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(RuleError::out_of_range(
            rule,
            param,
            format!("must be a positive number of seconds, got {}", seconds),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct SampleConfig {
        enabled: bool,
        limit: u32,
        window: f64,
        label: String,
    }

    fn sample() -> SampleConfig {
        SampleConfig {
            enabled: true,
            limit: 10,
            window: 1.0,
            label: "x".to_string(),
        }
    }

    #[test]
    fn test_to_param_map() {
        let map = to_param_map(&sample());
        assert_eq!(map.get("enabled"), Some(&ParamValue::Bool(true)));
        assert_eq!(map.get("limit"), Some(&ParamValue::Int(10)));
        assert_eq!(map.get("window"), Some(&ParamValue::Float(1.0)));
        assert_eq!(map.get("label"), Some(&ParamValue::Str("x".to_string())));
    }

    #[test]
    fn test_merge_partial_update_keeps_other_fields() {
        let mut updates = ParamMap::new();
        updates.insert("limit".to_string(), ParamValue::Int(3));

        let merged = merge_config("sample", &sample(), &updates).unwrap();
        assert_eq!(merged.limit, 3);
        assert!(merged.enabled);
        assert_eq!(merged.window, 1.0);
    }

    #[test]
    fn test_merge_int_widens_into_float_field() {
        let mut updates = ParamMap::new();
        updates.insert("window".to_string(), ParamValue::Int(2));

        let merged = merge_config("sample", &sample(), &updates).unwrap();
        assert_eq!(merged.window, 2.0);
    }

    #[test]
    fn test_merge_unknown_parameter() {
        let mut updates = ParamMap::new();
        updates.insert("limit".to_string(), ParamValue::Int(3));
        updates.insert("bogus".to_string(), ParamValue::Int(1));

        let err = merge_config("sample", &sample(), &updates).unwrap_err();
        assert!(matches!(err, RuleError::UnknownParameter { ref param, .. } if param == "bogus"));
    }

    #[test]
    fn test_merge_wrong_type() {
        let mut updates = ParamMap::new();
        updates.insert("limit".to_string(), ParamValue::Str("ten".to_string()));
        assert!(matches!(
            merge_config("sample", &sample(), &updates),
            Err(RuleError::InvalidType { .. })
        ));

        let mut updates = ParamMap::new();
        updates.insert("limit".to_string(), ParamValue::Float(2.5));
        assert!(matches!(
            merge_config("sample", &sample(), &updates),
            Err(RuleError::InvalidType { .. })
        ));
    }

    #[test]
    fn test_merge_rejects_nan() {
        let mut updates = ParamMap::new();
        updates.insert("window".to_string(), ParamValue::Float(f64::NAN));
        assert!(matches!(
            merge_config("sample", &sample(), &updates),
            Err(RuleError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_param_value_untagged_serde() {
        let map: ParamMap =
            serde_json::from_str(r#"{"a": true, "b": 5, "c": 0.5, "d": "s"}"#).unwrap();
        assert_eq!(map["a"], ParamValue::Bool(true));
        assert_eq!(map["b"], ParamValue::Int(5));
        assert_eq!(map["c"], ParamValue::Float(0.5));
        assert_eq!(map["d"], ParamValue::Str("s".to_string()));
    }

    #[test]
    fn test_window_ms() {
        assert_eq!(window_ms(1.0), 1000);
        assert_eq!(window_ms(0.5), 500);
        assert_eq!(window_ms(0.0015), 2);
        assert!(ensure_positive_seconds("r", "w", 0.0).is_err());
        assert!(ensure_positive_seconds("r", "w", f64::INFINITY).is_err());
        assert!(ensure_positive_seconds("r", "w", 0.25).is_ok());
    }
}
