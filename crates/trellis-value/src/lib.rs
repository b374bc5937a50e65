//! Tagged property values for Trellis.
//!
//! Every style, extension and diff property carried by a DOM node is a
//! [`DomValue`]: a small, JSON-shaped variant type. The node model never
//! interprets most values itself; only the layout binding reads a handful of
//! well-known style keys.
//!
//! # Example
//!
//! ```
//! use trellis_value::DomValue;
//!
//! let width = DomValue::from(120.0);
//! assert_eq!(width.as_f64(), Some(120.0));
//!
//! let parsed = DomValue::from_json_str(r#"{"flexDirection": "row"}"#).unwrap();
//! assert_eq!(parsed.get("flexDirection").and_then(DomValue::as_str), Some("row"));
//! ```

mod error;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::{ValueError, ValueResult};

/// A JSON-shaped property value.
///
/// Serialization is untagged, so a `DomValue` reads and writes plain JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomValue {
    /// Absent / null value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value. All numbers are stored as `f64`.
    Number(f64),
    /// String value.
    String(String),
    /// Ordered list of values.
    Array(Vec<DomValue>),
    /// String-keyed map of values.
    Object(BTreeMap<String, DomValue>),
}

impl DomValue {
    /// Parse a value from JSON text.
    pub fn from_json_str(text: &str) -> ValueResult<Self> {
        serde_json::from_str(text).map_err(ValueError::Json)
    }

    /// Render the value as compact JSON text.
    pub fn to_json_string(&self) -> ValueResult<String> {
        serde_json::to_string(self).map_err(ValueError::Json)
    }

    /// Name of the variant, used in error messages and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Check whether this is [`DomValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// The numeric payload narrowed to `f32`, if this is a number.
    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|value| value as f32)
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// The list payload, if this is an array.
    pub fn as_array(&self) -> Option<&[DomValue]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// The map payload, if this is an object.
    pub fn as_object(&self) -> Option<&BTreeMap<String, DomValue>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is an object.
    pub fn get(&self, key: &str) -> Option<&DomValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            got: self.type_name(),
        }
    }
}

impl fmt::Display for DomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Self::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for DomValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for DomValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for DomValue {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for DomValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for DomValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for DomValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for DomValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<DomValue>> for DomValue {
    fn from(values: Vec<DomValue>) -> Self {
        Self::Array(values)
    }
}

impl From<BTreeMap<String, DomValue>> for DomValue {
    fn from(map: BTreeMap<String, DomValue>) -> Self {
        Self::Object(map)
    }
}

impl TryFrom<&DomValue> for bool {
    type Error = ValueError;

    fn try_from(value: &DomValue) -> ValueResult<Self> {
        value.as_bool().ok_or_else(|| value.mismatch("bool"))
    }
}

impl TryFrom<&DomValue> for f64 {
    type Error = ValueError;

    fn try_from(value: &DomValue) -> ValueResult<Self> {
        value.as_f64().ok_or_else(|| value.mismatch("number"))
    }
}

impl TryFrom<&DomValue> for String {
    type Error = ValueError;

    fn try_from(value: &DomValue) -> ValueResult<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| value.mismatch("string"))
    }
}

impl From<serde_json::Value> for DomValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(values) => {
                Self::Array(values.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<DomValue> for serde_json::Value {
    fn from(value: DomValue) -> Self {
        match value {
            DomValue::Null => Self::Null,
            DomValue::Bool(b) => Self::Bool(b),
            // JSON has no NaN/infinity; those collapse to null.
            DomValue::Number(n) => serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number),
            DomValue::String(s) => Self::String(s),
            DomValue::Array(values) => Self::Array(values.into_iter().map(Self::from).collect()),
            DomValue::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(DomValue::from(true).as_bool(), Some(true));
        assert_eq!(DomValue::from(3).as_f64(), Some(3.0));
        assert_eq!(DomValue::from("row").as_str(), Some("row"));
        assert!(DomValue::Null.is_null());
        assert_eq!(DomValue::from("row").as_f64(), None);
    }

    #[test]
    fn test_parse_nested_json() {
        let value = DomValue::from_json_str(r#"{"a": [1, "x", null], "b": {"c": false}}"#).unwrap();
        let array = value.get("a").and_then(DomValue::as_array).unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[1].as_str(), Some("x"));
        assert!(array[2].is_null());
        assert_eq!(value.get("b").and_then(|b| b.get("c")), Some(&DomValue::Bool(false)));
    }

    #[test]
    fn test_json_text_keeps_structure() {
        let value = DomValue::from_json_str(r#"{"width": 12.5, "tags": ["a", null]}"#).unwrap();
        assert_eq!(value.get("width").and_then(DomValue::as_f32), Some(12.5));

        let text = value.to_json_string().unwrap();
        assert_eq!(text, r#"{"tags":["a",null],"width":12.5}"#);
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = DomValue::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ValueError::Json(_)));
    }

    #[test]
    fn test_try_from_reports_mismatch() {
        let value = DomValue::from("12px");
        let err = f64::try_from(&value).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type mismatch: expected number, got string"
        );
        assert_eq!(String::try_from(&value).unwrap(), "12px");
    }

    #[test]
    fn test_non_finite_number_becomes_json_null() {
        let json = serde_json::Value::from(DomValue::Number(f64::NAN));
        assert!(json.is_null());
    }

    #[test]
    fn test_display() {
        let mut map = BTreeMap::new();
        map.insert("w".to_string(), DomValue::from(10));
        map.insert("list".to_string(), DomValue::from(vec![DomValue::Null, DomValue::from(true)]));
        assert_eq!(DomValue::from(map).to_string(), r#"{"list": [null, true], "w": 10}"#);
    }
}
