//! Primitive field values.

use crate::error::{SchemaError, SchemaResult};
use serde::{Serialize, Serializer};
use std::fmt;

/// A primitive value stored in one record field.
///
/// Records only ever hold scalars. Dates travel as `Text` in ISO form
/// (`YYYY-MM-DD`). `Empty` is the blank input of a fresh or cleared field
/// and is written to the wire as `""`.
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Blank field.
    Empty,
    /// JSON `null`.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Fractional number.
    Float(f64),
    /// Text (also carries date strings).
    Text(String),
}

impl FieldValue {
    /// Converts a JSON value into a field value.
    ///
    /// `""` becomes [`FieldValue::Empty`]. Arrays and objects are rejected.
    pub fn from_json(field: &str, value: serde_json::Value) -> SchemaResult<Self> {
        use serde_json::Value as Json;

        match value {
            Json::Null => Ok(FieldValue::Null),
            Json::Bool(b) => Ok(FieldValue::Bool(b)),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(FieldValue::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(FieldValue::Float(f))
                } else {
                    Err(SchemaError::invalid_record(format!(
                        "number {n} in field `{field}` is out of range"
                    )))
                }
            }
            Json::String(s) if s.is_empty() => Ok(FieldValue::Empty),
            Json::String(s) => Ok(FieldValue::Text(s)),
            Json::Array(_) => Err(SchemaError::UnsupportedValue {
                field: field.to_string(),
                kind: "array",
            }),
            Json::Object(_) => Err(SchemaError::UnsupportedValue {
                field: field.to_string(),
                kind: "object",
            }),
        }
    }

    /// Converts this value into JSON.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            FieldValue::Empty => Json::String(String::new()),
            FieldValue::Null => Json::Null,
            FieldValue::Bool(b) => Json::Bool(*b),
            FieldValue::Integer(n) => Json::from(*n),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            FieldValue::Text(s) => Json::String(s.clone()),
        }
    }

    /// Returns true for `Empty`, `Null` and the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Empty | FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a float. Integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get this value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Empty => Some(""),
            _ => None,
        }
    }
}

/// Equality follows JSON number semantics: `1` and `1.0` are the same
/// value, a number never equals text.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        use FieldValue::*;

        match (self, other) {
            (Empty, Empty) | (Null, Null) => true,
            (Empty, Text(s)) | (Text(s), Empty) => s.is_empty(),
            (Bool(a), Bool(b)) => a == b,
            (Integer(a), Integer(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Integer(a), Float(b)) | (Float(b), Integer(a)) => float_as_exact_integer(*b) == Some(*a),
            (Text(a), Text(b)) => a == b,
            _ => false,
        }
    }
}

/// The integer `x` denotes exactly, if any.
fn float_as_exact_integer(x: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range.
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        Some(x as i64)
    } else {
        None
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Empty => Ok(()),
            FieldValue::Null => f.write_str("null"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Integer(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Empty => serializer.serialize_str(""),
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Float(x) => serializer.serialize_f64(*x),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Empty
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Integer(i64::from(n))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            FieldValue::Empty
        } else {
            FieldValue::Text(s)
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::from(s.to_string())
    }
}

impl From<()> for FieldValue {
    fn from((): ()) -> Self {
        FieldValue::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_compare_by_value() {
        assert_eq!(FieldValue::Integer(60), FieldValue::Float(60.0));
        assert_ne!(FieldValue::Integer(60), FieldValue::Float(60.5));
        assert_ne!(FieldValue::Integer(1), FieldValue::Text("1".into()));
    }

    #[test]
    fn large_integers_only_equal_exact_floats() {
        let big = 1i64 << 53;
        assert_eq!(FieldValue::Integer(big), FieldValue::Float(big as f64));
        assert_ne!(FieldValue::Integer(big + 1), FieldValue::Float(big as f64));
        assert_ne!(FieldValue::Integer(i64::MAX), FieldValue::Float(i64::MAX as f64));
        assert_ne!(FieldValue::Integer(0), FieldValue::Float(f64::NAN));
    }

    #[test]
    fn empty_string_is_empty() {
        assert_eq!(FieldValue::from(""), FieldValue::Empty);
        assert_eq!(
            FieldValue::from_json("cname", json!("")).unwrap(),
            FieldValue::Empty
        );
        assert_eq!(FieldValue::Text(String::new()), FieldValue::Empty);
    }

    #[test]
    fn from_json_rejects_nested_values() {
        let err = FieldValue::from_json("tags", json!(["a"])).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedValue { kind: "array", .. }
        ));
        assert!(FieldValue::from_json("meta", json!({"a": 1})).is_err());
    }

    #[test]
    fn json_conversion() {
        assert_eq!(
            FieldValue::from_json("population", json!(59000000)).unwrap(),
            FieldValue::Integer(59_000_000)
        );
        assert_eq!(
            FieldValue::from_json("salary", json!(1250.5)).unwrap(),
            FieldValue::Float(1250.5)
        );
        assert_eq!(FieldValue::Empty.to_json(), json!(""));
        assert_eq!(FieldValue::Null.to_json(), json!(null));
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), json!(null));
    }

    #[test]
    fn display() {
        assert_eq!(FieldValue::Empty.to_string(), "");
        assert_eq!(FieldValue::Integer(42).to_string(), "42");
        assert_eq!(FieldValue::Float(60000000.0).to_string(), "60000000");
        assert_eq!(FieldValue::Text("Italy".into()).to_string(), "Italy");
    }

    #[test]
    fn blank_values() {
        assert!(FieldValue::Empty.is_blank());
        assert!(FieldValue::Null.is_blank());
        assert!(FieldValue::Text("  ".into()).is_blank());
        assert!(!FieldValue::Integer(0).is_blank());
    }
}
