//! Records and key tuples.

use crate::error::{SchemaError, SchemaResult};
use crate::value::FieldValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One entity instance: a mapping from field name to primitive value.
///
/// Records are schema-agnostic containers. Identity comes from
/// [`EntitySchema::key_of`](crate::EntitySchema::key_of).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field and returns the record (builder style).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Sets a field, returning the previous value.
    pub fn set(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.fields.insert(field.into(), value.into())
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Removes a field.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Extracts the key tuple for the given ordered key fields.
    ///
    /// A missing field contributes `Null`.
    pub fn key_for<S: AsRef<str>>(&self, key_fields: &[S]) -> KeyTuple {
        KeyTuple(
            key_fields
                .iter()
                .map(|f| self.get(f.as_ref()).cloned().unwrap_or(FieldValue::Null))
                .collect(),
        )
    }

    /// Decodes a record from a JSON object.
    pub fn from_json(value: serde_json::Value) -> SchemaResult<Self> {
        match value {
            serde_json::Value::Object(map) => Self::try_from(map),
            other => Err(SchemaError::invalid_record(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Encodes this record as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl TryFrom<serde_json::Map<String, serde_json::Value>> for Record {
    type Error = SchemaError;

    fn try_from(map: serde_json::Map<String, serde_json::Value>) -> SchemaResult<Self> {
        let mut fields = BTreeMap::new();
        for (name, value) in map {
            let value = FieldValue::from_json(&name, value)?;
            fields.insert(name, value);
        }
        Ok(Self { fields })
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Record::try_from(map).map_err(serde::de::Error::custom)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Ordered values of a schema's key fields; the identity of a record.
///
/// Two key tuples are equal iff they are equal field by field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyTuple(Vec<FieldValue>);

impl KeyTuple {
    /// Creates a key tuple from values in key order.
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self(values)
    }

    /// The key values in key order.
    pub fn values(&self) -> &[FieldValue] {
        &self.0
    }

    /// Number of key components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the tuple has no components.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Unencoded path segments, one per key component.
    pub fn segments(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl From<Vec<FieldValue>> for KeyTuple {
    fn from(values: Vec<FieldValue>) -> Self {
        Self(values)
    }
}

impl fmt::Display for KeyTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_json_round_trip_keeps_blank_fields() {
        let json = json!({"cname": "Italy", "population": ""});
        let record = Record::from_json(json.clone()).unwrap();
        assert_eq!(record.get("population"), Some(&FieldValue::Empty));
        assert_eq!(record.to_json(), json);
    }

    #[test]
    fn from_json_requires_object() {
        let err = Record::from_json(json!([1, 2])).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn serde_impls_match_json_helpers() {
        let record: Record =
            serde_json::from_str(r#"{"email":"a@x.com","salary":1200.5}"#).unwrap();
        assert_eq!(record.get("salary"), Some(&FieldValue::Float(1200.5)));

        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"email":"a@x.com","salary":1200.5}"#);
    }

    #[test]
    fn key_for_uses_declared_order() {
        let record = Record::new()
            .with("email", "a@x.com")
            .with("cname", "Italy")
            .with("disease_code", "D1");

        let key = record.key_for(&["email", "cname", "disease_code"]);
        assert_eq!(key.segments(), vec!["a@x.com", "Italy", "D1"]);
        assert_eq!(key.to_string(), "a@x.com/Italy/D1");

        let missing = record.key_for(&["id"]);
        assert_eq!(missing.values(), &[FieldValue::Null]);
    }

    #[test]
    fn key_equality_is_field_by_field() {
        let a = KeyTuple::new(vec!["a@x.com".into(), "Italy".into()]);
        let b = KeyTuple::new(vec!["a@x.com".into(), "Italy".into()]);
        let c = KeyTuple::new(vec!["a@x.com".into(), "Spain".into()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
