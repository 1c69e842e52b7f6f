//! Entity schemas.

use crate::coerce;
use crate::error::{SchemaError, SchemaResult};
use crate::record::{KeyTuple, Record};
use crate::value::FieldValue;
use std::fmt;

/// Primitive type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text (names, emails, codes).
    Text,
    /// Whole number.
    Integer,
    /// Number with an optional fractional part.
    Decimal,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
}

impl FieldType {
    /// Lowercase type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Date => "date",
        }
    }

    /// Returns true for numeric types.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Decimal)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name of the field.
    pub name: String,
    /// Primitive type.
    pub ty: FieldType,
    /// Column heading.
    pub label: String,
}

/// Field list and key-field set of one resource type.
///
/// A schema is plain data: one value per resource, no per-entity code.
///
/// ```
/// use tablesync_schema::{EntitySchema, FieldType, Record};
///
/// let schema = EntitySchema::builder("countries", "Countries")
///     .field("cname", FieldType::Text, "Country Name")
///     .field("population", FieldType::Integer, "Population")
///     .key(["cname"])
///     .build()
///     .unwrap();
///
/// let italy = Record::new().with("cname", "Italy").with("population", 59_000_000i64);
/// assert_eq!(schema.key_of(&italy).to_string(), "Italy");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    resource: String,
    title: String,
    fields: Vec<FieldSpec>,
    key: Vec<String>,
}

impl EntitySchema {
    /// Starts a schema for the given REST resource name.
    pub fn builder(resource: impl Into<String>, title: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            resource: resource.into(),
            title: title.into(),
            fields: Vec::new(),
            key: Vec::new(),
        }
    }

    /// REST resource name (`/api/<resource>/`).
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Human readable table title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Declared fields in display order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Key field names in key order.
    pub fn key_fields(&self) -> &[String] {
        &self.key
    }

    /// Looks up a field.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field, failing for undeclared names.
    pub fn require_field(&self, name: &str) -> SchemaResult<&FieldSpec> {
        self.field(name).ok_or_else(|| SchemaError::UnknownField {
            schema: self.resource.clone(),
            field: name.to_string(),
        })
    }

    /// Returns true if the field is part of the key.
    pub fn is_key_field(&self, name: &str) -> bool {
        self.key.iter().any(|k| k == name)
    }

    /// Key tuple of a record under this schema.
    pub fn key_of(&self, record: &Record) -> KeyTuple {
        record.key_for(&self.key)
    }

    /// Returns true if both records identify the same entity.
    pub fn same_entity(&self, a: &Record, b: &Record) -> bool {
        self.key_of(a) == self.key_of(b)
    }

    /// Returns true if `record` carries `key`.
    pub fn has_key(&self, record: &Record, key: &KeyTuple) -> bool {
        &self.key_of(record) == key
    }

    /// Builds a key tuple from raw values given in key order.
    ///
    /// Each value is coerced to its key field's type. Fails if the number
    /// of values does not match the key arity.
    pub fn key_from_values(&self, values: &[FieldValue]) -> SchemaResult<KeyTuple> {
        if values.len() != self.key.len() {
            return Err(SchemaError::invalid_record(format!(
                "`{}` key has {} component(s), got {}",
                self.resource,
                self.key.len(),
                values.len()
            )));
        }
        let mut out = Vec::with_capacity(values.len());
        for (name, value) in self.key.iter().zip(values) {
            let spec = self.require_field(name)?;
            out.push(coerce::coerce(spec.ty, value));
        }
        Ok(KeyTuple::new(out))
    }

    /// A record with every declared field blank.
    pub fn default_record(&self) -> Record {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), FieldValue::Empty))
            .collect()
    }

    /// Coerces a value for the named field. Never fails for declared fields.
    pub fn coerce(&self, field: &str, value: &FieldValue) -> SchemaResult<FieldValue> {
        let spec = self.require_field(field)?;
        Ok(coerce::coerce(spec.ty, value))
    }
}

/// Builder for [`EntitySchema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    resource: String,
    title: String,
    fields: Vec<FieldSpec>,
    key: Vec<String>,
}

impl SchemaBuilder {
    /// Declares a field.
    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        ty: FieldType,
        label: impl Into<String>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            label: label.into(),
        });
        self
    }

    /// Declares the ordered key fields.
    #[must_use]
    pub fn key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Validates and builds the schema.
    pub fn build(self) -> SchemaResult<EntitySchema> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    schema: self.resource,
                    field: field.name.clone(),
                });
            }
        }
        if self.key.is_empty() {
            return Err(SchemaError::EmptyKey(self.resource));
        }
        if let Some(missing) = self
            .key
            .iter()
            .find(|k| !self.fields.iter().any(|f| &f.name == *k))
        {
            return Err(SchemaError::UnknownKeyField {
                field: missing.clone(),
                schema: self.resource,
            });
        }

        Ok(EntitySchema {
            resource: self.resource,
            title: self.title,
            fields: self.fields,
            key: self.key,
        })
    }
}
