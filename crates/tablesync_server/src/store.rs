//! Per-resource record storage.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use tablesync_schema::{coerce, EntitySchema, FieldValue, KeyTuple, Record};

/// Rows of one resource, in insertion order, unique by key.
#[derive(Debug, Clone)]
pub struct ResourceTable {
    schema: EntitySchema,
    rows: Vec<Record>,
}

impl ResourceTable {
    /// Creates an empty table.
    pub fn new(schema: EntitySchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// The table's schema.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// All rows in insertion order.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row with the given key.
    pub fn find(&self, key: &KeyTuple) -> Option<&Record> {
        self.position(key).map(|i| &self.rows[i])
    }

    fn position(&self, key: &KeyTuple) -> Option<usize> {
        self.rows.iter().position(|r| self.schema.has_key(r, key))
    }

    /// Parses key segments taken from a request path.
    pub fn parse_key(&self, segments: &[String]) -> ServerResult<KeyTuple> {
        let values: Vec<FieldValue> = segments.iter().map(|s| FieldValue::from(s.as_str())).collect();
        Ok(self.schema.key_from_values(&values)?)
    }

    /// Inserts a new row built from `input`.
    pub fn insert(&mut self, input: Record, config: &ServerConfig) -> ServerResult<Record> {
        let record = self.normalize(self.schema.default_record(), input, config)?;
        let key = self.schema.key_of(&record);
        if self.position(&key).is_some() {
            return Err(ServerError::Conflict(format!(
                "{} record with key {key} already exists",
                self.schema.resource()
            )));
        }
        self.rows.push(record.clone());
        Ok(record)
    }

    /// Applies `input` over the row with `key`.
    ///
    /// Fields missing from `input` keep their stored values.
    pub fn update(
        &mut self,
        key: &KeyTuple,
        input: Record,
        config: &ServerConfig,
    ) -> ServerResult<Record> {
        let index = self.position(key).ok_or_else(|| self.not_found(key))?;
        let record = self.normalize(self.rows[index].clone(), input, config)?;

        let new_key = self.schema.key_of(&record);
        if &new_key != key {
            if !config.allow_key_change {
                return Err(ServerError::Conflict(format!(
                    "key of {} record {key} cannot change",
                    self.schema.resource()
                )));
            }
            if self.position(&new_key).is_some() {
                return Err(ServerError::Conflict(format!(
                    "{} record with key {new_key} already exists",
                    self.schema.resource()
                )));
            }
        }

        self.rows[index] = record.clone();
        Ok(record)
    }

    /// Removes the row with `key`.
    pub fn remove(&mut self, key: &KeyTuple) -> ServerResult<Record> {
        let index = self.position(key).ok_or_else(|| self.not_found(key))?;
        Ok(self.rows.remove(index))
    }

    /// Merges `input` into `base`, field by field.
    fn normalize(
        &self,
        mut base: Record,
        input: Record,
        config: &ServerConfig,
    ) -> ServerResult<Record> {
        for (field, value) in input.iter() {
            let spec = self.schema.require_field(field)?;
            let mut value = match value {
                FieldValue::Text(s) if config.trim_text => FieldValue::from(s.trim()),
                other => other.clone(),
            };
            if config.coerce_values {
                value = coerce::coerce(spec.ty, &value);
            }
            base.set(field, value);
        }

        for field in self.schema.key_fields() {
            if base.get(field).map_or(true, FieldValue::is_blank) {
                return Err(ServerError::InvalidRequest(format!("`{field}` is required")));
            }
        }
        Ok(base)
    }

    fn not_found(&self, key: &KeyTuple) -> ServerError {
        ServerError::NotFound {
            resource: self.schema.resource().to_string(),
            key: key.to_string(),
        }
    }
}
