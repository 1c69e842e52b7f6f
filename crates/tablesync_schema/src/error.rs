//! Error types for the schema crate.

use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while defining schemas or decoding records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A field name is not declared by the schema.
    #[error("unknown field `{field}` in schema `{schema}`")]
    UnknownField {
        /// Schema (resource) name.
        schema: String,
        /// The offending field name.
        field: String,
    },

    /// A schema declares the same field twice.
    #[error("duplicate field `{field}` in schema `{schema}`")]
    DuplicateField {
        /// Schema (resource) name.
        schema: String,
        /// The duplicated field name.
        field: String,
    },

    /// A schema has no key fields.
    #[error("schema `{0}` declares no key fields")]
    EmptyKey(String),

    /// A schema declares a key field that is not one of its fields.
    #[error("key field `{field}` is not a field of schema `{schema}`")]
    UnknownKeyField {
        /// Schema (resource) name.
        schema: String,
        /// The key field name.
        field: String,
    },

    /// A JSON document could not be turned into a record.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },

    /// A JSON value has a shape records cannot hold.
    #[error("unsupported value for field `{field}`: {kind}")]
    UnsupportedValue {
        /// Field holding the value.
        field: String,
        /// JSON kind that was rejected (array, object).
        kind: &'static str,
    },

    /// Strict coercion rejected an input.
    #[error("cannot read {input:?} as {expected}")]
    Coercion {
        /// The raw input.
        input: String,
        /// The expected field type.
        expected: &'static str,
    },
}

impl SchemaError {
    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SchemaError::UnknownField {
            schema: "countries".into(),
            field: "capital".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown field `capital` in schema `countries`"
        );

        let err = SchemaError::Coercion {
            input: "abc".into(),
            expected: "integer",
        };
        assert_eq!(err.to_string(), "cannot read \"abc\" as integer");
    }
}
