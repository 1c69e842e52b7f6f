//! Input coercion for typed fields.
//!
//! Values typed by a user arrive as text and must be turned into the
//! field's primitive type before they go into a draft. Two entry points:
//!
//! - [`try_coerce`] reports inputs that cannot be read as the field type.
//! - [`coerce`] never fails: unreadable input becomes [`FieldValue::Empty`].
//!
//! | field type | accepted                               | result            |
//! |------------|----------------------------------------|-------------------|
//! | `Text`     | anything scalar                        | text, unchanged   |
//! | `Integer`  | integers, finite floats, numeric text  | truncated integer |
//! | `Decimal`  | numbers, numeric text                  | number            |
//! | `Date`     | `YYYY-MM-DD`, or an ISO datetime       | `YYYY-MM-DD` text |
//!
//! Blank input (empty, `null`, whitespace) is `Empty` for every type.

use crate::error::{SchemaError, SchemaResult};
use crate::schema::FieldType;
use crate::value::FieldValue;
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Coerces a value to a field type, falling back to `Empty`.
pub fn coerce(ty: FieldType, value: &FieldValue) -> FieldValue {
    try_coerce(ty, value).unwrap_or(FieldValue::Empty)
}

/// Coerces a value to a field type, rejecting unreadable input.
pub fn try_coerce(ty: FieldType, value: &FieldValue) -> SchemaResult<FieldValue> {
    if ty != FieldType::Text && value.is_blank() {
        return Ok(FieldValue::Empty);
    }

    match ty {
        FieldType::Text => Ok(match value {
            FieldValue::Empty | FieldValue::Null => FieldValue::Empty,
            FieldValue::Text(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }),
        FieldType::Integer => match value {
            FieldValue::Integer(n) => Ok(FieldValue::Integer(*n)),
            FieldValue::Float(x) => truncate(*x).ok_or_else(|| reject(value, ty)),
            FieldValue::Text(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    return Ok(FieldValue::Integer(n));
                }
                s.parse::<f64>()
                    .ok()
                    .and_then(truncate)
                    .ok_or_else(|| reject(value, ty))
            }
            _ => Err(reject(value, ty)),
        },
        FieldType::Decimal => match value {
            FieldValue::Integer(n) => Ok(FieldValue::Integer(*n)),
            FieldValue::Float(x) if x.is_finite() => Ok(FieldValue::Float(*x)),
            FieldValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .map(FieldValue::Float)
                .ok_or_else(|| reject(value, ty)),
            _ => Err(reject(value, ty)),
        },
        FieldType::Date => match value {
            FieldValue::Text(s) => parse_date(s.trim())
                .map(|d| FieldValue::Text(d.format(DATE_FORMAT).to_string()))
                .ok_or_else(|| reject(value, ty)),
            _ => Err(reject(value, ty)),
        },
    }
}

fn truncate(x: f64) -> Option<FieldValue> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    let t = x.trunc();
    if t.is_finite() && t >= i64::MIN as f64 && t < i64::MAX as f64 {
        Some(FieldValue::Integer(t as i64))
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(date);
    }
    // Datetimes: keep the calendar date.
    match s.get(..10).zip(s.get(10..11)) {
        Some((date, "T" | " ")) => NaiveDate::parse_from_str(date, DATE_FORMAT).ok(),
        _ => None,
    }
}

fn reject(value: &FieldValue, ty: FieldType) -> SchemaError {
    SchemaError::Coercion {
        input: value.to_string(),
        expected: ty.name(),
    }
}
