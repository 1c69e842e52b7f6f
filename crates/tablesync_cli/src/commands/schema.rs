//! Schema command implementation.

use super::{CommandResult, Format};
use serde_json::json;
use std::io::Write;
use tablesync_schema::EntitySchema;

/// Describes a table's fields and key.
pub fn run(schema: &EntitySchema, format: Format, out: &mut impl Write) -> CommandResult {
    match format {
        Format::Json => {
            let fields: Vec<_> = schema
                .fields()
                .iter()
                .map(|f| {
                    json!({
                        "name": f.name,
                        "type": f.ty.name(),
                        "label": f.label,
                        "key": schema.is_key_field(&f.name),
                    })
                })
                .collect();
            let value = json!({
                "resource": schema.resource(),
                "title": schema.title(),
                "key": schema.key_fields(),
                "fields": fields,
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        Format::Text => {
            writeln!(out, "{} (/{}/)", schema.title(), schema.resource())?;
            for field in schema.fields() {
                let key = if schema.is_key_field(&field.name) { "key" } else { "" };
                writeln!(
                    out,
                    "  {:<16} {:<8} {:<3} {}",
                    field.name, field.ty, key, field.label
                )?;
            }
        }
    }
    Ok(())
}
