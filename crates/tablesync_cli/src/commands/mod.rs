//! CLI command implementations.

pub mod add;
pub mod delete;
pub mod edit;
pub mod list;
pub mod schema;
pub mod tabs;

use serde_json::Value;
use std::io::Write;
use tablesync_engine::{ResourceClient, TableEngine};
use tablesync_schema::{EntitySchema, FieldValue, Record};

/// Result type of every command.
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Output format of table data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// Aligned columns.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Splits `field=value` arguments.
pub fn parse_assignments(args: &[String]) -> Result<Vec<(String, String)>, String> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => {
                Ok((field.trim().to_string(), value.to_string()))
            }
            _ => Err(format!("expected FIELD=VALUE, got `{arg}`")),
        })
        .collect()
}

/// Loads the table and returns the cached record with the given key.
///
/// Keys are matched by their path segments, so `3` finds a row whose
/// server-side id is the number 3 even where the field is typed as text.
pub fn find_by_key<C: ResourceClient>(
    table: &TableEngine<C>,
    key: &[String],
) -> Result<Record, Box<dyn std::error::Error>> {
    table.load()?;
    let schema = table.schema();
    let values: Vec<FieldValue> = key.iter().map(|k| FieldValue::from(k.as_str())).collect();
    let key = schema.key_from_values(&values)?;
    let segments = key.segments();
    table
        .records()
        .into_iter()
        .find(|r| schema.key_of(r).segments() == segments)
        .ok_or_else(|| format!("no {} record with key {key}", schema.resource()).into())
}

/// Writes records in the requested format.
pub fn write_records(
    out: &mut impl Write,
    schema: &EntitySchema,
    records: &[Record],
    format: Format,
) -> std::io::Result<()> {
    match format {
        Format::Json => {
            let rows: Vec<Value> = records.iter().map(Record::to_json).collect();
            let text = serde_json::to_string_pretty(&rows).map_err(std::io::Error::other)?;
            writeln!(out, "{text}")
        }
        Format::Text => write_table(out, schema, records),
    }
}

/// Writes one record in the requested format.
pub fn write_record(
    out: &mut impl Write,
    schema: &EntitySchema,
    record: &Record,
    format: Format,
) -> std::io::Result<()> {
    match format {
        Format::Json => {
            let text =
                serde_json::to_string_pretty(&record.to_json()).map_err(std::io::Error::other)?;
            writeln!(out, "{text}")
        }
        Format::Text => write_table(out, schema, std::slice::from_ref(record)),
    }
}

fn write_table(out: &mut impl Write, schema: &EntitySchema, records: &[Record]) -> std::io::Result<()> {
    let headers: Vec<&str> = schema.fields().iter().map(|f| f.label.as_str()).collect();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            schema
                .fields()
                .iter()
                .map(|f| r.get(&f.name).map(ToString::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(headers.clone()))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(out, "{}", rule.join("-+-"))?;
    for row in &rows {
        writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn assignments() {
        let args = vec!["cname=Italy".to_string(), "population= 5 ".to_string()];
        assert_eq!(
            parse_assignments(&args).unwrap(),
            vec![
                ("cname".to_string(), "Italy".to_string()),
                ("population".to_string(), " 5 ".to_string())
            ]
        );
        assert!(parse_assignments(&["cname".to_string()]).is_err());
        assert!(parse_assignments(&["=x".to_string()]).is_err());
    }

    #[test]
    fn text_table_is_aligned() {
        let (table, _) = table("countries");
        let mut out = Vec::new();
        write_records(
            &mut out,
            table.schema(),
            &[country("Italy", 59), country("Chad", 17_000_000)],
            Format::Text,
        )
        .unwrap();

        let text = output(out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Country Name | Population");
        assert_eq!(lines[2], "Italy        | 59");
        assert_eq!(lines[3], "Chad         | 17000000");
    }

    #[test]
    fn json_output() {
        let (table, _) = table("countries");
        let mut out = Vec::new();
        write_records(&mut out, table.schema(), &[country("Italy", 59)], Format::Json).unwrap();

        let value: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value, serde_json::json!([{"cname": "Italy", "population": 59}]));
    }

    #[test]
    fn find_by_key_loads_first() {
        let (table, mock) = table("countries");
        mock.set_list_response(Ok(vec![country("Italy", 59)]));

        assert_eq!(find_by_key(&table, &["Italy".into()]).unwrap(), country("Italy", 59));
        assert!(find_by_key(&table, &["Peru".into()]).is_err());
        assert!(find_by_key(&table, &[]).is_err());
    }

    #[test]
    fn find_by_key_matches_numeric_server_ids() {
        let (table, mock) = table("diseaseTypes");
        let row = Record::new().with("id", 3i64).with("description", "viral");
        mock.set_list_response(Ok(vec![row.clone()]));

        assert_eq!(find_by_key(&table, &["3".into()]).unwrap(), row);
        assert!(find_by_key(&table, &["4".into()]).is_err());
        assert!(table.begin_edit(&row).is_ok());
    }
}
