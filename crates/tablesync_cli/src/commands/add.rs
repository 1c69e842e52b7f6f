//! Add command implementation.

use super::{parse_assignments, write_record, CommandResult, Format};
use std::io::Write;
use tablesync_engine::{ResourceClient, TableEngine};
use tracing::info;

/// Runs the add command.
///
/// Each `FIELD=VALUE` goes through the add buffer, so values are coerced
/// the same way typed input is.
pub fn run<C: ResourceClient>(
    table: &TableEngine<C>,
    assignments: &[String],
    format: Format,
    out: &mut impl Write,
) -> CommandResult {
    let assignments = parse_assignments(assignments)?;
    for (field, _) in &assignments {
        table.schema().require_field(field)?;
    }

    table.load()?;
    for (field, value) in assignments {
        table.update_add_buffer_field(&field, value);
    }
    let created = table.commit_add()?;

    info!(resource = %table.schema().resource(), key = %table.schema().key_of(&created), "added");
    write_record(out, table.schema(), &created, format)?;
    Ok(())
}
