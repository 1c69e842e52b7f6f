//! Edit command implementation.

use super::{find_by_key, parse_assignments, write_record, CommandResult, Format};
use std::io::Write;
use tablesync_engine::{ResourceClient, TableEngine};

/// Runs the edit command: begin an edit on the keyed record, apply the
/// assignments to the draft, commit.
///
/// A failed commit cancels the session before returning.
pub fn run<C: ResourceClient>(
    table: &TableEngine<C>,
    key: &[String],
    assignments: &[String],
    format: Format,
    out: &mut impl Write,
) -> CommandResult {
    let assignments = parse_assignments(assignments)?;
    if assignments.is_empty() {
        return Err("nothing to change; pass FIELD=VALUE arguments".into());
    }

    let record = find_by_key(table, key)?;
    table.begin_edit(&record)?;
    let result = assignments
        .iter()
        .try_for_each(|(field, value)| table.update_draft_field(field, value.as_str()))
        .and_then(|()| table.commit_edit());

    match result {
        Ok(updated) => {
            write_record(out, table.schema(), &updated, format)?;
            Ok(())
        }
        Err(e) => {
            table.cancel_edit()?;
            Err(e.into())
        }
    }
}
