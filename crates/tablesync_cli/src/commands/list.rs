//! List command implementation.

use super::{write_records, CommandResult, Format};
use std::io::Write;
use tablesync_engine::{ResourceClient, TableEngine};

/// Runs the list command.
pub fn run<C: ResourceClient>(table: &TableEngine<C>, format: Format, out: &mut impl Write) -> CommandResult {
    let count = table.load()?;
    write_records(out, table.schema(), &table.records(), format)?;
    if format == Format::Text {
        writeln!(out, "({count} {})", if count == 1 { "row" } else { "rows" })?;
    }
    Ok(())
}
