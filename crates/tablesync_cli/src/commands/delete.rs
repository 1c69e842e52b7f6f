//! Delete command implementation.

use super::{find_by_key, CommandResult};
use std::io::Write;
use tablesync_engine::{ResourceClient, TableEngine};

/// Runs the delete command.
pub fn run<C: ResourceClient>(table: &TableEngine<C>, key: &[String], out: &mut impl Write) -> CommandResult {
    let record = find_by_key(table, key)?;
    table.delete_record(&record)?;
    writeln!(
        out,
        "deleted {} {}",
        table.schema().resource(),
        table.schema().key_of(&record)
    )?;
    Ok(())
}
