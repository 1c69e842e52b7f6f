//! Tab listing and selection.

use super::CommandResult;
use crate::shell::Shell;
use std::io::Write;

/// Lists every tab, marking the active one.
pub fn list(shell: &Shell, out: &mut impl Write) -> CommandResult {
    for entry in shell.catalog().entries() {
        let marker = if entry.tab == shell.active_tab() { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {:<16} {:<17} {}",
            entry.tab,
            entry.schema.resource(),
            entry.schema.title()
        )?;
    }
    Ok(())
}

/// Makes a tab active and persists the choice.
pub fn select(shell: &mut Shell, name: &str, out: &mut impl Write) -> CommandResult {
    let entry = shell.select(name)?;
    writeln!(out, "active tab: {} ({})", entry.tab, entry.schema.title())?;
    Ok(())
}
