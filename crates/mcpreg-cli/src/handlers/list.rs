//! List command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_record_table;

/// Execute the list command.
pub async fn execute(ctx: &CliContext) -> Result<()> {
    let records = ctx.service().list().await?;

    ctx.output.success(&records, || {
        if records.is_empty() {
            println!("No MCP servers registered.");
            println!("Use 'mcpreg add <name> --command <cmd>' to add one.");
            return;
        }
        println!("Found {} server(s):\n", records.len());
        print_record_table(&records);
    })
}
