//! Get command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::presentation::print_record_detail;

/// Execute the get command.
pub async fn execute(ctx: &CliContext, name: &str) -> Result<()> {
    let record = ctx.service().get(name).await?;
    ctx.output.success(&record, || print_record_detail(&record))
}
