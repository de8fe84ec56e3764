//! Test-all command handler.

use std::time::Duration;

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_batch_report;

/// Execute the test-all command.
pub async fn execute(ctx: &CliContext, timeout: Option<Duration>) -> Result<()> {
    let report = ctx.service().test_all(timeout).await?;

    if report.summary.failed == 0 {
        return ctx.output.success(&report, || {
            if report.summary.total == 0 {
                println!("No MCP servers registered.");
            } else {
                print_batch_report(&report);
            }
        });
    }

    let error = format!(
        "{} of {} servers failed",
        report.summary.failed, report.summary.total
    );
    ctx.output
        .failure(&report, &error, || print_batch_report(&report))?;
    Err(CliError::Failed(error).into())
}
