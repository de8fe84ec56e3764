//! Validate command handler.
//!
//! Runs the same checks as `add` without touching the registry.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::ServerArgs;
use crate::error::CliError;

/// Execute the validate command.
pub fn execute(ctx: &CliContext, args: ServerArgs) -> Result<()> {
    let draft = args.into_draft();
    let report = ctx.service().validate(&draft);

    if report.valid {
        return ctx
            .output
            .success(&report, || println!("'{}' is a valid definition", draft.name));
    }

    let summary = report.summary();
    ctx.output.failure(&report, &summary, || {
        println!("'{}' is not valid:", draft.name);
        for error in &report.errors {
            println!("  {}: {}", error.field, error.message);
        }
    })?;
    Err(CliError::Failed(summary).into())
}
